//! TLS material loading for the default adapter.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::adapter::AdapterError;

/// Load a rustls server config from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, AdapterError> {
    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(AdapterError::Tls(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {}", what, path.display()),
            )));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(AdapterError::Tls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_certificate_is_reported() {
        let err = load_tls_config(Path::new("/no/cert.pem"), Path::new("/no/key.pem"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Certificate file not found"));
    }

    #[tokio::test]
    async fn garbage_pem_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();
        assert!(matches!(
            load_tls_config(&cert, &key).await,
            Err(AdapterError::Tls(_))
        ));
    }
}
