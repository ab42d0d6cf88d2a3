//! hookwire server binary.
//!
//! Loads configuration, installs logging (and optionally the Prometheus
//! exporter), registers the built-in hooks plus a health route, then serves
//! until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;

use hookwire::config::{load_config, validate_config, ServerConfig};
use hookwire::hooks::logging_hook;
use hookwire::lifecycle::shutdown_signal;
use hookwire::observability::{init_logging, init_metrics, metrics_hook};
use hookwire::{Route, Server};

#[derive(Parser)]
#[command(name = "hookwire")]
#[command(about = "Minimal HTTP/WebSocket server with lifecycle hooks", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Directory served under /<resources>/
    #[arg(long)]
    resources: Option<String>,

    /// Log route, hook and WebSocket registrations
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(resources) = self.resources {
            config.resources = resources;
        }
        if self.debug {
            config.debug = true;
            config.observability.log_level = "debug".to_string();
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    let config = cli.apply(config);
    if let Err(errors) = validate_config(&config) {
        for err in &errors {
            eprintln!("invalid configuration: {}", err);
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    init_logging(&config.observability)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        resources = %config.resources,
        tls = config.tls_paths().is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "hookwire v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let metrics_enabled = config.observability.metrics_enabled;
    if metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = Server::new(config);
    server.add_hook(logging_hook());
    if metrics_enabled {
        server.add_hook(metrics_hook());
    }
    server.adapter().on_error(Box::new(|err| {
        tracing::error!(error = %err, "Listener stopped");
    }));
    server.add(Route::get("/health", |_, res| {
        res.send_json(&serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }));

    let Some(mut listener) = server.start() else {
        return Ok(());
    };

    tokio::select! {
        _ = shutdown_signal() => {
            server.stop();
            listener.await?;
        }
        result = &mut listener => {
            result?;
            return Err("listener exited before shutdown".into());
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
