//! Dispatch engine behaviour, driven without a socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hookwire::{Flow, Hook, Method, Request, Route, WsMessage, WsRoute};

mod common;

use common::{RecordingHandshake, RecordingSink};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_duplicate_add_keeps_size_and_reports_failure() {
    let server = common::server();
    let outcomes = log();
    let seen = outcomes.clone();
    server.add_hook(Hook::new("recorder").route_added(move |route, _, ok| {
        push(&seen, format!("{route} {ok}"));
        Ok(())
    }));

    server.add(Route::get("/users", |_, _| {}));
    server.add(Route::get("/users", |_, _| {}));

    assert_eq!(server.route_count(), 1);
    assert_eq!(
        entries(&outcomes),
        vec!["[GET] \"/users\" true", "[GET] \"/users\" false"]
    );
}

#[test]
fn test_parameters_bind_by_name() {
    let server = common::server();
    let params = Arc::new(Mutex::new(None));
    let captured = params.clone();
    server.add(Route::get("/:id/:name", move |req, res| {
        *captured.lock().unwrap() = Some(req.params().clone());
        res.send("ok");
    }));

    let (res, sink) = RecordingSink::response();
    server.invoke("/42/alice", Request::new("GET", "/42/alice"), &res);
    let bound = params.lock().unwrap().take().unwrap();
    assert_eq!(bound.get("id").map(String::as_str), Some("42"));
    assert_eq!(bound.get("name").map(String::as_str), Some("alice"));
    assert_eq!(sink.snapshot().body_text(), "ok");

    let (res, sink) = RecordingSink::response();
    server.invoke("/42", Request::new("GET", "/42"), &res);
    let recorded = sink.snapshot();
    assert_eq!(recorded.status, Some(404));
    assert_eq!(recorded.body_text(), "Not found");
}

#[test]
fn test_exact_path_beats_pattern() {
    let server = common::server();
    let hits = log();
    let (a, b) = (hits.clone(), hits.clone());
    server.add(Route::get("/users/:id", move |_, _| push(&a, "pattern")));
    server.add(Route::get("/users/me", move |_, _| push(&b, "exact")));

    let (res, _) = RecordingSink::response();
    server.invoke("/users/me", Request::new("GET", "/users/me"), &res);
    let (res, _) = RecordingSink::response();
    server.invoke("/users/7", Request::new("GET", "/users/7"), &res);

    assert_eq!(entries(&hits), vec!["exact", "pattern"]);
}

#[test]
fn test_same_shape_patterns_dispatch_per_method() {
    let server = common::server();
    let hits = log();
    let (a, b) = (hits.clone(), hits.clone());
    server.add(Route::get("/users/:id", move |req, _| {
        push(&a, format!("get {}", req.param("id").unwrap_or("")));
    }));
    server.add(Route::post("/users/:name", move |req, _| {
        push(&b, format!("post {}", req.param("name").unwrap_or("")));
    }));
    assert_eq!(server.route_count(), 2);

    let (res, _) = RecordingSink::response();
    server.invoke("/users/5", Request::new("POST", "/users/5"), &res);
    let (res, _) = RecordingSink::response();
    server.invoke("/users/6", Request::new("GET", "/users/6"), &res);
    let (res, sink) = RecordingSink::response();
    server.invoke("/users/7", Request::new("PUT", "/users/7"), &res);

    assert_eq!(entries(&hits), vec!["post 5", "get 6"]);
    assert_eq!(sink.snapshot().status, Some(404));
}

#[test]
fn test_wrong_method_on_exact_path_is_404() {
    let server = common::server();
    let not_found = Arc::new(AtomicUsize::new(0));
    let counter = not_found.clone();
    server.add_hook(Hook::new("recorder").not_found(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));
    server.add(Route::get("/only-get", |_, res| res.send("got")));

    let (res, sink) = RecordingSink::response();
    server.invoke("/only-get", Request::new("POST", "/only-get"), &res);
    assert_eq!(sink.snapshot().status, Some(404));

    let (res, sink) = RecordingSink::response();
    server.invoke("/only-get", Request::new("BREW", "/only-get"), &res);
    assert_eq!(sink.snapshot().status, Some(404));

    assert_eq!(not_found.load(Ordering::SeqCst), 2);
}

#[test]
fn test_hooks_run_in_registration_order() {
    let server = common::server();
    let order = log();
    for name in ["first", "second", "third"] {
        let seen = order.clone();
        server.add_hook(Hook::new(name).before(move |_, _, _| {
            push(&seen, name);
            Ok(Flow::Continue)
        }));
    }
    server.add(Route::get("/", |_, res| res.close()));

    let (res, _) = RecordingSink::response();
    server.invoke("/", Request::new("GET", "/"), &res);
    assert_eq!(entries(&order), vec!["first", "second", "third"]);
}

#[test]
fn test_cancel_skips_handler_but_not_other_before_hooks() {
    let server = common::server();
    let trace = log();

    let seen = trace.clone();
    server.add_hook(Hook::new("auth").before(move |_, res, _| {
        push(&seen, "auth");
        res.set_status_code(401);
        res.send("Unauthorized");
        Ok(Flow::Cancel)
    }));
    let seen = trace.clone();
    let after = trace.clone();
    server.add_hook(
        Hook::new("audit")
            .before(move |_, _, _| {
                push(&seen, "audit");
                Ok(Flow::Continue)
            })
            .after(move |_, _, _| {
                push(&after, "after");
                Ok(())
            }),
    );
    let seen = trace.clone();
    server.add(Route::get("/secret", move |_, _| push(&seen, "handler")));

    let (res, sink) = RecordingSink::response();
    server.invoke("/secret", Request::new("GET", "/secret"), &res);

    assert_eq!(entries(&trace), vec!["auth", "audit"]);
    assert_eq!(sink.snapshot().status, Some(401));
}

#[test]
fn test_failing_before_hook_is_isolated() {
    let server = common::server();
    let trace = log();

    server.add_hook(Hook::new("broken").before(|_, _, _| Err("broken hook".into())));
    server.add_hook(Hook::new("panicky").before(|_, _, _| panic!("hook exploded")));
    let seen = trace.clone();
    server.add_hook(Hook::new("fine").before(move |_, _, _| {
        push(&seen, "fine");
        Ok(Flow::Continue)
    }));
    let seen = trace.clone();
    server.add(Route::get("/", move |_, res| {
        push(&seen, "handler");
        res.send("hi");
    }));

    let (res, sink) = RecordingSink::response();
    server.invoke("/", Request::new("GET", "/"), &res);
    assert_eq!(entries(&trace), vec!["fine", "handler"]);
    assert_eq!(sink.snapshot().body_text(), "hi");
}

#[test]
fn test_failing_hook_does_not_block_not_found() {
    let server = common::server();
    server.add_hook(Hook::new("broken").before(|_, _, _| Err("nope".into())));

    let (res, sink) = RecordingSink::response();
    server.invoke("/missing", Request::new("GET", "/missing"), &res);
    assert_eq!(sink.snapshot().status, Some(404));
}

#[test]
fn test_remove_hook_reports_outcome() {
    let server = common::server();
    let outcomes = log();
    let seen = outcomes.clone();
    server.add_hook(Hook::new("watcher").hook_removed(move |name, _, ok| {
        push(&seen, format!("{name} {ok}"));
        Ok(())
    }));
    server.add_hook(Hook::new("victim"));

    server.remove_hook("ghost");
    assert_eq!(server.hook_names(), vec!["watcher", "victim"]);

    server.remove_hook("victim");
    assert_eq!(server.hook_names(), vec!["watcher"]);

    assert_eq!(entries(&outcomes), vec!["ghost false", "victim true"]);
}

#[test]
fn test_hook_added_during_dispatch_waits_for_next_event() {
    let server = common::server();
    let trace = log();
    let late = trace.clone();
    let registering = server.clone();
    server.add_hook(Hook::new("registrar").before(move |_, _, _| {
        let seen = late.clone();
        registering.add_hook(Hook::new("late").before(move |_, _, _| {
            push(&seen, "late");
            Ok(Flow::Continue)
        }));
        Ok(Flow::Continue)
    }));
    server.add(Route::get("/", |_, res| res.close()));

    let (res, _) = RecordingSink::response();
    server.invoke("/", Request::new("GET", "/"), &res);
    assert!(entries(&trace).is_empty());

    let (res, _) = RecordingSink::response();
    server.invoke("/", Request::new("GET", "/"), &res);
    assert_eq!(entries(&trace), vec!["late"]);
}

#[test]
fn test_static_resources_bypass_routes_and_hooks() {
    let server = common::server();
    let hooked = Arc::new(AtomicUsize::new(0));
    let counter = hooked.clone();
    server.add_hook(
        Hook::new("recorder")
            .before(move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Flow::Continue)
            })
            .not_found(|_, _, _| panic!("static path reached notFound")),
    );

    let (res, sink) = RecordingSink::response();
    server.invoke(
        "/resources/css/site.css",
        Request::new("GET", "/resources/css/site.css"),
        &res,
    );
    let recorded = sink.snapshot();
    let (path, content_type) = recorded.file.unwrap();
    assert_eq!(path, std::path::PathBuf::from("resources/css/site.css"));
    assert_eq!(content_type, "text/css");

    let (res, sink) = RecordingSink::response();
    server.invoke("/resources/x.unknown", Request::new("GET", "/resources/x.unknown"), &res);
    assert_eq!(sink.snapshot().file.unwrap().1, "text/plain");

    let (res, sink) = RecordingSink::response();
    server.invoke(
        "/resources/../secret.txt",
        Request::new("GET", "/resources/../secret.txt"),
        &res,
    );
    assert_eq!(sink.snapshot().status, Some(404));
    assert_eq!(hooked.load(Ordering::SeqCst), 0);
}

#[test]
fn test_handler_panic_answers_500_and_runs_after() {
    let server = common::server();
    let afters = Arc::new(AtomicUsize::new(0));
    let counter = afters.clone();
    server.add_hook(Hook::new("recorder").after(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));
    server.add(Route::get("/boom", |_, _| panic!("handler exploded")));

    let (res, sink) = RecordingSink::response();
    server.invoke("/boom", Request::new("GET", "/boom"), &res);
    let recorded = sink.snapshot();
    assert_eq!(recorded.status, Some(500));
    assert_eq!(recorded.ends, 1);
    assert_eq!(afters.load(Ordering::SeqCst), 1);
}

#[test]
fn test_after_hooks_do_not_wait_for_async_completion() {
    let server = common::server();
    let parked = Arc::new(Mutex::new(None));
    let slot = parked.clone();
    server.add(Route::get("/later", move |_, res| {
        *slot.lock().unwrap() = Some(res.clone());
    }));

    let (res, sink) = RecordingSink::response();
    server.invoke("/later", Request::new("GET", "/later"), &res);
    assert_eq!(sink.snapshot().ends, 0);

    let held = parked.lock().unwrap().take().unwrap();
    held.send("done");
    res.close();
    assert_eq!(sink.snapshot().ends, 1);
    assert_eq!(sink.snapshot().body_text(), "done");
}

#[test]
fn test_removed_route_stops_resolving() {
    let server = common::server();
    server.add(Route::get("/items/:id", |_, res| res.send("item")));
    server.add(Route::new(Method::Delete, "/items/:id", |_, res| res.send("deleted")));
    server.remove("/items/:id", Method::Get);
    assert_eq!(server.route_count(), 1);

    let (res, sink) = RecordingSink::response();
    server.invoke("/items/3", Request::new("GET", "/items/3"), &res);
    assert_eq!(sink.snapshot().status, Some(404));

    let (res, sink) = RecordingSink::response();
    server.invoke("/items/3", Request::new("DELETE", "/items/3"), &res);
    assert_eq!(sink.snapshot().body_text(), "deleted");
}

#[test]
fn test_upgrade_on_unregistered_path_never_completes() {
    let server = common::server();
    let upgrades = Arc::new(AtomicUsize::new(0));
    let counter = upgrades.clone();
    server.add_hook(Hook::new("recorder").ws_upgrade(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let (handshake, completed) = RecordingHandshake::new();
    server.upgrade(Request::new("GET", "/nowhere"), handshake);
    assert!(completed.lock().unwrap().is_none());
    assert_eq!(upgrades.load(Ordering::SeqCst), 0);
}

#[test]
fn test_websocket_session_runs_hooks_before_route_callbacks() {
    let server = common::server();
    let trace = log();

    let (up, msg, close) = (trace.clone(), trace.clone(), trace.clone());
    server.add_hook(
        Hook::new("recorder")
            .ws_upgrade(move |req, ws, _| {
                push(&up, format!("hook:upgrade {}", req.url));
                ws.send("welcome");
                Ok(())
            })
            .ws_message(move |_, _, message, _| {
                push(&msg, format!("hook:message {message}"));
                Ok(())
            })
            .ws_close(move |_, _| {
                push(&close, "hook:close");
                Ok(())
            }),
    );

    let (opened, frames_log, closing) = (trace.clone(), trace.clone(), trace.clone());
    server.add_ws(
        WsRoute::new("/chat")
            .opened(move |_, _| push(&opened, "route:opened"))
            .message(move |_, ws, message| {
                push(&frames_log, format!("route:message {message}"));
                ws.send(format!("echo {message}"));
            })
            .closing(move |_| push(&closing, "route:closing")),
    );

    let (handshake, completed) = RecordingHandshake::new();
    let frames = handshake.ws.clone();
    server.upgrade(Request::new("GET", "/chat"), handshake);

    let session = completed.lock().unwrap().take().expect("handshake completed");
    session.opened();
    session.message(WsMessage::Text("hi".into()));
    session.closed();

    assert_eq!(
        entries(&trace),
        vec![
            "hook:upgrade /chat",
            "route:opened",
            "hook:message hi",
            "route:message hi",
            "hook:close",
            "route:closing",
        ]
    );
    assert_eq!(
        *frames.sent.lock().unwrap(),
        vec![
            WsMessage::Text("welcome".into()),
            WsMessage::Text("echo hi".into()),
        ]
    );
}
