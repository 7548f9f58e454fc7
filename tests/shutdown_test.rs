//! Graceful shutdown: bounded stop, cancellation propagation, drain.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use tokio::sync::Notify;
use webhost::router::Router;

mod common;

fn addr_of(root_url: &str) -> SocketAddr {
    root_url
        .strip_prefix("http://")
        .unwrap()
        .parse()
        .unwrap()
}

/// Route whose handler signals `entered` on invocation, then runs `body`.
fn router_with_entry_notify<F, Fut>(pattern: &str, entered: Arc<Notify>, body: F) -> Router
where
    F: Fn(webhost::RequestScope) -> Fut + Send + Sync + Clone + 'static,
    Fut: std::future::Future<Output = &'static str> + Send + 'static,
{
    let mut router = common::sample_router();
    router
        .handle_fn(Method::GET, pattern, move |scope, _req, mut w| {
            let entered = entered.clone();
            let body = body.clone();
            async move {
                entered.notify_one();
                let text = body(scope).await;
                w.write(text.as_bytes());
                w
            }
        })
        .unwrap();
    router
}

#[tokio::test]
async fn test_stop_returns_within_grace_despite_stubborn_handler() {
    let entered = Arc::new(Notify::new());
    let router = router_with_entry_notify("/slow", entered.clone(), |_scope| async {
        // Ignores cancellation entirely.
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    });

    let server = common::server_with(router);
    let root_url = server.start().await.unwrap();
    let addr = addr_of(&root_url);

    let client = common::client();
    let url = format!("{root_url}/slow");
    let _pending = tokio::spawn(async move { client.get(url).send().await });
    entered.notified().await;

    let start = Instant::now();
    server.stop(Duration::from_millis(100)).await.unwrap();
    let elapsed = start.elapsed();

    // The wait is the grace period, not the handler's five seconds.
    assert!(elapsed >= Duration::from_millis(80), "stopped early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "stop not bounded: {elapsed:?}");

    // The listener is released: new connections are refused.
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_cancellation_aware_handler_unblocks_stop() {
    let entered = Arc::new(Notify::new());
    let router = router_with_entry_notify("/poll", entered.clone(), |scope| async move {
        tokio::select! {
            _ = scope.cancelled() => "cancelled",
            _ = tokio::time::sleep(Duration::from_secs(5)) => "timed out",
        }
    });

    let server = common::server_with(router);
    let root_url = server.start().await.unwrap();

    let client = common::client();
    let url = format!("{root_url}/poll");
    let pending = tokio::spawn(async move { client.get(url).send().await });
    entered.notified().await;

    let start = Instant::now();
    server.stop(Duration::from_secs(2)).await.unwrap();
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "cooperative handler should finish well before the grace period"
    );

    // The in-flight response is still delivered during shutdown.
    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.text().await.unwrap(), "cancelled");
}

#[tokio::test]
async fn test_stop_waits_for_handlers_that_finish_in_time() {
    let entered = Arc::new(Notify::new());
    let router = router_with_entry_notify("/brief", entered.clone(), |_scope| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        "done"
    });

    let server = common::server_with(router);
    let root_url = server.start().await.unwrap();

    let client = common::client();
    let url = format!("{root_url}/brief");
    let pending = tokio::spawn(async move { client.get(url).send().await });
    entered.notified().await;

    server.stop(Duration::from_secs(2)).await.unwrap();

    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "done");
}

#[tokio::test]
async fn test_inflight_scope_observes_signal_flip() {
    // A scope constructed before stop() sees is_cancelled() == false, and
    // its cancelled() future resolves once the signal flips.
    let entered = Arc::new(Notify::new());
    let router = router_with_entry_notify("/flagcheck", entered.clone(), |scope| async move {
        if scope.is_cancelled() {
            "already cancelled"
        } else {
            scope.cancelled().await;
            "cancelled later"
        }
    });

    let server = common::server_with(router);
    let root_url = server.start().await.unwrap();

    let client = common::client();
    let url = format!("{root_url}/flagcheck");
    let pending = tokio::spawn(async move { client.get(url).send().await });
    entered.notified().await;

    server.stop(Duration::from_secs(2)).await.unwrap();
    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.text().await.unwrap(), "cancelled later");
}
