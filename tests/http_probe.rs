// ABOUTME: Tests for the HTTP health probe against a real local listener.
// ABOUTME: Uses hand-rolled HTTP/1 responses; no paused clock (real sockets).

use cutover::config::HealthCheckConfig;
use cutover::platform::{EndpointAddr, HttpProbe};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `count` canned HTTP responses on an ephemeral port.
async fn serve(responses: Vec<&'static str>) -> EndpointAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        for body in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 1024];
            // Read the request head; content is irrelevant to the probe.
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(body.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    EndpointAddr::new("127.0.0.1", port)
}

const OK: &str = "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok";
const SERVER_ERROR: &str =
    "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

#[tokio::test]
async fn two_hundred_is_healthy() {
    let endpoint = serve(vec![OK]).await;
    let probe = HttpProbe::new(Duration::from_secs(5));
    assert!(probe.check(&endpoint, "/health").await.unwrap());
}

#[tokio::test]
async fn five_hundred_is_unhealthy() {
    let endpoint = serve(vec![SERVER_ERROR]).await;
    let probe = HttpProbe::new(Duration::from_secs(5));
    assert!(!probe.check(&endpoint, "/health").await.unwrap());
}

#[tokio::test]
async fn connection_refused_is_an_error() {
    // Bind and immediately drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let probe = HttpProbe::new(Duration::from_secs(5));
    let endpoint = EndpointAddr::new("127.0.0.1", port);
    assert!(probe.check(&endpoint, "/health").await.is_err());
}

#[tokio::test]
async fn await_healthy_retries_past_initial_failures() {
    let endpoint = serve(vec![SERVER_ERROR, SERVER_ERROR, OK]).await;
    let probe = HttpProbe::new(Duration::from_secs(5));
    let healthcheck = HealthCheckConfig {
        path: "/health".to_string(),
        port: None,
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(1),
        retries: 5,
    };
    probe.await_healthy(&endpoint, &healthcheck).await.unwrap();
}

#[tokio::test]
async fn await_healthy_gives_up_after_the_retry_limit() {
    let endpoint = serve(vec![SERVER_ERROR; 5]).await;
    let probe = HttpProbe::new(Duration::from_secs(5));
    let healthcheck = HealthCheckConfig {
        path: "/health".to_string(),
        port: None,
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(1),
        retries: 2,
    };
    assert!(probe.await_healthy(&endpoint, &healthcheck).await.is_err());
}
