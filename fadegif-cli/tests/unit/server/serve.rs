use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use super::*;

fn test_server(max_body_bytes: usize) -> Server {
    Server::new(
        AppState {
            tokens: TokenTable::from_pairs([("tok", "user-1")]),
            limiter: RateLimiter::new(TimeDelta::days(7)),
            limits: RequestLimits::default(),
        },
        max_body_bytes,
    )
}

async fn read_response(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    // The server may reset the socket after answering early, so keep what was read.
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    String::from_utf8_lossy(&out).into_owned()
}

async fn roundtrip(addr: SocketAddr, request: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    read_response(&mut stream).await
}

fn post(body: &str, auth: &str) -> String {
    format!(
        "POST /generate HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Authorization: {auth}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

fn generate_body() -> String {
    let images: Vec<String> = [[255, 0, 0, 255], [0, 0, 255, 255]]
        .into_iter()
        .map(|px| {
            let mut buf = Cursor::new(Vec::new());
            RgbaImage::from_pixel(4, 4, Rgba(px))
                .write_to(&mut buf, ImageFormat::Png)
                .unwrap();
            BASE64.encode(buf.into_inner())
        })
        .collect();
    let body = serde_json::json!({ "images": images, "duration": 50, "fade_frames": 2 });
    body.to_string()
}

#[tokio::test]
async fn serves_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(test_server(64 * 1024).serve(listener, async move {
        let _ = rx.await;
    }));

    let resp = roundtrip(
        addr,
        "OPTIONS / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_string(),
    )
    .await;
    assert!(resp.starts_with("HTTP/1.1 204"), "{resp}");
    let lower = resp.to_ascii_lowercase();
    assert!(lower.contains("access-control-allow-origin: *"));

    let resp = roundtrip(addr, post(r#"{"images": []}"#, "Bearer wrong")).await;
    assert!(resp.starts_with("HTTP/1.1 401"), "{resp}");
    assert!(resp.contains("Invalid authentication token"));

    let resp = roundtrip(addr, post(r#"{"images": ["a"]}"#, "Bearer tok")).await;
    assert!(resp.starts_with("HTTP/1.1 400"), "{resp}");
    assert!(resp.contains("At least 2 images required"));

    tx.send(()).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn serves_413_for_oversized_body() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(test_server(1024).serve(listener, async move {
        let _ = rx.await;
    }));

    let body = format!(r#"{{"images": ["{}"]}}"#, "A".repeat(4096));
    let resp = roundtrip(addr, post(&body, "Bearer tok")).await;
    assert!(resp.starts_with("HTTP/1.1 413"), "{resp}");
    assert!(resp.contains("Payload too large"), "{resp}");

    tx.send(()).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_drains_in_flight_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = test_server(64 * 1024).with_drain_timeout(Duration::from_secs(10));
    let task = tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));

    let body = generate_body();
    let request = post(&body, "Bearer tok");
    let (head, tail) = request.split_at(request.len() - body.len() / 2);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Stop accepting while the request body is still arriving.
    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!task.is_finished());

    stream.write_all(tail.as_bytes()).await.unwrap();
    let resp = read_response(&mut stream).await;
    assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
    assert!(resp.contains(r#""gif":"#), "{resp}");

    task.await.unwrap().unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}
