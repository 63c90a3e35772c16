//! Reqwest adapter and health check tests using wiremock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use captioneer::adapters::ReqwestHttpClient;
use captioneer::api::{batch_image_form, prompt_body, ImageFile};
use captioneer::config::ClientConfig;
use captioneer::health::check_backend;
use captioneer::ndjson::{decode_stream, drain};
use captioneer::traits::{Headers, HttpClient, HttpError, RequestBody};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NDJSON: &str = "{\"response\":\"Hello\"}\n{\"response\":\", world\"}\n";

#[tokio::test]
async fn test_post_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({"prompt": "2+2=?", "stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_string(NDJSON))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::new();
    let response = client
        .post(
            &format!("{}/predict", mock_server.uri()),
            prompt_body("2+2=?"),
            &Headers::new(),
        )
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.text(), NDJSON);
}

#[tokio::test]
async fn test_post_multipart_repeats_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/describeimagebatch"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"files\"; filename=\"a.png\""))
        .and(body_string_contains("name=\"files\"; filename=\"b.png\""))
        .and(body_string_contains("Describe these images."))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let files = vec![
        ImageFile::new("a.png", vec![1u8, 2, 3]),
        ImageFile::new("b.png", vec![4u8, 5, 6]),
    ];
    let client = ReqwestHttpClient::new();
    let response = client
        .post(
            &format!("{}/describeimagebatch", mock_server.uri()),
            RequestBody::Multipart(batch_image_form(&files, "", 1024)),
            &Headers::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_post_stream_decodes_lines() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictstream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-instance-id", "replica-3")
                .set_body_string(NDJSON),
        )
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::new();
    let response = client
        .post_stream(
            &format!("{}/predictstream", mock_server.uri()),
            prompt_body("hi"),
            &Headers::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.header("X-Instance-Id"), Some("replica-3"));

    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let sink = seen.clone();
    let summary = decode_stream(response.body, move |value| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(value);
            Ok(())
        }
    })
    .await
    .unwrap();

    assert_eq!(summary.values, 2);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["response"], "Hello");
    assert_eq!(seen[1]["response"], ", world");
}

#[tokio::test]
async fn test_post_stream_non_success_is_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/describeimagestream"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-instance-id", "replica-9")
                .set_body_string("Not Found"),
        )
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::new();
    let err = client
        .post_stream(
            &format!("{}/describeimagestream", mock_server.uri()),
            prompt_body("hi"),
            &Headers::new(),
        )
        .await
        .unwrap_err();

    match err {
        HttpError::ServerError {
            status,
            message,
            headers,
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
            assert_eq!(
                headers.get("x-instance-id").map(String::as_str),
                Some("replica-9")
            );
        }
        other => panic!("Expected ServerError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_buffered_post_keeps_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/describeimage"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::new();
    let response = client
        .post(
            &format!("{}/describeimage", mock_server.uri()),
            prompt_body("hi"),
            &Headers::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.text(), "overloaded");
}

#[tokio::test]
async fn test_connection_refused() {
    let client = ReqwestHttpClient::new();
    let result = client.get("http://127.0.0.1:1/health", &Headers::new()).await;

    assert!(matches!(result, Err(HttpError::ConnectionFailed(_))));
}

#[tokio::test]
async fn test_drain_counts_bytes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictstream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}{{\"partial\"", NDJSON)))
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::from_config(&ClientConfig::default()).unwrap();
    let response = client
        .post_stream(
            &format!("{}/predictstream", mock_server.uri()),
            prompt_body("hi"),
            &Headers::new(),
        )
        .await
        .unwrap();

    let summary = drain(response.body).await.unwrap();
    assert_eq!(summary.values, 2);
    assert_eq!(summary.discarded_bytes, "{\"partial\"".len());
}

/// Serve one chunked NDJSON response, writing a line every `gap`.
async fn spawn_trickle_server(lines: usize, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\n\
                  x-instance-id: slow-1\r\ntransfer-encoding: chunked\r\n\r\n",
            )
            .await
            .unwrap();
        for i in 0..lines {
            tokio::time::sleep(gap).await;
            let line = format!("{{\"response\":\"t{}\"}}\n", i);
            let chunk = format!("{:x}\r\n{}\r\n", line.len(), line);
            if socket.write_all(chunk.as_bytes()).await.is_err() {
                return;
            }
        }
        let _ = socket.write_all(b"0\r\n\r\n").await;
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_slow_stream_outlives_connect_timeout() {
    let base = spawn_trickle_server(6, Duration::from_millis(250)).await;
    let config = ClientConfig::default().with_connect_timeout(Duration::from_secs(1));
    let client = ReqwestHttpClient::from_config(&config).unwrap();

    let response = client
        .post_stream(&format!("{}/predictstream", base), prompt_body("hi"), &Headers::new())
        .await
        .unwrap();
    assert_eq!(response.header("x-instance-id"), Some("slow-1"));

    let summary = drain(response.body).await.unwrap();
    assert_eq!(summary.values, 6);
    assert_eq!(summary.discarded_bytes, 0);
}

#[tokio::test]
async fn test_health_check_healthy() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-instance-id", "replica-1")
                .set_body_json(json!({"status": "healthy", "model_loaded": true})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/buildinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "build_time": "2026-01-02T03:04:05Z",
            "model": "vision-1",
            "framework": "torch"
        })))
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::new();
    let report = check_backend(&client, &mock_server.uri()).await;

    assert!(report.is_healthy());
    assert_eq!(report.instance.as_deref(), Some("replica-1"));
    let build = report.build.clone().unwrap();
    assert_eq!(build.model.as_deref(), Some("vision-1"));

    let markdown = report.to_markdown();
    assert!(markdown.contains("✓ Backend responding"));
    assert!(markdown.contains("**Framework:** torch"));
}

#[tokio::test]
async fn test_health_check_unhealthy_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("starting"))
        .mount(&mock_server)
        .await;

    let client = ReqwestHttpClient::new();
    let report = check_backend(&client, &mock_server.uri()).await;

    assert!(!report.is_healthy());
    assert!(!report.reachable);
    assert!(report.to_markdown().contains("✗ Backend not healthy"));
}
