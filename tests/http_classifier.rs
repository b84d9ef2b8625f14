// HttpClassifier tests against a local one-shot HTTP responder.
//
// Each test binds a TcpListener on 127.0.0.1:0, serves a single canned
// response, and checks how the client maps it onto VerifyError. The
// responder also captures the request so the wire format can be asserted.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use phishwatch::classifier::http::HttpClassifier;
use phishwatch::classifier::traits::Classifier;
use phishwatch::config::Config;
use phishwatch::verify::{Orchestrator, RiskLevel, SubmissionState, VerifyError};

/// What the responder does once it has read the request.
enum Reply {
    /// Send this status and JSON body.
    Respond(u16, &'static str),
    /// Never answer; hold the connection open.
    Hang,
}

struct CapturedRequest {
    head: String,
    body: String,
}

/// Serve exactly one request. Returns the base URL and a receiver for the
/// captured request.
async fn serve_once(reply: Reply) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let _ = tx.send(request);

        match reply {
            Reply::Respond(status, body) => {
                let response = format!(
                    "HTTP/1.1 {status} Status\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
    });

    (format!("http://{addr}"), rx)
}

/// Read headers, then as many body bytes as Content-Length announces.
async fn read_request(socket: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    CapturedRequest { head, body }
}

fn client(base_url: &str, timeout: Duration) -> HttpClassifier {
    HttpClassifier::new(base_url, timeout, "phishwatch-test").unwrap()
}

#[tokio::test]
async fn posts_json_to_check_url_endpoint() {
    let (base, captured) = serve_once(Reply::Respond(
        200,
        r#"{"url": "http://example.com", "is_safe": true, "risk_level": "safe", "checks": {}, "details": ["No suspicious traits detected"], "checked_at": "2025-06-01T12:00:00"}"#,
    ))
    .await;

    let response = client(&base, Duration::from_secs(5))
        .classify("http://example.com")
        .await
        .unwrap();

    assert_eq!(response.risk_level, "safe");
    assert_eq!(response.is_safe, Some(true));
    assert_eq!(response.details, vec!["No suspicious traits detected"]);

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("POST /api/check-url HTTP/1.1"));
    assert!(request
        .head
        .to_ascii_lowercase()
        .contains("user-agent: phishwatch-test"));
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body, serde_json::json!({ "url": "http://example.com" }));
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let (base, _) = serve_once(Reply::Respond(500, r#"{"detail": "database locked"}"#)).await;

    let err = client(&base, Duration::from_secs(5))
        .classify("http://example.com")
        .await
        .unwrap_err();

    match err {
        VerifyError::ServiceRejected { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("database locked"));
        }
        other => panic!("expected ServiceRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let (base, _) = serve_once(Reply::Respond(200, r#"<html>not json</html>"#)).await;

    let err = client(&base, Duration::from_secs(5))
        .classify("http://example.com")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "malformed_response");
}

#[tokio::test]
async fn body_without_risk_level_is_malformed() {
    let (base, _) = serve_once(Reply::Respond(200, r#"{"url": "x", "details": []}"#)).await;

    let err = client(&base, Duration::from_secs(5))
        .classify("x")
        .await
        .unwrap_err();

    assert!(matches!(err, VerifyError::MalformedResponse(_)));
}

#[tokio::test]
async fn timeout_is_service_unavailable() {
    let (base, _) = serve_once(Reply::Hang).await;

    let err = client(&base, Duration::from_millis(200))
        .classify("http://bad.test")
        .await
        .unwrap_err();

    assert!(matches!(err, VerifyError::ServiceUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn refused_connection_is_service_unavailable() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"), Duration::from_secs(2))
        .classify("http://example.com")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "service_unavailable");
}

#[tokio::test]
async fn health_endpoint_is_parsed() {
    let (base, captured) = serve_once(Reply::Respond(
        200,
        r#"{"status": "healthy", "timestamp": "2025-06-01T12:00:00", "phishing_urls_in_db": 1200}"#,
    ))
    .await;

    let report = client(&base, Duration::from_secs(5)).health().await.unwrap();

    assert!(report.is_healthy());
    assert_eq!(report.phishing_urls_in_db, Some(1200));
    let request = captured.await.unwrap();
    assert!(request.head.starts_with("GET /api/health HTTP/1.1"));
}

#[tokio::test]
async fn orchestrator_over_http_end_to_end() {
    let (base, _) = serve_once(Reply::Respond(
        200,
        r#"{"url": "http://paypa1-login.com", "is_safe": false, "risk_level": "suspicious", "checks": {"has_suspicious_numbers": true}, "details": ["Digits substituted for letters"], "checked_at": "2025-06-01T12:00:00+00:00"}"#,
    ))
    .await;

    let config = Config::default()
        .with_api_url(&base)
        .with_timeout_secs(5)
        .unwrap();
    let classifier = HttpClassifier::from_config(&config).unwrap();
    let orch = Orchestrator::new(Arc::new(classifier));

    orch.submit_raw(" http://paypa1-login.com ").await.unwrap();

    let snapshot = orch.snapshot().await;
    assert_eq!(snapshot.state, SubmissionState::Idle);
    let result = snapshot.history.latest().unwrap();
    assert_eq!(result.url(), "http://paypa1-login.com");
    assert_eq!(result.risk_level(), &RiskLevel::Suspicious);
    assert_eq!(result.is_safe(), Some(false));
    assert_eq!(result.checks().get("has_suspicious_numbers"), Some(&true));
}

#[tokio::test]
async fn orchestrator_over_http_timeout_then_nothing_recorded() {
    let (base, _) = serve_once(Reply::Hang).await;

    let orch = Orchestrator::new(Arc::new(client(&base, Duration::from_millis(200))));

    let err = orch.submit_raw("http://bad.test").await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(orch.state().await, SubmissionState::Errored);
    assert!(orch.history().await.is_empty());
}
