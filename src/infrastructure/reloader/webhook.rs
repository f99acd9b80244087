use crate::domain::errors::ReloadError;
use crate::domain::events::UpdateNotice;
use crate::domain::ports::PageReloader;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::debug;

const WEBHOOK_MAX_RETRIES: u32 = 2;

/// Reloads by POSTing a JSON notice to an HTTP endpoint.
pub struct WebhookReloader {
    url: String,
    client: ClientWithMiddleware,
}

impl WebhookReloader {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(
            url,
            HttpClientFactory::create_client(timeout, WEBHOOK_MAX_RETRIES),
        )
    }

    pub fn with_client(url: impl Into<String>, client: ClientWithMiddleware) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn body(notice: &UpdateNotice) -> serde_json::Value {
        serde_json::json!({
            "event": "reload",
            "message": notice.message,
            "payload": notice.payload,
            "requested_at": Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl PageReloader for WebhookReloader {
    async fn reload(&self, notice: &UpdateNotice) -> Result<(), ReloadError> {
        let failed = |reason: String| ReloadError::Webhook {
            url: self.url.clone(),
            reason,
        };

        debug!("WebhookReloader: POST {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&Self::body(notice))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(failed(format!("HTTP {}", status)))
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one request and answers with `status_line`. Returns the raw
    /// request text.
    async fn serve_once(listener: TcpListener, status_line: &'static str) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(split) = text.find("\r\n\r\n") {
                let content_length = text[..split]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= split + 4 + content_length {
                    break;
                }
            }
        }
        let response = format!("{}\r\ncontent-length: 0\r\n\r\n", status_line);
        stream.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    }

    #[test]
    fn test_body_carries_message_and_payload() {
        let notice = UpdateNotice::from_payload(json!({"message": "Data updated", "rows": 3}));
        let body = WebhookReloader::body(&notice);

        assert_eq!(body["event"], "reload");
        assert_eq!(body["message"], "Data updated");
        assert_eq!(body["payload"]["rows"], 3);
        assert!(body["requested_at"].is_string());
    }

    #[test]
    fn test_body_with_missing_message_is_null() {
        let notice = UpdateNotice::from_payload(serde_json::Value::Null);
        let body = WebhookReloader::body(&notice);
        assert!(body["message"].is_null());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_webhook_error() {
        // Port 9 (discard) on loopback is not expected to accept HTTP
        let client = HttpClientFactory::create_client(Duration::from_millis(500), 0);
        let reloader = WebhookReloader::with_client("http://127.0.0.1:9/reload", client);
        let err = reloader
            .reload(&UpdateNotice::with_message("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReloadError::Webhook { .. }));
    }

    #[tokio::test]
    async fn test_reload_posts_json_notice() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(listener, "HTTP/1.1 200 OK"));

        let client = HttpClientFactory::create_client(Duration::from_secs(2), 0);
        let reloader = WebhookReloader::with_client(format!("http://{}/reload", addr), client);
        reloader
            .reload(&UpdateNotice::with_message("new data"))
            .await
            .unwrap();

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /reload "));
        assert!(lower.contains("content-type: application/json"));
        assert!(request.contains(r#""event":"reload""#));
        assert!(request.contains(r#""message":"new data""#));
    }

    #[tokio::test]
    async fn test_error_status_is_webhook_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_once(listener, "HTTP/1.1 404 Not Found"));

        let client = HttpClientFactory::create_client(Duration::from_secs(2), 0);
        let reloader = WebhookReloader::with_client(format!("http://{}/reload", addr), client);
        let err = reloader
            .reload(&UpdateNotice::with_message("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReloadError::Webhook { ref reason, .. } if reason.contains("404")));
    }
}
