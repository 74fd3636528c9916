use std::time::Duration;

use anyhow::Context;

use super::ForwardPayload;
use crate::errors::WebhookError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Posts forward payloads to the automation endpoint.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for webhook forwarding")?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the payload; a non-2xx answer is an error carrying the body.
    pub async fn forward(&self, payload: &ForwardPayload) -> Result<u16, WebhookError> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|source| self.send_error(source))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %body, "automation endpoint responded");

        if !status.is_success() {
            return Err(WebhookError::Downstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(status.as_u16())
    }

    fn send_error(&self, source: reqwest::Error) -> WebhookError {
        if source.is_timeout() {
            WebhookError::Timeout(self.timeout.as_secs())
        } else {
            WebhookError::Forward {
                url: self.url.clone(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    fn payload() -> ForwardPayload {
        ForwardPayload {
            bucket: "docs".into(),
            file_name: "q3.pdf".into(),
            full_url: "https://x/storage/v1/object/public/docs/q3.pdf".into(),
            timestamp: "2025-03-01T10:00:00.000Z".into(),
        }
    }

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/hook", addr)
    }

    #[tokio::test]
    async fn test_forward_posts_payload() {
        let received: Arc<Mutex<Vec<ForwardPayload>>> = Arc::default();
        let sink = received.clone();
        let app = Router::new().route(
            "/hook",
            post(move |Json(p): Json<ForwardPayload>| {
                let sink = sink.clone();
                async move {
                    sink.lock().await.push(p);
                    StatusCode::OK
                }
            }),
        );
        let url = serve(app).await;

        let forwarder = Forwarder::new(url, Duration::from_secs(5)).unwrap();
        assert_eq!(forwarder.forward(&payload()).await.unwrap(), 200);
        assert_eq!(received.lock().await.as_slice(), &[payload()]);
    }

    #[tokio::test]
    async fn test_forward_non_success_is_downstream_error() {
        let app = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::BAD_GATEWAY, "workflow inactive") }),
        );
        let url = serve(app).await;

        let forwarder = Forwarder::new(url, Duration::from_secs(5)).unwrap();
        match forwarder.forward(&payload()).await {
            Err(WebhookError::Downstream { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "workflow inactive");
            }
            other => panic!("Expected Downstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forward_times_out() {
        let app = Router::new().route(
            "/hook",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let url = serve(app).await;

        let forwarder = Forwarder::new(url, Duration::from_millis(200)).unwrap();
        assert!(matches!(
            forwarder.forward(&payload()).await,
            Err(WebhookError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_forward_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder =
            Forwarder::new(format!("http://{}/hook", addr), Duration::from_secs(2)).unwrap();
        assert!(matches!(
            forwarder.forward(&payload()).await,
            Err(WebhookError::Forward { .. })
        ));
    }
}
