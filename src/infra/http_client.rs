use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::USER_AGENT;
use crate::error::{Result, ScraperError};

/// Exponential backoff for transient HTTP failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Server errors and rate limiting are worth another attempt; other statuses are final
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Shared reqwest client with a per-call timeout and a retry policy
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, retry })
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send `request` exactly once, for calls that must not be replayed.
    /// A non-success status is returned as an API error with the body text.
    pub async fn send_once(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    /// Send `request`, retrying transport errors, 5xx and 429 per the policy.
    /// Any other non-success status is returned as an API error with the body text.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut retry = 0;
        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| ScraperError::api("request body cannot be replayed"))?;

            let failure = match attempt.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) || retry >= self.retry.max_retries {
                        return Err(status_error(response).await);
                    }
                    format!("HTTP {}", status)
                }
                Err(e) => {
                    if retry >= self.retry.max_retries {
                        return Err(e.into());
                    }
                    e.to_string()
                }
            };

            let delay = self.retry.backoff(retry);
            retry += 1;
            warn!(
                "Request failed ({}), retry {}/{} in {:?}",
                failure, retry, self.retry.max_retries, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

async fn status_error(response: Response) -> ScraperError {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    debug!("{} from {}: {}", status, url, body);
    let snippet: String = body.trim().chars().take(200).collect();
    if snippet.is_empty() {
        ScraperError::api(format!("HTTP {} from {}", status, url))
    } else {
        ScraperError::api(format!("HTTP {} from {}: {}", status, url, snippet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one scripted status line per connection, then stops accepting
    async fn scripted_server(statuses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for status in statuses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let body = r#"{"ok":true}"#;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/"), hits)
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(5),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(10), Duration::from_secs(30));
        assert_eq!(policy.backoff(40), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        let (url, hits) = scripted_server(vec!["503 Service Unavailable", "200 OK"]).await;
        let client = HttpClient::new(Duration::from_secs(5), fast_policy(3)).unwrap();

        let response = client.send(client.inner().get(&url)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) = scripted_server(vec!["404 Not Found"]).await;
        let client = HttpClient::new(Duration::from_secs(5), fast_policy(3)).unwrap();

        let error = client.send(client.inner().get(&url)).await.unwrap_err();

        assert!(error.to_string().contains("404"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_once_does_not_retry_server_errors() {
        let (url, hits) = scripted_server(vec!["503 Service Unavailable", "200 OK"]).await;
        let client = HttpClient::new(Duration::from_secs(5), fast_policy(3)).unwrap();

        let error = client.send_once(client.inner().put(&url)).await.unwrap_err();

        assert!(error.to_string().contains("503"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let (url, hits) =
            scripted_server(vec!["500 Internal Server Error", "500 Internal Server Error"]).await;
        let client = HttpClient::new(Duration::from_secs(5), fast_policy(1)).unwrap();

        let error = client.send(client.inner().get(&url)).await.unwrap_err();

        assert!(matches!(error, ScraperError::Api { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
