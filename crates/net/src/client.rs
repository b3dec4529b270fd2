//! HTTP client with connection pooling and retry logic

use bytes::Bytes;
use graft_config::NetworkConfig;
use graft_errors::{Error, NetworkError};
use graft_events::{AppEvent, DownloadEvent, EventEmitter, EventSender};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use crate::retry::{calculate_backoff_delay, RetryConfig};
use crate::validation::{is_absent, validate_response};

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 16,
            retry: RetryConfig::default(),
            user_agent: format!("graft/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            retry: RetryConfig {
                max_retries: config.retries,
                initial_delay: Duration::from_millis(config.retry_delay),
                ..RetryConfig::default()
            },
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
    tx: Option<EventSender>,
}

impl EventEmitter for NetClient {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self {
            client,
            config,
            tx: None,
        })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Report retries on the given channel
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Fetch a whole body, mapping 404/410 to `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts or the
    /// server answers with any other non-success status.
    pub async fn get_optional(&self, url: &str) -> Result<Option<Bytes>, Error> {
        let response = self.get(url).await?;
        if is_absent(response.status()) {
            return Ok(None);
        }
        validate_response(&response)?;

        response
            .bytes()
            .await
            .map(Some)
            .map_err(|e| NetworkError::DownloadFailed(e.to_string()).into())
    }

    /// Execute a GET request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts, including
    /// network timeouts, connection failures, or server errors.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(url, || self.client.get(url).send())
            .await
    }

    /// Execute a request with retries
    async fn retry_request<F, Fut>(&self, url: &str, mut f: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;

        loop {
            let outcome = f().await;
            let retryable = match &outcome {
                Ok(response) => response.status().is_server_error(),
                Err(e) => Self::should_retry(e),
            };

            if !retryable || attempt >= max_retries {
                return Self::finish(outcome);
            }

            attempt += 1;
            let delay = calculate_backoff_delay(&self.config.retry, attempt);
            tracing::debug!(url, attempt, ?delay, "retrying request");
            self.emit(AppEvent::Download(DownloadEvent::Retrying {
                url: url.to_string(),
                attempt: attempt as usize,
                max_attempts: max_retries as usize + 1,
                backoff_delay: delay,
            }));
            tokio::time::sleep(delay).await;
        }
    }

    fn finish(outcome: Result<Response, reqwest::Error>) -> Result<Response, Error> {
        match outcome {
            Ok(response) => {
                // Check for rate limiting
                if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    let seconds = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(NetworkError::RateLimited { seconds }.into());
                }
                Ok(response)
            }
            Err(e) if e.is_timeout() => Err(NetworkError::Timeout {
                url: e
                    .url()
                    .map(std::string::ToString::to_string)
                    .unwrap_or_default(),
            }
            .into()),
            Err(e) if e.is_connect() => Err(NetworkError::ConnectionRefused(e.to_string()).into()),
            Err(e) => Err(NetworkError::DownloadFailed(e.to_string()).into()),
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }
}
