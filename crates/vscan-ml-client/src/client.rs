//! Inference worker HTTP client.

use std::collections::VecDeque;
use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};
use vscan_models::WorkerRecord;

use crate::error::{MlError, MlResult};
use crate::ndjson::NdjsonDecoder;
use crate::types::ProcessRequest;

/// Configuration for the worker client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the worker
    pub base_url: String,
    /// Connect timeout for every request
    pub connect_timeout: Duration,
    /// Whole-request timeout for stats and health calls
    pub request_timeout: Duration,
    /// Max retries for stats and health calls
    pub max_retries: u32,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://worker:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("WORKER_URL")
                .unwrap_or_else(|_| "http://worker:5000".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("WORKER_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("WORKER_STATS_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            max_retries: std::env::var("WORKER_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }

    /// Config pointing at `base_url` with default timeouts.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Client for the inference worker.
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
}

impl MlClient {
    /// Create a new worker client.
    ///
    /// No overall timeout is set on the HTTP client: a process stream lasts
    /// as long as the job.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check if the worker is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self
            .http
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Worker health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Worker health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Fetch the worker's telemetry document.
    pub async fn stats(&self) -> MlResult<serde_json::Value> {
        let url = format!("{}/stats", self.config.base_url);

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .get(&url)
                    .timeout(self.config.request_timeout)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(MlError::Status(response.status().as_u16()));
                }
                Ok(response)
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Start processing `path` and return its record stream.
    ///
    /// Not retried: the worker may already have begun the job.
    pub async fn process(&self, path: &str) -> MlResult<ProcessStream> {
        let url = format!("{}/process", self.config.base_url);

        debug!("Dispatching {} to {}", path, url);

        let response = self
            .http
            .post(&url)
            .json(&ProcessRequest::new(path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MlError::Status(response.status().as_u16()));
        }

        Ok(ProcessStream::new(response))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    debug!(
                        "Worker request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| MlError::ServiceUnavailable("no attempts made".to_string())))
    }
}

/// Records of one `POST /process` response, decoded as chunks arrive.
pub struct ProcessStream {
    response: Response,
    decoder: NdjsonDecoder,
    ready: VecDeque<WorkerRecord>,
    finished: bool,
}

impl ProcessStream {
    fn new(response: Response) -> Self {
        Self {
            response,
            decoder: NdjsonDecoder::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    /// Next record, or `None` once the worker closed the stream.
    ///
    /// An error means the connection broke mid-stream.
    pub async fn next_record(&mut self) -> MlResult<Option<WorkerRecord>> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Ok(Some(record));
            }
            if self.finished {
                return Ok(None);
            }

            match self.response.chunk().await? {
                Some(chunk) => self.ready.extend(self.decoder.push(&chunk)),
                None => {
                    self.finished = true;
                    self.ready.extend(self.decoder.finish());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> MlClient {
        let mut config = MlClientConfig::with_base_url(server.uri());
        config.max_retries = 0;
        MlClient::new(config).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.base_url, "http://worker:5000");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_process_streams_records() {
        let server = MockServer::start().await;
        let body = "{\"status\":\"starting\"}\n{\"status\":\"progress\",\"frame\":2,\"total_frames\":4,\"progress\":0.5}\n{\"status\":\"complete\",\"detections\":[]}\n";
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(body_json(serde_json::json!({"path": "cam/a.mp4"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let mut stream = client(&server).process("cam/a.mp4").await.unwrap();
        let mut records = Vec::new();
        while let Some(record) = stream.next_record().await.unwrap() {
            records.push(record);
        }

        assert_eq!(
            records,
            vec![
                WorkerRecord::Starting,
                WorkerRecord::Progress {
                    frame: 2,
                    total_frames: 4,
                    progress: 0.5
                },
                WorkerRecord::Complete { detections: vec![] },
            ]
        );
    }

    #[tokio::test]
    async fn test_process_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).process("a.mp4").await.err().unwrap();
        assert!(matches!(err, MlError::Status(500)));
        assert_eq!(err.to_string(), "Worker returned 500");
    }

    #[tokio::test]
    async fn test_stats_and_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"gpu": {"util": 12}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(
            client.stats().await.unwrap(),
            serde_json::json!({"gpu": {"util": 12}})
        );
        assert!(client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_worker_is_unhealthy() {
        let client = MlClient::new(MlClientConfig {
            max_retries: 0,
            connect_timeout: Duration::from_millis(200),
            ..MlClientConfig::with_base_url("http://127.0.0.1:9")
        })
        .unwrap();

        assert!(!client.health_check().await.unwrap());
        assert!(client.stats().await.is_err());
    }
}
