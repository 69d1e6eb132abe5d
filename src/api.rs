//! Async client for the dashboard analytics API.
//!
//! Each dataset is one GET returning a JSON array (or a `{data: [...]}`
//! envelope). Transient failures retry with exponential backoff and
//! jitter; HTTP 4xx other than 408/429 fail immediately. A failed
//! dataset surfaces as an error to its caller and stays isolated there:
//! one chart's failure never takes down another.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use tokio::time::sleep;

use crate::boxplot::BucketStrategy;
use crate::config::Config;
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::normalize::{
    self, BlogTopicRecord, CorrelationRecord, Normalized, RatingRecord, SolvabilityRecord,
    TopicRatingRecord,
};

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter_factor: 0.3,
        }
    }
}

impl RetryConfig {
    fn from_config(cfg: &Config) -> Self {
        Self {
            max_retries: cfg.retry_max,
            base_delay_ms: cfg.retry_base_ms,
            max_delay_ms: cfg.retry_max_ms,
            ..Default::default()
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);
        let jitter_range = clamped * self.jitter_factor;
        let jitter: f64 = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        Duration::from_millis((clamped + jitter).max(0.0) as u64)
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

pub fn is_retryable_network_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

enum FetchError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

/// Retry a fetch attempt with exponential backoff; fatal errors
/// short-circuit.
async fn retry_fetch<F, Fut>(config: &RetryConfig, endpoint: &str, mut attempt_fn: F) -> Result<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Value, FetchError>>,
{
    let mut last: Option<anyhow::Error> = None;
    for attempt in 0..=config.max_retries {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(FetchError::Fatal(e)) => return Err(e),
            Err(FetchError::Retryable(e)) => {
                if attempt < config.max_retries {
                    let delay = config.delay_for_attempt(attempt);
                    log(
                        Level::Warn,
                        Domain::Fetch,
                        "retry",
                        obj(&[
                            ("endpoint", v_str(endpoint)),
                            ("attempt", v_num((attempt + 1) as f64)),
                            ("error", v_str(&e.to_string())),
                            ("delay_ms", v_num(delay.as_millis() as f64)),
                        ]),
                    );
                    sleep(delay).await;
                }
                last = Some(e);
            }
        }
    }
    Err(last.unwrap_or_else(|| anyhow!("retry exhausted without error")))
}

/// Abstraction over the raw JSON source so aggregation tests can run
/// against canned responses.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn get_json(&self, endpoint: &str) -> Result<Value>;
}

pub struct ApiClient {
    http: reqwest::Client,
    cfg: Config,
    retry: RetryConfig,
}

impl ApiClient {
    pub fn new(cfg: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let retry = RetryConfig::from_config(&cfg);
        Self { http, cfg, retry }
    }
}

#[async_trait]
impl DataSource for ApiClient {
    async fn get_json(&self, endpoint: &str) -> Result<Value> {
        let url = self.cfg.endpoint(endpoint);
        retry_fetch(&self.retry, endpoint, || {
            let http = self.http.clone();
            let url = url.clone();
            async move {
                let resp = http.get(&url).send().await.map_err(|e| {
                    if is_retryable_network_error(&e) {
                        FetchError::Retryable(anyhow!("network error: {}", e))
                    } else {
                        FetchError::Fatal(anyhow!("request failed: {}", e))
                    }
                })?;
                let status = resp.status();
                if !status.is_success() {
                    let err = anyhow!("GET {} -> {}", url, status);
                    return Err(if is_retryable_status(status.as_u16()) {
                        FetchError::Retryable(err)
                    } else {
                        FetchError::Fatal(err)
                    });
                }
                resp.json::<Value>()
                    .await
                    .map_err(|e| FetchError::Fatal(anyhow!("invalid JSON body: {}", e)))
            }
        })
        .await
    }
}

/// Monotone fetch stamps. A component takes a stamp when it starts a
/// fetch and applies the response only while the stamp is still current,
/// so a slow earlier response can never overwrite a newer one.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch: advances the current generation and returns its stamp.
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a response carrying `stamp` may still be applied.
    pub fn is_current(&self, stamp: u64) -> bool {
        self.0.load(Ordering::SeqCst) == stamp
    }
}

/// One rating-distribution dataset: the rows plus the correlation
/// coefficient the endpoint attaches to its envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingDataset {
    pub records: Normalized<RatingRecord>,
    pub correlation: Option<f64>,
}

pub async fn rating_dataset(
    source: &dyn DataSource,
    strategy: BucketStrategy,
) -> Result<RatingDataset> {
    let value = source.get_json(strategy.endpoint()).await?;
    let correlation_key = format!("{}_correlation", envelope_metric_name(strategy));
    Ok(RatingDataset {
        records: normalize::ratings(&value, strategy.group_field()),
        correlation: normalize::envelope_metric(&value, &correlation_key),
    })
}

fn envelope_metric_name(strategy: BucketStrategy) -> &'static str {
    match strategy {
        BucketStrategy::Experience => "experience",
        BucketStrategy::SolvedCount => "solutions_amount",
        BucketStrategy::SolvedRating => "solutions_rating",
        BucketStrategy::Solvability => "solutions_solvability",
    }
}

pub async fn blog_dataset(source: &dyn DataSource) -> Result<Normalized<BlogTopicRecord>> {
    Ok(normalize::blog_topics(&source.get_json("blogs_topics_data").await?))
}

pub async fn correlation_dataset(
    source: &dyn DataSource,
) -> Result<Normalized<CorrelationRecord>> {
    Ok(normalize::correlations(&source.get_json("topics_correlation").await?))
}

pub async fn solvability_dataset(
    source: &dyn DataSource,
) -> Result<Normalized<SolvabilityRecord>> {
    Ok(normalize::solvabilities(&source.get_json("topics_solvability").await?))
}

pub async fn topic_rating_dataset(
    source: &dyn DataSource,
) -> Result<Normalized<TopicRatingRecord>> {
    Ok(normalize::topic_ratings(&source.get_json("topics_distribution_by_rating").await?))
}
