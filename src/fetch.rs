// src/fetch.rs

//! Outbound HTTP with bounded retry and backoff.
//!
//! The retry budget lives in a [`RetryPolicy`] rather than at the call
//! sites; every request runs the same loop with no state carried across
//! unrelated requests. When an API key is configured, requests are routed
//! through the ScraperAPI proxy to bypass upstream IP blocks.

use std::time::Duration;

use url::Url;

use crate::config::FetcherConfig;
use crate::error::{AppError, Result};

const PROXY_BASE_URL: &str = "http://api.scraperapi.com";

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: usize,
    /// Sleep before retry `i`; the last entry repeats if the schedule is
    /// shorter than the retry count.
    pub backoff_ms: Vec<u64>,
    /// HTTP statuses worth another attempt. Transport-level failures are
    /// always retried.
    pub retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_ms: config.backoff_schedule_ms.clone(),
            retryable_statuses: vec![500, 502, 503, 504],
        }
    }

    fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    fn backoff_for(&self, retry: usize) -> Duration {
        let ms = self
            .backoff_ms
            .get(retry)
            .or_else(|| self.backoff_ms.last())
            .copied()
            .unwrap_or(0);
        Duration::from_millis(ms)
    }
}

/// HTTP fetcher with automatic retry.
pub struct Fetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
    api_key: Option<String>,
}

impl Fetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
            api_key: config.api_key.clone(),
        })
    }

    /// Build a fetcher with an explicit retry policy.
    pub fn with_policy(config: &FetcherConfig, policy: RetryPolicy) -> Result<Self> {
        let mut fetcher = Self::new(config)?;
        fetcher.policy = policy;
        Ok(fetcher)
    }

    /// The URL actually requested: the target itself, or the proxy URL
    /// wrapping it when an API key is configured. `render_js` asks the
    /// proxy to run the page's scripts, needed for single-page apps.
    fn request_url(&self, target: &str, render_js: bool) -> Result<String> {
        match &self.api_key {
            Some(key) => {
                let render = if render_js { "true" } else { "false" };
                let url = Url::parse_with_params(
                    PROXY_BASE_URL,
                    &[("api_key", key.as_str()), ("url", target), ("render", render)],
                )
                .map_err(|e| AppError::fetch(target, None, e.to_string()))?;
                Ok(url.into())
            }
            None => Ok(target.to_string()),
        }
    }

    /// Fetch a page and return its body text.
    ///
    /// Retryable statuses and transport failures are retried per the
    /// policy; anything else is surfaced immediately as
    /// [`AppError::Fetch`].
    pub async fn fetch_text(&self, target: &str) -> Result<String> {
        self.fetch_with(target, false).await
    }

    /// As [`fetch_text`](Self::fetch_text), requesting JS rendering from
    /// the proxy. Without an API key this is a plain fetch.
    pub async fn fetch_text_rendered(&self, target: &str) -> Result<String> {
        self.fetch_with(target, true).await
    }

    async fn fetch_with(&self, target: &str, render_js: bool) -> Result<String> {
        let url = self.request_url(target, render_js)?;
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.policy.backoff_for(attempt - 1)).await;
            }

            match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success() {
                        return Ok(response.text().await?);
                    }
                    if !self.policy.is_retryable(status) {
                        return Err(AppError::fetch(
                            target,
                            Some(status),
                            "non-retryable response status",
                        ));
                    }
                    log::warn!(
                        "Retryable status {} from {} (attempt {}/{})",
                        status,
                        target,
                        attempt + 1,
                        self.policy.max_retries + 1
                    );
                    last_error =
                        Some(AppError::fetch(target, Some(status), "retries exhausted"));
                }
                Err(e) => {
                    log::warn!(
                        "Transport failure for {} (attempt {}/{}): {}",
                        target,
                        attempt + 1,
                        self.policy.max_retries + 1,
                        e
                    );
                    last_error = Some(AppError::fetch(
                        target,
                        e.status().map(|s| s.as_u16()),
                        e.to_string(),
                    ));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::fetch(target, None, "no attempts made")))
    }
}
