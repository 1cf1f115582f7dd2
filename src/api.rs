//! Document transport with optional retry and exponential backoff.
//!
//! The pipeline only needs "give me the HTML behind this locator". That seam
//! is the [`DocumentSource`] trait:
//! - [`HttpSource`]: a single GET through `reqwest`
//! - [`RetryFetch`]: decorator that retries any [`DocumentSource`]
//!
//! # Retry Strategy
//!
//! Retries are off unless configured. When enabled:
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to every delay

use crate::config::HarvestConfig;
use crate::errors::HarvestError;
use crate::models::Locator;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Anything that can return the document behind a [`Locator`].
pub trait DocumentSource {
    /// Fetch the raw document text.
    ///
    /// Failures are reported as [`HarvestError::SourceUnavailable`].
    async fn fetch(&self, locator: &Locator) -> Result<String, HarvestError>;
}

/// Plain HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HarvestError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self { client })
    }
}

fn unavailable(locator: &Locator, reason: impl fmt::Display) -> HarvestError {
    HarvestError::SourceUnavailable {
        category: locator.category,
        url: locator.url.to_string(),
        reason: reason.to_string(),
    }
}

impl DocumentSource for HttpSource {
    #[instrument(level = "info", skip_all, fields(url = %locator.url, category = %locator.category))]
    async fn fetch(&self, locator: &Locator) -> Result<String, HarvestError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(locator.url.clone())
            .send()
            .await
            .map_err(|e| unavailable(locator, e))?
            .error_for_status()
            .map_err(|e| unavailable(locator, e))?;
        let body = response.text().await.map_err(|e| unavailable(locator, e))?;

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`DocumentSource`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: DocumentSource,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> DocumentSource for RetryFetch<T>
where
    T: DocumentSource,
{
    #[instrument(level = "debug", skip_all, fields(url = %locator.url))]
    async fn fetch(&self, locator: &Locator) -> Result<String, HarvestError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(locator).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_dt.as_millis() as u64,
                                error = %e,
                                "fetch() exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    struct Flaky {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    impl DocumentSource for Flaky {
        async fn fetch(&self, locator: &Locator) -> Result<String, HarvestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(unavailable(locator, "connection reset"));
            }
            Ok("<html></html>".to_string())
        }
    }

    fn locator() -> Locator {
        Locator {
            url: Url::parse("https://example.com/stats").unwrap(),
            category: Category::StandardStats,
            population: "La Liga".to_string(),
            combined: false,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let source = RetryFetch::new(
            Flaky {
                failures_left: AtomicUsize::new(2),
                calls: AtomicUsize::new(0),
            },
            3,
            StdDuration::from_millis(1),
        );
        let body = source.fetch(&locator()).await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_is_a_single_fetch() {
        let source = RetryFetch::new(
            Flaky {
                failures_left: AtomicUsize::new(1),
                calls: AtomicUsize::new(0),
            },
            0,
            StdDuration::from_millis(1),
        );
        let err = source.fetch(&locator()).await.unwrap_err();
        assert!(matches!(err, HarvestError::SourceUnavailable { .. }));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
    }
}
