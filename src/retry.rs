//! Bounded exponential backoff around a single page fetch.
use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::error::FetchError;

/// Runs `operation` until it succeeds, fails permanently, or the retry
/// budget is spent. Returns the last error in the latter cases.
pub async fn fetch_with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "fetch failed, retrying"
                );

                tokio::time::sleep(wait_before_retry(config, delay)).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Sleep before the next attempt, never longer than `max_delay`.
fn wait_before_retry(config: &RetryConfig, delay: Duration) -> Duration {
    let wait = if config.jitter { add_jitter(delay) } else { delay };
    wait.min(config.max_delay)
}

/// Stretches `delay` by a random factor in `[1, 2)`.
fn add_jitter(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(1.0..2.0);
    Duration::from_secs_f64(delay.as_secs_f64() * factor)
}
