//! Runtime configuration for the fetcher and the coordinator.
use std::time::Duration;

use crate::error::FetchError;

pub const DEFAULT_ENDPOINT: &str = "https://sclub.jd.com/comment/productPageComments.action";
pub const DEFAULT_CALLBACK: &str = "fetchJSON_comment98vv21549";

/// Retry configuration for transient page failures.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt. 0 disables retrying.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Add random jitter to delays.
    pub jitter: bool,
}

impl RetryConfig {
    pub fn disabled() -> Self {
        RetryConfig {
            max_retries: 0,
            ..Default::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub endpoint: String,
    pub callback: String,
    /// Applied to every single request.
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            callback: DEFAULT_CALLBACK.to_string(),
            request_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.endpoint.is_empty() {
            return Err(FetchError::Config("endpoint must not be empty".to_string()));
        }
        if self.callback.is_empty() {
            return Err(FetchError::Config("callback must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(FetchError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(FetchError::Config(
                "backoff multiplier must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// How the page range is divided between workers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartitionStrategy {
    /// Equal steps, last worker takes the remainder.
    #[default]
    Remainder,
    /// Partition sizes differ by at most one page.
    Balanced,
}

#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    pub workers: usize,
    pub strategy: PartitionStrategy,
    /// Overall deadline for the worker phase. `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            strategy: PartitionStrategy::default(),
            deadline: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.workers == 0 {
            return Err(FetchError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(FetchError::Config(
                "deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
