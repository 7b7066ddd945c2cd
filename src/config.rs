use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::backoff::Backoff;
use crate::{
    Error, Result, BASE_URL, CONCURRENT_REQUESTS, CSV_FILE, LOG_FILE, MEMORY_BATCH, PER_PAGE,
    REQUEST_TIMEOUT_SECS, USER_AGENTS,
};

/// Tuning knobs for one run. Built once and handed to the [`Scraper`](crate::process::Scraper).
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Records requested per page.
    pub per_page: u32,
    /// Flush threshold, counted in pages of `per_page` records.
    pub memory_batch: usize,
    /// Batch size and the cap on in-flight requests.
    pub concurrent_requests: usize,
    pub request_timeout: Duration,
    /// `None` stands for a direct connection.
    pub proxies: Vec<Option<String>>,
    pub user_agents: Vec<String>,
    pub csv_path: PathBuf,
    pub log_path: PathBuf,
    pub backoff: Backoff,
    /// Failed attempts after which a page is abandoned. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            per_page: PER_PAGE,
            memory_batch: MEMORY_BATCH,
            concurrent_requests: CONCURRENT_REQUESTS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            proxies: vec![None],
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            csv_path: PathBuf::from(CSV_FILE),
            log_path: PathBuf::from(LOG_FILE),
            backoff: Backoff::default(),
            max_attempts: None,
        }
    }
}

impl Config {
    /// Number of buffered records that triggers a write to disk.
    pub fn flush_threshold(&self) -> usize {
        self.memory_batch.saturating_mul(self.per_page as usize)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrent_requests == 0 {
            return Err(Error::InvalidConfig("concurrent_requests must be at least 1"));
        }
        if self.concurrent_requests > Semaphore::MAX_PERMITS {
            return Err(Error::InvalidConfig("concurrent_requests exceeds the semaphore limit"));
        }
        if self.per_page == 0 {
            return Err(Error::InvalidConfig("per_page must be at least 1"));
        }
        if self.user_agents.is_empty() {
            return Err(Error::InvalidConfig("user_agents can't be empty"));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::InvalidConfig("max_attempts must be at least 1"));
        }
        self.backoff.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_tunables() {
        let config = Config::default();
        assert_eq!(config.per_page, 50);
        assert_eq!(config.memory_batch, 100);
        assert_eq!(config.concurrent_requests, 10);
        assert_eq!(config.flush_threshold(), 5000);
        assert_eq!(config.proxies, vec![None]);
        assert_eq!(config.user_agents.len(), 3);
        assert_eq!(config.max_attempts, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_settings() {
        let config = Config {
            concurrent_requests: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = Config {
            user_agents: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = Config {
            max_attempts: Some(0),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = Config {
            concurrent_requests: Semaphore::MAX_PERMITS + 1,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = Config {
            backoff: Backoff {
                base_secs: f64::NAN,
                ..Backoff::default()
            },
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
