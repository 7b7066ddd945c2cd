use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::USER_AGENT, Client, Proxy};
use serde_json::Value;

use crate::backoff::Backoff;
use crate::logging::LogSink;
use crate::parse::{parse_records, Record};
use crate::rotation::{Identity, IdentityPicker};
use crate::{info_time, Config, Error, Result};

/// Performs one listing request. Transport failures, timeouts and non-2xx statuses all come back as `Err`.
#[async_trait]
pub trait PageClient: Send + Sync {
    async fn get_page(&self, page: u32, identity: &Identity) -> Result<Value>;
}

/// `reqwest` backed client. Proxies are a client level setting in reqwest,
/// so there is one `Client` per entry of the proxy pool.
pub struct ReqwestClient {
    base_url: String,
    per_page: u32,
    clients: HashMap<Option<String>, Client>,
}

impl ReqwestClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut clients = HashMap::new();
        let direct_only = [None];
        let proxies = if config.proxies.is_empty() {
            &direct_only[..]
        } else {
            &config.proxies[..]
        };

        for proxy in proxies {
            let builder = Client::builder().timeout(config.request_timeout);
            let builder = match proxy {
                Some(url) => builder.proxy(Proxy::all(url.as_str())?),
                None => builder.no_proxy(),
            };
            clients.insert(proxy.clone(), builder.build()?);
        }

        Ok(Self {
            base_url: config.base_url.clone(),
            per_page: config.per_page,
            clients,
        })
    }
}

#[async_trait]
impl PageClient for ReqwestClient {
    async fn get_page(&self, page: u32, identity: &Identity) -> Result<Value> {
        let client = self
            .clients
            .get(&identity.proxy)
            .ok_or_else(|| Error::UnknownProxy(identity.proxy_label().to_string()))?;

        let res = client
            .get(&self.base_url)
            .query(&[("page", page), ("per_page", self.per_page)])
            .header(USER_AGENT, identity.user_agent.as_str())
            .send()
            .await?
            .error_for_status()?;
        let body = res.json::<Value>().await?;
        Ok(body)
    }
}

/// What the retry state machine wants to happen after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Failed attempts for a single page. Never shared between pages.
#[derive(Debug)]
pub struct RetryState {
    failures: u32,
    max_attempts: Option<u32>,
}

impl RetryState {
    pub fn new(max_attempts: Option<u32>) -> Self {
        Self {
            failures: 0,
            max_attempts,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn on_failure(&mut self, backoff: &Backoff) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);
        match self.max_attempts {
            Some(max) if self.failures >= max => RetryDecision::GiveUp,
            _ => RetryDecision::Retry(backoff.delay(self.failures)),
        }
    }
}

/// Result of fetching one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Fetched {
        page: u32,
        records: Vec<Record>,
        failures: u32,
    },
    /// Only produced when `max_attempts` is set.
    Abandoned {
        page: u32,
        attempts: u32,
        last_error: String,
    },
}

pub(crate) enum Attempted<T> {
    Done { value: T, failures: u32 },
    Abandoned { attempts: u32, last_error: String },
}

/// Fetches pages, retrying failed attempts with backoff and a fresh identity each time.
/// Cheap to clone, every fetch task gets its own copy.
#[derive(Clone)]
pub struct PageFetcher {
    client: Arc<dyn PageClient>,
    identities: Arc<dyn IdentityPicker>,
    log: Arc<dyn LogSink>,
    backoff: Backoff,
    max_attempts: Option<u32>,
}

impl PageFetcher {
    pub fn new(
        client: Arc<dyn PageClient>,
        identities: Arc<dyn IdentityPicker>,
        log: Arc<dyn LogSink>,
        backoff: Backoff,
        max_attempts: Option<u32>,
    ) -> Self {
        Self {
            client,
            identities,
            log,
            backoff,
            max_attempts,
        }
    }

    /// Fetches a page and extracts its records. A malformed payload counts as a failed attempt.
    pub async fn fetch(&self, page: u32) -> PageOutcome {
        match self.attempt_until_done(page, parse_records).await {
            Attempted::Done { value, failures } => PageOutcome::Fetched {
                page,
                records: value,
                failures,
            },
            Attempted::Abandoned {
                attempts,
                last_error,
            } => PageOutcome::Abandoned {
                page,
                attempts,
                last_error,
            },
        }
    }

    /// Fetches the raw body of a page. Only transport level failures are retried.
    pub(crate) async fn fetch_body(&self, page: u32) -> Attempted<Value> {
        self.attempt_until_done(page, Ok).await
    }

    async fn attempt_until_done<T, F>(&self, page: u32, extract: F) -> Attempted<T>
    where
        F: Fn(Value) -> Result<T>,
    {
        let mut state = RetryState::new(self.max_attempts);
        loop {
            let identity = self.identities.pick();
            let err = match self.client.get_page(page, &identity).await.and_then(&extract) {
                Ok(value) => {
                    return Attempted::Done {
                        value,
                        failures: state.failures(),
                    }
                }
                Err(e) => e,
            };

            match state.on_failure(&self.backoff) {
                RetryDecision::Retry(wait) => {
                    info_time!(
                        self.log,
                        "Error on page {} with proxy {}: {}. Retrying in {:.1}s (attempt {})",
                        page,
                        identity.proxy_label(),
                        err,
                        wait.as_secs_f64(),
                        state.failures()
                    );
                    tokio::time::sleep(wait).await;
                }
                RetryDecision::GiveUp => {
                    info_time!(
                        self.log,
                        "Error on page {} with proxy {}: {}. Giving up after {} attempts",
                        page,
                        identity.proxy_label(),
                        err,
                        state.failures()
                    );
                    return Attempted::Abandoned {
                        attempts: state.failures(),
                        last_error: err.to_string(),
                    };
                }
            }
        }
    }
}
