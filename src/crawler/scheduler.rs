//! Request scheduling and rate limiting
//!
//! This module handles:
//! - Matching request domains against the politeness rule
//! - Per-domain concurrency limiting via semaphores
//! - Randomized delays between requests to a throttled domain
//! - Pausing a domain after it answers HTTP 429
//!
//! Waiters on a domain are served in FIFO order (tokio's semaphore is fair).

use crate::config::CrawlerConfig;
use crate::state::DomainState;
use crate::url::{extract_domain, matches_glob};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use url::Url;

/// Politeness rule applied to every domain matching `domain_glob`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitRule {
    pub domain_glob: String,
    pub parallelism: usize,
    pub delay: Duration,
    pub random_delay: Duration,
}

impl LimitRule {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            domain_glob: config.domain_glob.clone(),
            parallelism: config.parallelism.max(1) as usize,
            delay: Duration::from_millis(config.delay_ms),
            random_delay: Duration::from_millis(config.random_delay_ms),
        }
    }

    /// Returns true if requests to `domain` are throttled by this rule
    pub fn applies_to(&self, domain: &str) -> bool {
        matches_glob(&self.domain_glob, domain)
    }

    /// Draws the gap to keep after the previous request: `delay` plus a
    /// uniform sample from `[0, random_delay]`
    pub fn sample_gap(&self) -> Duration {
        let max_jitter = self.random_delay.as_millis() as u64;
        let jitter = if max_jitter == 0 {
            0
        } else {
            rand::rng().random_range(0..=max_jitter)
        };
        self.delay + Duration::from_millis(jitter)
    }
}

/// Slot for one request; dropping it frees the slot and starts the
/// domain's politeness gap
#[derive(Debug)]
pub struct RequestPermit {
    _permit: Option<OwnedSemaphorePermit>,
    state: Option<Arc<Mutex<DomainState>>>,
}

impl RequestPermit {
    fn unthrottled() -> Self {
        Self {
            _permit: None,
            state: None,
        }
    }

    /// Returns true if this request counts against a throttled domain
    pub fn is_throttled(&self) -> bool {
        self.state.is_some()
    }
}

impl Drop for RequestPermit {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            lock(state).record_release(Instant::now());
        }
    }
}

#[derive(Debug, Clone)]
struct DomainGate {
    permits: Arc<Semaphore>,
    state: Arc<Mutex<DomainState>>,
}

/// Scheduler hands out request slots per domain
///
/// The scheduler coordinates:
/// - Per-domain concurrency limits (`parallelism` requests in flight)
/// - Per-domain delays (randomized gap after each release)
/// - Per-domain pauses after HTTP 429
///
/// Domains that do not match the rule are never throttled.
#[derive(Debug)]
pub struct Scheduler {
    rule: LimitRule,
    gates: Mutex<HashMap<String, DomainGate>>,
}

impl Scheduler {
    pub fn new(rule: LimitRule) -> Self {
        Self {
            rule,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(LimitRule::from_config(config))
    }

    pub fn rule(&self) -> &LimitRule {
        &self.rule
    }

    /// Waits until a request to `url` may start
    ///
    /// This method:
    /// 1. Returns immediately for domains outside the rule
    /// 2. Waits for one of the domain's `parallelism` slots
    /// 3. Sleeps until the randomized gap since the last release has passed
    /// 4. Counts the request against the domain
    pub async fn acquire(&self, url: &Url) -> RequestPermit {
        let Some(domain) = extract_domain(url).filter(|d| self.rule.applies_to(d)) else {
            return RequestPermit::unthrottled();
        };

        let gate = self.gate(&domain);
        // the semaphore is never closed
        let permit = gate.permits.clone().acquire_owned().await.ok();

        let gap = self.rule.sample_gap();
        loop {
            let wait = lock(&gate.state).time_until_next_request(gap, Instant::now());
            match wait {
                Some(wait) => {
                    tracing::trace!("Waiting {:?} before next request to {}", wait, domain);
                    tokio::time::sleep(wait).await;
                }
                None => break,
            }
        }

        lock(&gate.state).record_request();

        RequestPermit {
            _permit: permit,
            state: Some(gate.state),
        }
    }

    /// Pauses a throttled domain for `cooldown` after it answered HTTP 429
    pub fn mark_rate_limited(&self, url: &Url, cooldown: Duration) {
        let Some(domain) = extract_domain(url).filter(|d| self.rule.applies_to(d)) else {
            return;
        };

        tracing::warn!("Rate limited by {}, pausing for {:?}", domain, cooldown);
        let gate = self.gate(&domain);
        lock(&gate.state).mark_rate_limited(Instant::now() + cooldown);
    }

    /// Snapshot of a domain's politeness state
    pub fn domain_state(&self, domain: &str) -> Option<DomainState> {
        let gates = lock(&self.gates);
        gates.get(domain).map(|gate| lock(&gate.state).clone())
    }

    fn gate(&self, domain: &str) -> DomainGate {
        let mut gates = lock(&self.gates);
        gates
            .entry(domain.to_string())
            .or_insert_with(|| DomainGate {
                permits: Arc::new(Semaphore::new(self.rule.parallelism)),
                state: Arc::new(Mutex::new(DomainState::new())),
            })
            .clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
