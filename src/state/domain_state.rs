use std::time::Duration;
use tokio::time::Instant;

/// Tracks the politeness state of a throttled domain
///
/// The scheduler keeps one `DomainState` per domain matching the politeness
/// rule. The gap between requests is measured from the moment the previous
/// request released its slot, not from when it started.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests started against this domain in the current crawl
    pub request_count: u32,

    /// When the most recent request to this domain finished
    pub last_release: Option<Instant>,

    /// The domain answered HTTP 429; no request before this instant
    pub rate_limited_until: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was started
    pub fn record_request(&mut self) {
        self.request_count += 1;
    }

    /// Records that a request finished and released its slot
    pub fn record_release(&mut self, now: Instant) {
        self.last_release = Some(now);
    }

    /// Pauses the domain until `until`, keeping the later of two pauses
    pub fn mark_rate_limited(&mut self, until: Instant) {
        self.rate_limited_until = Some(match self.rate_limited_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }

    /// Returns true if the domain is paused after an HTTP 429
    pub fn is_rate_limited(&self, now: Instant) -> bool {
        self.rate_limited_until.is_some_and(|until| until > now)
    }

    /// Calculates how long to wait before the next request may start
    ///
    /// `gap` is the delay required after the previous release. Returns None if a
    /// request can be made now.
    pub fn time_until_next_request(&self, gap: Duration, now: Instant) -> Option<Duration> {
        let after_gap = self.last_release.map(|last| last + gap);
        let ready_at = match (after_gap, self.rate_limited_until) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }?;

        (ready_at > now).then(|| ready_at - now)
    }
}
