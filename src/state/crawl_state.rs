//! Crawl lifecycle tracking
//!
//! This module defines the phases of a crawl run, the bookkeeping needed to
//! decide when a crawl is complete, and the one-shot page-count signal.

use crate::SifterError;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Result set empty, no requests issued
    Init,

    /// Listing page 1 is being fetched to learn the page count
    DiscoveringPageCount,

    /// Listing pages 2..=total are being fetched in order
    Crawling,

    /// All listing pages are done, waiting for outstanding detail visits
    Draining,

    /// Terminal; the result set may be persisted
    Done,
}

impl CrawlPhase {
    /// Returns the only phase this phase may advance to
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::DiscoveringPageCount),
            Self::DiscoveringPageCount => Some(Self::Crawling),
            Self::Crawling => Some(Self::Draining),
            Self::Draining => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::DiscoveringPageCount => "discovering_page_count",
            Self::Crawling => "crawling",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First-value-wins holder for the total listing page count
///
/// The pagination widget appears on every listing page, so the page count is
/// offered once per listing response. Only the first offer is kept.
#[derive(Debug, Default)]
pub struct PageCountSignal {
    value: OnceLock<u32>,
}

impl PageCountSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a page count; returns true if this offer became authoritative
    pub fn offer(&self, pages: u32) -> bool {
        let accepted = self.value.set(pages).is_ok();
        if !accepted {
            tracing::trace!(
                "Ignoring page count {} (already resolved to {:?})",
                pages,
                self.value.get()
            );
        }
        accepted
    }

    /// The authoritative page count, if one has been offered
    pub fn get(&self) -> Option<u32> {
        self.value.get().copied()
    }
}

/// Bookkeeping for one crawl run
#[derive(Debug)]
pub struct CrawlState {
    phase: CrawlPhase,
    page_count: PageCountSignal,

    /// Listing pages in the order they were visited
    pages_visited: Vec<u32>,

    /// Normalized detail URLs that already have a task
    detail_seen: HashSet<String>,

    detail_in_flight: usize,
    detail_finished: usize,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            phase: CrawlPhase::Init,
            page_count: PageCountSignal::new(),
            pages_visited: Vec::new(),
            detail_seen: HashSet::new(),
            detail_in_flight: 0,
            detail_finished: 0,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Advances to `to`, which must be the successor of the current phase
    pub fn transition(&mut self, to: CrawlPhase) -> Result<(), SifterError> {
        if self.phase.next() != Some(to) {
            return Err(SifterError::InvalidTransition {
                from: self.phase,
                to,
            });
        }

        tracing::debug!("Crawl phase {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    pub fn page_count(&self) -> &PageCountSignal {
        &self.page_count
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.page_count.get()
    }

    /// Records a listing page visit (successful or terminally failed)
    pub fn record_listing_page(&mut self, page: u32) {
        self.pages_visited.push(page);
    }

    pub fn pages_visited(&self) -> &[u32] {
        &self.pages_visited
    }

    /// Registers a detail URL; returns false if it was already scheduled
    pub fn claim_detail(&mut self, key: String) -> bool {
        if !self.detail_seen.insert(key) {
            return false;
        }
        self.detail_in_flight += 1;
        true
    }

    /// Records that a detail task reached a terminal outcome
    pub fn finish_detail(&mut self) {
        self.detail_in_flight = self.detail_in_flight.saturating_sub(1);
        self.detail_finished += 1;
    }

    pub fn detail_discovered(&self) -> usize {
        self.detail_seen.len()
    }

    pub fn detail_in_flight(&self) -> usize {
        self.detail_in_flight
    }

    pub fn detail_finished(&self) -> usize {
        self.detail_finished
    }

    /// Returns true once the page count is known, every listing page
    /// 1..=total has been visited, and no detail visit is outstanding
    pub fn is_complete(&self) -> bool {
        let Some(total) = self.total_pages() else {
            return false;
        };

        (1..=total).all(|page| self.pages_visited.contains(&page)) && self.detail_in_flight == 0
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut state = CrawlState::new();
        assert_eq!(state.phase(), CrawlPhase::Init);

        for phase in [
            CrawlPhase::DiscoveringPageCount,
            CrawlPhase::Crawling,
            CrawlPhase::Draining,
            CrawlPhase::Done,
        ] {
            state.transition(phase).unwrap();
            assert_eq!(state.phase(), phase);
        }

        assert!(state.phase().is_terminal());
        assert_eq!(state.phase().next(), None);
    }

    #[test]
    fn test_skipping_a_phase_is_rejected() {
        let mut state = CrawlState::new();
        let err = state.transition(CrawlPhase::Crawling).unwrap_err();

        assert!(matches!(
            err,
            SifterError::InvalidTransition {
                from: CrawlPhase::Init,
                to: CrawlPhase::Crawling
            }
        ));
        assert_eq!(state.phase(), CrawlPhase::Init);
    }

    #[test]
    fn test_going_back_is_rejected() {
        let mut state = CrawlState::new();
        state.transition(CrawlPhase::DiscoveringPageCount).unwrap();
        assert!(state.transition(CrawlPhase::Init).is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(CrawlPhase::DiscoveringPageCount.to_string(), "discovering_page_count");
        assert_eq!(CrawlPhase::Done.to_string(), "done");
    }

    #[test]
    fn test_page_count_first_offer_wins() {
        let signal = PageCountSignal::new();
        assert_eq!(signal.get(), None);

        assert!(signal.offer(10));
        assert!(!signal.offer(1));
        assert!(!signal.offer(12));

        assert_eq!(signal.get(), Some(10));
    }

    #[test]
    fn test_claim_detail_deduplicates() {
        let mut state = CrawlState::new();

        assert!(state.claim_detail("https://etherscan.io/token/0xa".to_string()));
        assert!(!state.claim_detail("https://etherscan.io/token/0xa".to_string()));
        assert!(state.claim_detail("https://etherscan.io/token/0xb".to_string()));

        assert_eq!(state.detail_discovered(), 2);
        assert_eq!(state.detail_in_flight(), 2);
    }

    #[test]
    fn test_incomplete_until_page_count_known() {
        let mut state = CrawlState::new();
        state.record_listing_page(1);
        assert!(!state.is_complete());

        state.page_count().offer(1);
        assert!(state.is_complete());
    }

    #[test]
    fn test_incomplete_with_missing_listing_page() {
        let mut state = CrawlState::new();
        state.page_count().offer(3);
        state.record_listing_page(1);
        state.record_listing_page(3);
        assert!(!state.is_complete());

        state.record_listing_page(2);
        assert!(state.is_complete());
    }

    #[test]
    fn test_incomplete_while_details_outstanding() {
        let mut state = CrawlState::new();
        state.page_count().offer(1);
        state.record_listing_page(1);
        state.claim_detail("a".to_string());
        state.claim_detail("b".to_string());
        assert!(!state.is_complete());

        state.finish_detail();
        assert!(!state.is_complete());

        state.finish_detail();
        assert!(state.is_complete());
        assert_eq!(state.detail_finished(), 2);
    }
}
