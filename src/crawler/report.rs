use chrono::{DateTime, Utc};

/// How a single detail visit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    /// Metadata was extracted and stored in the result set
    Collected,

    /// The URL is not a token detail page
    NotTokenPage,

    /// The page was fetched but a field could not be extracted
    ExtractFailed,

    /// The page could not be fetched, retries included
    FetchFailed,

    /// The task was cancelled by the global crawl timeout
    Aborted,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Listing pages in the order they were visited
    pub pages_visited: Vec<u32>,

    /// Authoritative page count
    pub total_pages: u32,

    /// Listing pages whose fetch failed terminally
    pub listing_failures: usize,

    /// Unique detail links scheduled
    pub links_discovered: usize,

    /// Tokens in the persisted result set
    pub tokens_collected: usize,

    pub not_token_pages: usize,
    pub extract_failures: usize,
    pub fetch_failures: usize,
    pub aborted: usize,

    /// The global crawl timeout expired before the crawl finished
    pub timed_out: bool,
}

impl CrawlReport {
    pub(crate) fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            pages_visited: Vec::new(),
            total_pages: 0,
            listing_failures: 0,
            links_discovered: 0,
            tokens_collected: 0,
            not_token_pages: 0,
            extract_failures: 0,
            fetch_failures: 0,
            aborted: 0,
            timed_out: false,
        }
    }

    pub(crate) fn record_outcome(&mut self, outcome: DetailOutcome) {
        match outcome {
            DetailOutcome::Collected => {}
            DetailOutcome::NotTokenPage => self.not_token_pages += 1,
            DetailOutcome::ExtractFailed => self.extract_failures += 1,
            DetailOutcome::FetchFailed => self.fetch_failures += 1,
            DetailOutcome::Aborted => self.aborted += 1,
        }
    }

    /// Detail visits that did not produce a token
    pub fn failed_details(&self) -> usize {
        self.extract_failures + self.fetch_failures + self.aborted
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Logs the run summary at info level
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl finished in {}s: {}/{} listing pages, {} links, {} tokens collected",
            self.duration().num_seconds(),
            self.pages_visited.len(),
            self.total_pages,
            self.links_discovered,
            self.tokens_collected
        );

        if self.failed_details() > 0 || self.listing_failures > 0 {
            tracing::info!(
                "Failures: {} listing, {} fetch, {} extract, {} aborted",
                self.listing_failures,
                self.fetch_failures,
                self.extract_failures,
                self.aborted
            );
        }

        if self.timed_out {
            tracing::warn!("Crawl stopped early by the global timeout");
        }
    }
}
