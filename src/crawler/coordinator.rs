//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives one crawl run through its phases:
//! - Fetching listing page 1 and resolving the page count
//! - Fetching listing pages 2..=total in order
//! - Spawning one task per unique detail link
//! - Joining every detail task, or aborting them when the crawl times out
//! - Persisting the result set exactly once

use crate::config::{Config, CrawlerConfig};
use crate::crawler::report::{CrawlReport, DetailOutcome};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::{build_http_client, fetch_page, is_rate_limited, FetchedPage};
use crate::extract::{
    extract_detail_links, extract_metadata, extract_page_count, CompiledSelectors, ExtractError,
};
use crate::state::{CrawlPhase, CrawlState, ResultSet};
use crate::storage::{open_store, MetadataStore};
use crate::token::TokenMetadata;
use crate::url::{listing_page_url, normalize_url, RouteTable};
use crate::{ConfigError, FetchError, SifterError};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use url::Url;

/// Everything a detail task needs, shared read-only across tasks
struct CrawlContext {
    client: Client,
    scheduler: Scheduler,
    crawler: CrawlerConfig,
    routes: RouteTable,
    selectors: CompiledSelectors,
    results: ResultSet,
}

/// What a listing page contributed to the crawl
#[derive(Debug)]
struct ListingScan {
    page_count: u32,
    links: Vec<Url>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    listing_url: Url,
    page_param: String,
    state: CrawlState,
    store: Box<dyn MetadataStore>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - Receives the result set once the crawl is complete
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SifterError)` - Invalid selectors, routes or listing URL, or the
    ///   HTTP client could not be built
    pub fn new(config: Config, store: Box<dyn MetadataStore>) -> Result<Self, SifterError> {
        let listing_url = Url::parse(&config.target.listing_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid listing_url '{}': {}",
                config.target.listing_url, e
            ))
        })?;
        let routes = RouteTable::from_templates(&config.target.detail_routes)?;
        let selectors = CompiledSelectors::compile(&config.selectors)?;
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let scheduler = Scheduler::from_config(&config.crawler);

        let context = CrawlContext {
            client,
            scheduler,
            crawler: config.crawler,
            routes,
            selectors,
            results: ResultSet::new(),
        };

        Ok(Self {
            context: Arc::new(context),
            listing_url,
            page_param: config.target.page_param,
            state: CrawlState::new(),
            store,
        })
    }

    /// Handle to the result set being filled by this crawl
    pub fn results(&self) -> ResultSet {
        self.context.results.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.state.phase()
    }

    /// Runs the crawl to completion and persists the result set
    ///
    /// A coordinator runs once; a second call fails with an invalid phase
    /// transition. Fetch and extraction failures are logged and counted in the
    /// report. Only a failure to persist is returned as an error.
    pub async fn run(&mut self) -> Result<CrawlReport, SifterError> {
        let mut report = CrawlReport::new(Utc::now());
        let mut tasks: JoinSet<DetailOutcome> = JoinSet::new();

        tracing::info!("Starting crawl of {}", self.listing_url);

        let finished = match self.context.crawler.crawl_timeout() {
            Some(limit) => {
                tokio::time::timeout(limit, self.crawl(&mut tasks, &mut report))
                    .await
                    .ok()
            }
            None => Some(self.crawl(&mut tasks, &mut report).await),
        };

        match finished {
            Some(result) => result?,
            None => {
                tracing::warn!(
                    "Crawl timeout reached, aborting {} outstanding detail visits",
                    tasks.len()
                );
                report.timed_out = true;
                self.advance_to(CrawlPhase::Draining)?;
                tasks.abort_all();
                self.drain(&mut tasks, &mut report).await;
            }
        }

        if !report.timed_out {
            debug_assert!(self.state.is_complete());
        }
        self.state.transition(CrawlPhase::Done)?;

        let snapshot = self.context.results.snapshot();
        tracing::info!(
            "Persisting {} tokens to {}",
            snapshot.len(),
            self.store.describe()
        );
        self.store.save(&snapshot)?;

        report.pages_visited = self.state.pages_visited().to_vec();
        report.total_pages = self.state.total_pages().unwrap_or(0);
        report.links_discovered = self.state.detail_discovered();
        report.tokens_collected = snapshot.len();
        report.finished_at = Utc::now();
        report.log_summary();

        Ok(report)
    }

    /// Listing phases followed by the join of every detail task
    async fn crawl(
        &mut self,
        tasks: &mut JoinSet<DetailOutcome>,
        report: &mut CrawlReport,
    ) -> Result<(), SifterError> {
        self.state.transition(CrawlPhase::DiscoveringPageCount)?;
        if !self.visit_listing_page(1, tasks, report).await {
            tracing::warn!("First listing page failed, assuming a single page");
            self.state.page_count().offer(1);
        }

        let total = self.state.total_pages().unwrap_or(1);
        tracing::info!("Listing has {} pages", total);

        self.state.transition(CrawlPhase::Crawling)?;
        for page in 2..=total {
            self.visit_listing_page(page, tasks, report).await;
            self.reap_finished(tasks, report);

            if page % 10 == 0 {
                tracing::info!(
                    "Progress: {}/{} listing pages, {} links discovered, {} tokens collected",
                    page,
                    total,
                    self.state.detail_discovered(),
                    self.context.results.len()
                );
            }
        }

        self.state.transition(CrawlPhase::Draining)?;
        tracing::debug!(
            "Waiting for {} outstanding detail visits",
            self.state.detail_in_flight()
        );
        self.drain(tasks, report).await;

        Ok(())
    }

    /// Fetches one listing page, offers its page count and spawns detail
    /// tasks for its links; returns false if the page could not be fetched
    async fn visit_listing_page(
        &mut self,
        page: u32,
        tasks: &mut JoinSet<DetailOutcome>,
        report: &mut CrawlReport,
    ) -> bool {
        let url = listing_page_url(&self.listing_url, &self.page_param, page);
        tracing::debug!("Visiting listing page {}: {}", page, url);

        let result = fetch_with_retry(&self.context, &url).await;
        self.state.record_listing_page(page);

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Skipping listing page {}: {}", page, e);
                report.listing_failures += 1;
                return false;
            }
        };

        let scan = scan_listing(&fetched, &self.context.selectors);
        self.state.page_count().offer(scan.page_count);

        tracing::debug!("Listing page {} has {} token links", page, scan.links.len());
        for link in scan.links {
            self.spawn_detail(link, tasks);
        }

        true
    }

    /// Spawns a detail task unless the link's normalized form was seen before
    fn spawn_detail(&mut self, link: Url, tasks: &mut JoinSet<DetailOutcome>) {
        let key = normalize_url(&link);
        if !self.state.claim_detail(key.to_string()) {
            tracing::trace!("Already scheduled: {}", link);
            return;
        }

        let context = Arc::clone(&self.context);
        tasks.spawn(async move { visit_detail(&context, &link).await });
    }

    /// Collects outcomes of tasks that already finished without waiting
    fn reap_finished(&mut self, tasks: &mut JoinSet<DetailOutcome>, report: &mut CrawlReport) {
        while let Some(joined) = tasks.try_join_next() {
            self.finish_detail(joined, report);
        }
    }

    async fn drain(&mut self, tasks: &mut JoinSet<DetailOutcome>, report: &mut CrawlReport) {
        while let Some(joined) = tasks.join_next().await {
            self.finish_detail(joined, report);
        }
    }

    fn finish_detail(
        &mut self,
        joined: Result<DetailOutcome, JoinError>,
        report: &mut CrawlReport,
    ) {
        let outcome = joined.unwrap_or_else(|e| {
            if !e.is_cancelled() {
                tracing::error!("Detail task failed: {}", e);
            }
            DetailOutcome::Aborted
        });

        self.state.finish_detail();
        report.record_outcome(outcome);
    }

    /// Steps through the remaining phases until `target` is reached
    fn advance_to(&mut self, target: CrawlPhase) -> Result<(), SifterError> {
        while self.state.phase() != target {
            let from = self.state.phase();
            let next = from
                .next()
                .ok_or(SifterError::InvalidTransition { from, to: target })?;
            self.state.transition(next)?;
        }
        Ok(())
    }
}

/// Fetches a URL through the scheduler, retrying transient failures
///
/// The wait before retry `n` (0-based) is `retry_backoff * 2^n`. A 429 also
/// pauses the whole domain for that long.
async fn fetch_with_retry(context: &CrawlContext, url: &Url) -> Result<FetchedPage, FetchError> {
    let max_retries = context.crawler.max_retries;
    let mut attempt = 0;

    loop {
        let result = {
            let _permit = context.scheduler.acquire(url).await;
            fetch_page(&context.client, url).await
        };

        let error = match result {
            Ok(page) => return Ok(page),
            Err(e) if e.is_transient() && attempt < max_retries => e,
            Err(e) => return Err(e),
        };

        let backoff = context
            .crawler
            .retry_backoff()
            .saturating_mul(2u32.saturating_pow(attempt));
        if is_rate_limited(&error) {
            context.scheduler.mark_rate_limited(url, backoff);
        }

        attempt += 1;
        tracing::debug!(
            "{} (retry {}/{} in {:?})",
            error,
            attempt,
            max_retries,
            backoff
        );
        tokio::time::sleep(backoff).await;
    }
}

/// Visits one detail page and stores its metadata
async fn visit_detail(context: &CrawlContext, url: &Url) -> DetailOutcome {
    let page = match fetch_with_retry(context, url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Giving up on detail page: {}", e);
            return DetailOutcome::FetchFailed;
        }
    };

    match scan_detail(&page, context) {
        Ok(Some(token)) => {
            tracing::info!(
                "Collected {} ({}) {}",
                token.name(),
                token.symbol(),
                token.contract_address()
            );
            context.results.insert(token);
            DetailOutcome::Collected
        }
        Ok(None) => {
            tracing::debug!("Not a token page: {}", page.url);
            DetailOutcome::NotTokenPage
        }
        Err(e) => {
            tracing::warn!("{}", e);
            DetailOutcome::ExtractFailed
        }
    }
}

// The parsed document is not Send; it must not outlive these helpers.

fn scan_listing(page: &FetchedPage, selectors: &CompiledSelectors) -> ListingScan {
    let document = page.document();
    ListingScan {
        page_count: extract_page_count(&document, &selectors.page_count),
        links: extract_detail_links(
            &document,
            &page.url,
            &selectors.token_cell,
            &selectors.token_link,
        ),
    }
}

fn scan_detail(
    page: &FetchedPage,
    context: &CrawlContext,
) -> Result<Option<TokenMetadata>, ExtractError> {
    let document = page.document();
    extract_metadata(&document, &page.url, &context.routes, &context.selectors)
}

/// Runs a complete crawl and writes the configured metadata file
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed and the result set was persisted
/// * `Err(SifterError)` - Setup or persistence failed
pub async fn run_crawl(config: Config) -> Result<CrawlReport, SifterError> {
    let store = open_store(&config);
    let mut coordinator = Coordinator::new(config, Box::new(store))?;
    coordinator.run().await
}
