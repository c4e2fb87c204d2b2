//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase` / `CrawlState`: the lifecycle of one crawl run and its completion condition
//! - `PageCountSignal`: first-value-wins total listing page count
//! - `ResultSet`: the shared contract address → metadata map
//! - `DomainState`: per-domain politeness bookkeeping for the scheduler

mod crawl_state;
mod domain_state;
mod result_set;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState, PageCountSignal};
pub use domain_state::DomainState;
pub use result_set::{ResultSet, TokenMap};
