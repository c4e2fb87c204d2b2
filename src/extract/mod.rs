//! Extractors turning fetched pages into crawl data
//!
//! All extractors are pure, synchronous functions over a parsed
//! [`scraper::Html`] document:
//! - `pagination`: total listing page count
//! - `links`: detail-page links of a listing page
//! - `metadata`: `TokenMetadata` of a detail page

mod links;
mod metadata;
mod pagination;

pub use links::extract_detail_links;
pub use metadata::{extract_metadata, parse_symbol};
pub use pagination::{extract_page_count, parse_page_count, PageCountParseError};

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use thiserror::Error;

/// A detail-page field the extractor looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Name,
    Symbol,
    ContractAddress,
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Symbol => "symbol",
            Self::ContractAddress => "contract address",
        };
        write!(f, "{}", name)
    }
}

/// A field could not be located on an otherwise successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not extract {field} from {url}")]
pub struct ExtractError {
    pub field: MetadataField,
    pub url: String,
}

/// Selectors from [`SelectorConfig`], parsed once per crawl
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub page_count: Selector,
    pub token_cell: Selector,
    pub token_link: Selector,
    pub name: Selector,
    pub supply: Selector,
    pub contract: Selector,
}

impl CompiledSelectors {
    /// Parses every configured selector, naming the first one that fails
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            page_count: compile_one("page-count", &config.page_count)?,
            token_cell: compile_one("token-cell", &config.token_cell)?,
            token_link: compile_one("token-link", &config.token_link)?,
            name: compile_one("name", &config.name)?,
            supply: compile_one("supply", &config.supply)?,
            contract: compile_one("contract", &config.contract)?,
        })
    }
}

fn compile_one(name: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        name,
        selector: selector.to_string(),
    })
}

/// Returns the trimmed text of the first element matching `selector`
///
/// Empty text counts as "not found".
pub(crate) fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
