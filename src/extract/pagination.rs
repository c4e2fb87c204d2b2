use super::first_text;
use scraper::{Html, Selector};
use thiserror::Error;

/// The pagination widget text was not a usable page count
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageCountParseError {
    #[error("pagination text is empty")]
    Empty,

    #[error("pagination text '{0}' is not a number")]
    NotANumber(String),

    #[error("pagination reports zero pages")]
    Zero,
}

/// Parses the pagination widget text into a page count
///
/// Surrounding whitespace and thousands separators are accepted.
///
/// # Examples
///
/// ```
/// use token_sifter::extract::parse_page_count;
///
/// assert_eq!(parse_page_count(" 10 "), Ok(10));
/// assert_eq!(parse_page_count("1,234"), Ok(1234));
/// assert!(parse_page_count("abc").is_err());
/// ```
pub fn parse_page_count(text: &str) -> Result<u32, PageCountParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PageCountParseError::Empty);
    }

    let digits: String = trimmed.chars().filter(|&c| c != ',').collect();
    let count: u32 = digits
        .parse()
        .map_err(|_| PageCountParseError::NotANumber(trimmed.to_string()))?;

    if count == 0 {
        return Err(PageCountParseError::Zero);
    }

    Ok(count)
}

/// Extracts the total number of listing pages from a listing page
///
/// A missing or malformed pagination widget must not abort collection from
/// the page that was already fetched, so any failure degrades to a single page.
pub fn extract_page_count(document: &Html, selector: &Selector) -> u32 {
    let text = first_text(document, selector).unwrap_or_default();

    match parse_page_count(&text) {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Could not read page count ({}), assuming 1 page", e);
            1
        }
    }
}
