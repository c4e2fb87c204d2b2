//! URL handling module for Token-Sifter
//!
//! This module provides listing-page URL construction, visit-key
//! normalization, domain extraction, domain glob matching for the politeness
//! rule, and the detail-page route allow-list.

mod domain;
mod matcher;
mod normalize;
mod route;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_glob;
pub use normalize::normalize_url;
pub use route::{RouteTable, RouteTemplate};

use url::Url;

/// Builds the URL of a 1-based listing page
///
/// Any existing value of `page_param` is replaced; other query parameters are
/// preserved.
///
/// # Examples
///
/// ```
/// use token_sifter::url::listing_page_url;
/// use url::Url;
///
/// let base = Url::parse("https://etherscan.io/tokens").unwrap();
/// assert_eq!(
///     listing_page_url(&base, "p", 3).as_str(),
///     "https://etherscan.io/tokens?p=3"
/// );
/// ```
pub fn listing_page_url(base: &Url, page_param: &str, page: u32) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != page_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(retained)
        .append_pair(page_param, &page.to_string());
    url
}
