use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host portion of the URL, without the port. The
/// scheduler keys its per-domain politeness state on this value.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use token_sifter::url::extract_domain;
///
/// let url = Url::parse("https://EtherScan.io/tokens?p=2").unwrap();
/// assert_eq!(extract_domain(&url), Some("etherscan.io".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
