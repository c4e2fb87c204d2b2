use url::Url;

/// Query parameters that never change which page is served
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Normalizes a discovered link into the key used to deduplicate visits
///
/// # Normalization Steps
///
/// 1. Remove fragment (everything after #)
/// 2. Collapse repeated slashes and drop a trailing slash (except for root /)
/// 3. Remove tracking query parameters (`utm_*` and a fixed list)
/// 4. Sort remaining query parameters alphabetically
/// 5. Remove empty query string (trailing ?)
///
/// The scheme, host and port are left as they are: `Url` already lowercases the
/// host and resolves dot segments when parsing.
///
/// # Examples
///
/// ```
/// use token_sifter::url::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("https://etherscan.io/token/0xAbC/?utm_source=x#holders").unwrap();
/// assert_eq!(normalize_url(&url).as_str(), "https://etherscan.io/token/0xAbC");
/// ```
pub fn normalize_url(url: &Url) -> Url {
    let mut url = url.clone();

    url.set_fragment(None);

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    url
}

/// Collapses empty segments and removes the trailing slash
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
