use scraper::{Html, Selector};
use url::Url;

/// Extracts the detail-page links of a listing page
///
/// For every token-name cell the first anchor matching `link_selector` is
/// resolved against `page_url`. Cells without an anchor, empty hrefs, and
/// hrefs that do not resolve to an HTTP(S) URL are skipped. Links are returned
/// in page order; deduplication is the coordinator's job.
///
/// # Example
///
/// ```
/// use scraper::{Html, Selector};
/// use token_sifter::extract::extract_detail_links;
/// use url::Url;
///
/// let html = r#"<table><tbody><tr><td>1</td><td>x</td><td><a href="/token/0xabc">ABC</a></td></tr></tbody></table>"#;
/// let doc = Html::parse_document(html);
/// let cell = Selector::parse("tbody tr td:nth-child(3)").unwrap();
/// let link = Selector::parse("a[href]").unwrap();
/// let page = Url::parse("https://etherscan.io/tokens?p=1").unwrap();
///
/// let links = extract_detail_links(&doc, &page, &cell, &link);
/// assert_eq!(links[0].as_str(), "https://etherscan.io/token/0xabc");
/// ```
pub fn extract_detail_links(
    document: &Html,
    page_url: &Url,
    cell_selector: &Selector,
    link_selector: &Selector,
) -> Vec<Url> {
    let mut links = Vec::new();

    for cell in document.select(cell_selector) {
        let href = match cell
            .select(link_selector)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
        {
            Some(href) => href.trim(),
            None => {
                tracing::trace!("Token cell without a link on {}", page_url);
                continue;
            }
        };

        match resolve_link(href, page_url) {
            Some(url) => links.push(url),
            None => tracing::debug!("Skipping unusable token link '{}' on {}", href, page_url),
        }
    }

    links
}

/// Resolves an href to an absolute HTTP(S) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
