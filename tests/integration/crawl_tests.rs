//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a fake token listing and test the full
//! crawl cycle end-to-end, from listing page 1 to the persisted document.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use token_sifter::config::{Config, CrawlerConfig};
use token_sifter::state::TokenMap;
use token_sifter::storage::{MetadataStore, PersistResult};
use token_sifter::{run_crawl, Coordinator, JsonFileStore, SifterError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, metadata_path: &Path) -> Config {
    let mut config = Config::default();
    config.crawler = CrawlerConfig {
        parallelism: 1,
        delay_ms: 0,
        random_delay_ms: 0,
        domain_glob: "127.0.0.1".to_string(),
        request_timeout_secs: 5,
        max_retries: 0,
        retry_backoff_ms: 10,
        crawl_timeout_secs: 60,
        scrape_period_secs: 3600,
    };
    config.target.listing_url = format!("{}/tokens", server_uri);
    config.output.metadata_path = metadata_path.to_string_lossy().into_owned();
    config
}

fn address(n: u32) -> String {
    format!("0x{:040x}", n)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// A listing page in the layout the default selectors expect
fn listing_page(page_count: &str, hrefs: &[String]) -> String {
    let rows: String = hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            format!(
                r#"<tr><td>{}</td><td><img src="/logo.png"></td><td><a href="{}">Token {}</a></td><td>$1.00</td></tr>"#,
                i + 1,
                href,
                i
            )
        })
        .collect();

    format!(
        r#"<html><body>
        <div class="row"><div class="col-sm-6"><span>Page <b>1</b> of <b>{}</b></span></div></div>
        <div id="ContentPlaceHolder1_divresult"><table>
            <thead><tr><th>#</th><th></th><th>Token</th><th>Price</th></tr></thead>
            <tbody>{}</tbody>
        </table></div>
        </body></html>"#,
        page_count, rows
    )
}

/// A token detail page in the layout the default selectors expect
fn detail_page(name: &str, supply: &str, contract: &str) -> String {
    format!(
        r#"<html><body>
        <div class="breadcrumbs"><span id="address">{}</span></div>
        <div id="ContentPlaceHolder1_divSummary"><table><tbody>
            <tr><td>Total Supply:</td><td class="tditem">{}</td></tr>
            <tr><td>Holders:</td><td class="tditem">1,234</td></tr>
        </tbody></table></div>
        <table><tbody>
            <tr id="ContentPlaceHolder1_trContract"><td>Contract:</td>
                <td class="tditem"><a href="/address/{}">{}</a></td></tr>
        </tbody></table>
        </body></html>"#,
        name, supply, contract, contract
    )
}

fn token_href(contract: &str) -> String {
    format!("/token/{}", contract)
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/tokens"))
        .and(query_param("p", page.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Page numbers of the listing requests, in the order they were received
async fn listing_requests(server: &MockServer) -> Vec<u32> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .filter(|r| r.url.path() == "/tokens")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "p")
                .and_then(|(_, v)| v.parse().ok())
        })
        .collect()
}

fn load_document(path: &Path) -> TokenMap {
    JsonFileStore::new(path).load().expect("metadata document")
}

/// Counts saves and remembers how many tokens the last one carried
#[derive(Clone, Default)]
struct CountingStore {
    saves: Arc<AtomicUsize>,
    last_len: Arc<AtomicUsize>,
}

impl MetadataStore for CountingStore {
    fn save(&mut self, tokens: &TokenMap) -> PersistResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.last_len.store(tokens.len(), Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "counting store".to_string()
    }
}

#[tokio::test]
async fn test_crawls_every_listing_page_in_order() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    for page in 1..=10 {
        let contract = address(page);
        mount_listing(&server, page, listing_page("10", &[token_href(&contract)])).await;
        mount_detail(
            &server,
            &token_href(&contract),
            detail_page(&format!("Token {}", page), &format!("1,000 T{}", page), &contract),
        )
        .await;
    }

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    let expected: Vec<u32> = (1..=10).collect();
    assert_eq!(report.pages_visited, expected);
    assert_eq!(report.total_pages, 10);
    assert_eq!(listing_requests(&server).await, expected);
    assert_eq!(report.tokens_collected, 10);

    let document = load_document(&output);
    assert_eq!(document.len(), 10);
    let fifth = &document[&address(5)];
    assert_eq!(fifth.name(), "Token 5");
    assert_eq!(fifth.symbol(), "T5");
}

#[tokio::test]
async fn test_degraded_pagination_crawls_single_page() {
    for pagination in ["", "abc"] {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tokenMetadata.json");

        let contracts = [address(1), address(2)];
        let hrefs: Vec<String> = contracts.iter().map(|c| token_href(c)).collect();
        mount_listing(&server, 1, listing_page(pagination, &hrefs)).await;
        for contract in &contracts {
            mount_detail(&server, &token_href(contract), detail_page("T", "1 T", contract)).await;
        }

        let report = run_crawl(create_test_config(&server.uri(), &output))
            .await
            .expect("Crawl failed");

        assert_eq!(report.pages_visited, vec![1], "pagination {:?}", pagination);
        assert_eq!(report.total_pages, 1);
        assert_eq!(listing_requests(&server).await, vec![1]);
        assert_eq!(load_document(&output).len(), 2);
    }
}

#[tokio::test]
async fn test_failed_detail_page_does_not_stop_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    let (a, b, c) = (address(0xa), address(0xb), address(0xc));
    mount_listing(
        &server,
        1,
        listing_page("1", &[token_href(&a), token_href(&b), token_href(&c)]),
    )
    .await;
    mount_detail(&server, &token_href(&a), detail_page("Alpha", "10 AAA", &a)).await;
    // B is not mounted and answers 404
    mount_detail(&server, &token_href(&c), detail_page("Gamma", "30 CCC", &c)).await;

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.tokens_collected, 2);

    let document = load_document(&output);
    assert!(document.contains_key(&a));
    assert!(!document.contains_key(&b));
    assert!(document.contains_key(&c));
}

#[tokio::test]
async fn test_supply_without_symbol_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    let (good, bad) = (address(1), address(2));
    mount_listing(
        &server,
        1,
        listing_page("1", &[token_href(&good), token_href(&bad)]),
    )
    .await;
    mount_detail(&server, &token_href(&good), detail_page("Good", "1,000,000 ABC", &good)).await;
    mount_detail(&server, &token_href(&bad), detail_page("Bad", "1,000,000", &bad)).await;

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.extract_failures, 1);

    let document = load_document(&output);
    assert_eq!(document.len(), 1);
    assert_eq!(document[&good].symbol(), "ABC");
    assert!(!document.contains_key(&bad));
}

#[tokio::test]
async fn test_addresses_differing_in_case_collapse() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    let lower = "0xabcdef0000000000000000000000000000000001";
    let upper = "0xABCDEF0000000000000000000000000000000001";
    mount_listing(
        &server,
        1,
        listing_page("1", &["/token/first".to_string(), "/token/second".to_string()]),
    )
    .await;
    mount_detail(&server, "/token/first", detail_page("Token", "5 TOK", lower)).await;
    mount_detail(&server, "/token/second", detail_page("Token", "5 TOK", upper)).await;

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.links_discovered, 2);
    let document = load_document(&output);
    assert_eq!(document.len(), 1);
    assert_eq!(document[lower].contract_address(), lower);
}

#[tokio::test]
async fn test_duplicate_links_are_visited_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    let contract = address(7);
    let href = token_href(&contract);
    mount_listing(&server, 1, listing_page("2", &[href.clone()])).await;
    // same token again, with a fragment and a tracking parameter
    mount_listing(
        &server,
        2,
        listing_page("2", &[format!("{}?utm_source=list#top", href)]),
    )
    .await;
    mount_detail(&server, &href, detail_page("Seven", "7 SVN", &contract)).await;

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.links_discovered, 1);
    let detail_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == href)
        .count();
    assert_eq!(detail_requests, 1);
}

#[tokio::test]
async fn test_non_token_links_are_ignored() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    let contract = address(3);
    mount_listing(
        &server,
        1,
        listing_page("1", &[format!("/address/{}", contract), token_href(&contract)]),
    )
    .await;
    mount_detail(
        &server,
        &format!("/address/{}", contract),
        "<html><body>An account page</body></html>".to_string(),
    )
    .await;
    mount_detail(&server, &token_href(&contract), detail_page("Three", "3 THR", &contract)).await;

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.not_token_pages, 1);
    assert_eq!(report.extract_failures, 0);
    assert_eq!(load_document(&output).len(), 1);
}

#[tokio::test]
async fn test_failed_listing_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    for page in [1, 3] {
        let contract = address(page);
        mount_listing(&server, page, listing_page("3", &[token_href(&contract)])).await;
        mount_detail(&server, &token_href(&contract), detail_page("T", "1 T", &contract)).await;
    }
    // listing page 2 answers 404

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_visited, vec![1, 2, 3]);
    assert_eq!(report.listing_failures, 1);
    assert_eq!(load_document(&output).len(), 2);
}

#[tokio::test]
async fn test_unreachable_first_page_writes_empty_document() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tokenMetadata.json");

    let report = run_crawl(create_test_config(&server.uri(), &output))
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_visited, vec![1]);
    assert_eq!(report.total_pages, 1);
    assert!(load_document(&output).is_empty());
}

#[tokio::test]
async fn test_persists_once_after_all_detail_visits() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let contracts: Vec<String> = (1..=3).map(address).collect();
    let hrefs: Vec<String> = contracts.iter().map(|c| token_href(c)).collect();
    mount_listing(&server, 1, listing_page("1", &hrefs)).await;
    for contract in &contracts {
        Mock::given(method("GET"))
            .and(path(token_href(contract)))
            .respond_with(
                html(detail_page("Slow", "1 SLW", contract)).set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server.uri(), &dir.path().join("unused.json"));
    config.crawler.parallelism = 3;
    let store = CountingStore::default();
    let mut coordinator =
        Coordinator::new(config, Box::new(store.clone())).expect("Failed to create coordinator");

    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    assert_eq!(store.last_len.load(Ordering::SeqCst), 3);
    assert_eq!(report.tokens_collected, 3);
    assert_eq!(coordinator.results().len(), 3);
    // nothing written to the configured path when a custom store is used
    assert!(!dir.path().join("unused.json").exists());
}

#[tokio::test]
async fn test_persist_failure_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let contract = address(1);
    mount_listing(&server, 1, listing_page("1", &[token_href(&contract)])).await;
    mount_detail(&server, &token_href(&contract), detail_page("One", "1 ONE", &contract)).await;

    // the output's parent directory is a regular file
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let result = run_crawl(create_test_config(&server.uri(), &blocker.join("tokens.json"))).await;

    assert!(matches!(result, Err(SifterError::Persist(_))));
}
