use super::DomainFilter;
use crate::adapters::http::random_user_agent;
use crate::domain::model::{Market, Markets};
use crate::domain::ports::ResultsSource;
use crate::utils::error::{Result, ScanError};
use crate::utils::throttle::Throttle;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// 依序嘗試的結果連結選擇器（Google 版面常變動）
const STRUCTURAL_SELECTORS: &[&str] = &[
    "div.yuRUbf > a",
    "a[jsname=\"UWckNb\"]",
    "div.g a[href^=\"http\"]",
    "div#search a[href^=\"http\"]",
];

fn structural_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        STRUCTURAL_SELECTORS
            .iter()
            .map(|css| Selector::parse(css).unwrap())
            .collect()
    })
}

fn any_link_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap())
}

/// Google 的 `/url?q=<target>` 轉址連結還原成目標網址
fn resolve_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("/url?") {
        let base = Url::parse("https://www.google.com").ok()?;
        let redirect = base.join(href).ok()?;
        return redirect
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned());
    }
    Some(href.to_string())
}

/// 從搜尋結果頁抽出前 `top_n` 個自然結果網址
pub fn extract_result_urls(html: &str, filter: &DomainFilter, top_n: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls: Vec<String> = Vec::new();

    for selector in structural_selectors() {
        for element in document.select(selector) {
            let Some(href) = element.value().attr("href").and_then(resolve_href) else {
                continue;
            };
            if href.starts_with("http") && !filter.is_excluded(&href) && !urls.contains(&href) {
                urls.push(href);
                // 多抓一些，後面可能還會被截斷
                if urls.len() >= top_n * 2 {
                    break;
                }
            }
        }

        if urls.len() >= top_n {
            break;
        }
    }

    if urls.is_empty() {
        tracing::warn!("Standard selectors failed, trying alternative extraction");
        let candidates = document
            .select(any_link_selector())
            .filter_map(|element| element.value().attr("href").and_then(resolve_href));
        urls = filter.collect(candidates, top_n);
    }

    urls.truncate(top_n);
    urls
}

/// 免費來源：直接抓取搜尋結果頁
pub struct ScrapeSource {
    client: Client,
    markets: Markets,
    filter: DomainFilter,
    throttle: Throttle,
}

impl ScrapeSource {
    pub fn new(client: Client, markets: Markets, filter: DomainFilter) -> Self {
        Self {
            client,
            markets,
            filter,
            throttle: Throttle::none(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn build_search_url(&self, keyword: &str, market: Market, num_results: usize) -> Result<Url> {
        let profile = self.markets.profile(market);
        Url::parse_with_params(
            &profile.search_url,
            &[
                ("q", keyword),
                ("gl", profile.geo.as_str()),
                ("num", num_results.to_string().as_str()),
            ],
        )
        .map_err(|e| ScanError::InvalidConfigValueError {
            field: format!("markets.{}.search_url", market),
            value: profile.search_url.clone(),
            reason: e.to_string(),
        })
    }

    async fn fetch_results_page(&self, url: Url, market: Market) -> Result<String> {
        let language = &self.markets.profile(market).language;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, format!("{},en;q=0.9", language))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    async fn scrape(&self, keyword: &str, market: Market, n: usize) -> Result<Vec<String>> {
        let url = self.build_search_url(keyword, market, n * 2)?;

        self.throttle.wait().await;
        tracing::info!(
            "Fetching SERP for '{}' in {}",
            keyword,
            self.markets.profile(market).geo
        );

        let body = self.fetch_results_page(url, market).await?;
        Ok(extract_result_urls(&body, &self.filter, n))
    }
}

#[async_trait]
impl ResultsSource for ScrapeSource {
    fn name(&self) -> &'static str {
        "scraper"
    }

    async fn top_urls(&self, keyword: &str, market: Market, n: usize) -> Result<Vec<String>> {
        let geo = &self.markets.profile(market).geo;
        match self.scrape(keyword, market, n).await {
            Ok(urls) => {
                tracing::info!("Found {} URLs for '{}' in {}", urls.len(), keyword, geo);
                Ok(urls)
            }
            Err(e) => {
                tracing::error!("Request error for '{}' in {}: {}", keyword, geo, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfig;
    use httpmock::prelude::*;

    const SERP_PAGE: &str = r#"<html><body><div id="search">
<div class="g"><div class="yuRUbf"><a href="https://www.ilovepdf.com/pdf_to_excel"><h3>PDF to Excel</h3></a></div></div>
<div class="g"><div class="yuRUbf"><a href="https://support.google.com/websearch"><h3>Help</h3></a></div></div>
<div class="g"><div class="yuRUbf"><a href="https://smallpdf.com/pdf-to-excel"><h3>Smallpdf</h3></a></div></div>
<div class="g"><div class="yuRUbf"><a href="https://www.ilovepdf.com/pdf_to_excel"><h3>Duplicate</h3></a></div></div>
<div class="g"><div class="yuRUbf"><a href="https://www.adobe.com/acrobat/online/pdf-to-excel.html"><h3>Adobe</h3></a></div></div>
<div class="g"><div class="yuRUbf"><a href="https://pdftables.com/"><h3>PDFTables</h3></a></div></div>
</div></body></html>"#;

    const BASIC_HTML_PAGE: &str = r#"<html><body>
<a href="/search?q=next">Next</a>
<a href="https://accounts.google.com/ServiceLogin">Sign in</a>
<a href="/url?q=https://www.conversor.com.br/pdf-para-excel&amp;sa=U&amp;ved=2ah">Conversor</a>
<a href="https://www.youtube.com/watch?v=abc">Video</a>
<a href="https://www.sodapdf.com/pt/pdf-para-excel/">Soda</a>
</body></html>"#;

    fn filter() -> DomainFilter {
        DomainFilter::new(ScannerConfig::default().serp.skip_domains)
    }

    fn source_for(server: &MockServer) -> ScrapeSource {
        let mut markets = Markets::default();
        markets.home.search_url = server.url("/search");
        markets.target.search_url = server.url("/br/search");
        ScrapeSource::new(Client::new(), markets, filter())
    }

    #[test]
    fn test_extract_uses_structural_selectors_in_rank_order() {
        let urls = extract_result_urls(SERP_PAGE, &filter(), 3);
        assert_eq!(
            urls,
            vec![
                "https://www.ilovepdf.com/pdf_to_excel",
                "https://smallpdf.com/pdf-to-excel",
                "https://www.adobe.com/acrobat/online/pdf-to-excel.html",
            ]
        );
    }

    #[test]
    fn test_extract_falls_back_to_any_external_link() {
        let urls = extract_result_urls(BASIC_HTML_PAGE, &filter(), 3);
        assert_eq!(
            urls,
            vec![
                "https://www.conversor.com.br/pdf-para-excel",
                "https://www.sodapdf.com/pt/pdf-para-excel/",
            ]
        );
    }

    #[test]
    fn test_extract_empty_page() {
        assert!(extract_result_urls("<html></html>", &filter(), 3).is_empty());
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(
            resolve_href("/url?q=https://example.com/a%20b&sa=U").as_deref(),
            Some("https://example.com/a b")
        );
        assert_eq!(resolve_href("https://x.com").as_deref(), Some("https://x.com"));
    }

    #[test]
    fn test_build_search_url_is_market_specific() {
        let source = ScrapeSource::new(Client::new(), Markets::default(), filter());

        let url = source
            .build_search_url("pdf para excel", Market::Target, 6)
            .unwrap();
        assert_eq!(url.host_str(), Some("www.google.com.br"));
        assert_eq!(url.query(), Some("q=pdf+para+excel&gl=BR&num=6"));
    }

    #[tokio::test]
    async fn test_top_urls_fetches_with_user_agent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .query_param("q", "pdf to excel")
                    .query_param("gl", "US")
                    .query_param("num", "4")
                    .header_exists("user-agent");
                then.status(200)
                    .header("Content-Type", "text/html")
                    .body(SERP_PAGE);
            })
            .await;

        let urls = source_for(&server)
            .top_urls("pdf to excel", Market::Home, 2)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            urls,
            vec![
                "https://www.ilovepdf.com/pdf_to_excel",
                "https://smallpdf.com/pdf-to-excel"
            ]
        );
    }

    #[tokio::test]
    async fn test_blocked_request_yields_empty_list() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/br/search");
                then.status(429);
            })
            .await;

        let urls = source_for(&server)
            .top_urls("pdf para excel", Market::Target, 3)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_urls_for_both_markets() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200).body(SERP_PAGE);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/br/search");
                then.status(200).body(BASIC_HTML_PAGE);
            })
            .await;

        let pair = source_for(&server)
            .urls_for_both_markets("pdf to excel", "pdf para excel", 1)
            .await
            .unwrap();

        assert_eq!(pair.home, vec!["https://www.ilovepdf.com/pdf_to_excel"]);
        assert_eq!(pair.target, vec!["https://www.conversor.com.br/pdf-para-excel"]);
    }
}
