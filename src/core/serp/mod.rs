pub mod scrape;
pub mod serpapi;

use crate::adapters::http::build_client;
use crate::config::ScannerConfig;
use crate::domain::ports::ResultsSource;
use crate::utils::error::Result;
use std::fmt;

pub use self::scrape::ScrapeSource;
pub use self::serpapi::SerpApiSource;

/// 排除搜尋引擎自家網域
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFilter {
    skip_domains: Vec<String>,
}

impl DomainFilter {
    pub fn new(skip_domains: Vec<String>) -> Self {
        Self { skip_domains }
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.skip_domains.iter().any(|domain| url.contains(domain.as_str()))
    }

    /// 只收 http(s) 網址，維持原本順序，去重後取前 `limit` 筆
    pub fn collect<I>(&self, candidates: I, limit: usize) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut urls: Vec<String> = Vec::new();
        for url in candidates {
            if urls.len() >= limit {
                break;
            }
            if url.starts_with("http") && !self.is_excluded(&url) && !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsBackend {
    SerpApi,
    Scraper,
}

impl fmt::Display for ResultsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsBackend::SerpApi => write!(f, "SerpAPI"),
            ResultsBackend::Scraper => write!(f, "free scraper"),
        }
    }
}

/// 付費來源需同時啟用且有金鑰，否則使用免費爬蟲
pub fn select_backend(config: &ScannerConfig) -> ResultsBackend {
    if config.serpapi_enabled() {
        ResultsBackend::SerpApi
    } else {
        ResultsBackend::Scraper
    }
}

pub fn select_results_source(config: &ScannerConfig) -> Result<(ResultsBackend, Box<dyn ResultsSource>)> {
    let backend = select_backend(config);
    let filter = DomainFilter::new(config.serp.skip_domains.clone());

    let source: Box<dyn ResultsSource> = match (backend, config.serpapi_key()) {
        (ResultsBackend::SerpApi, Some(api_key)) => {
            tracing::info!("🚀 Using SerpAPI for reliable SERP data");
            Box::new(SerpApiSource::new(
                build_client(config.http.serpapi_timeout())?,
                api_key,
                &config.endpoints.serpapi_url,
                config.markets.clone(),
                filter,
            ))
        }
        _ => {
            tracing::info!("🔧 Using free scraper (SerpAPI not configured)");
            Box::new(
                ScrapeSource::new(
                    build_client(config.http.request_timeout())?,
                    config.markets.clone(),
                    filter,
                )
                .with_throttle(config.rate_limits.serp()),
            )
        }
    };

    Ok((backend, source))
}
