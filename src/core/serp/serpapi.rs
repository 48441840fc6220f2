use super::DomainFilter;
use crate::domain::model::{AccountStatus, Market, Markets};
use crate::domain::ports::ResultsSource;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    plan_name: Option<String>,
    #[serde(default)]
    searches_per_month: u64,
    #[serde(default)]
    this_month_usage: u64,
    #[serde(default)]
    total_searches_left: u64,
}

/// 付費來源：SerpAPI 的 Google 引擎
pub struct SerpApiSource {
    client: Client,
    api_key: String,
    base_url: String,
    markets: Markets,
    filter: DomainFilter,
}

impl SerpApiSource {
    pub fn new(client: Client, api_key: &str, base_url: &str, markets: Markets, filter: DomainFilter) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            markets,
            filter,
        }
    }

    async fn search(&self, keyword: &str, market: Market, n: usize) -> Result<Vec<String>> {
        let profile = self.markets.profile(market);
        let gl = profile.geo.to_lowercase();
        let num = (n * 2).to_string();

        tracing::debug!("SerpAPI request for '{}' in {}", keyword, profile.geo);
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", keyword),
                ("location", profile.location.as_str()),
                ("gl", gl.as_str()),
                ("hl", profile.language.as_str()),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        if let Some(message) = body.error {
            return Err(ScanError::source_error("serpapi", message));
        }

        let links = body.organic_results.into_iter().filter_map(|result| result.link);
        Ok(self.filter.collect(links, n))
    }

    async fn fetch_account(&self) -> Result<AccountStatus> {
        let response = self
            .client
            .get(format!("{}/account", self.base_url))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let account: AccountResponse = response.json().await?;
        Ok(AccountStatus {
            plan: account.plan_name.unwrap_or_else(|| "Unknown".to_string()),
            searches_per_month: account.searches_per_month,
            used: account.this_month_usage,
            remaining: account.total_searches_left,
        })
    }
}

#[async_trait]
impl ResultsSource for SerpApiSource {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    async fn top_urls(&self, keyword: &str, market: Market, n: usize) -> Result<Vec<String>> {
        let geo = &self.markets.profile(market).geo;
        match self.search(keyword, market, n).await {
            Ok(urls) => {
                tracing::info!("SerpAPI: Found {} URLs for '{}' in {}", urls.len(), keyword, geo);
                Ok(urls)
            }
            Err(e) => {
                tracing::error!("SerpAPI error for '{}' in {}: {}", keyword, geo, e);
                Ok(Vec::new())
            }
        }
    }

    async fn account_status(&self) -> Option<AccountStatus> {
        match self.fetch_account().await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::error!("Error checking SerpAPI account: {}", e);
                None
            }
        }
    }
}
