use crate::domain::model::{AccountStatus, Market, MarketPair, RelatedQueries};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 翻譯來源，例如 Google Translate
#[async_trait]
pub trait TranslationSource: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// 搜尋趨勢來源：回傳時間序列的相對熱度樣本
#[async_trait]
pub trait TrendsSource: Send + Sync {
    async fn series(&self, keyword: &str, geo: &str, timeframe: &str) -> Result<Vec<f64>>;

    /// 不支援相關搜尋的來源回傳空結果
    async fn related_queries(&self, _keyword: &str, _geo: &str, _timeframe: &str) -> Result<RelatedQueries> {
        Ok(RelatedQueries::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
    pub last_modified: Option<String>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// 自然搜尋結果來源
///
/// 內建的兩個實作在網路或解析失敗時回傳空清單；`Err` 只留給無法降級的錯誤，
/// 由批次掃描在關鍵字層級攔截。
#[async_trait]
pub trait ResultsSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn top_urls(&self, keyword: &str, market: Market, n: usize) -> Result<Vec<String>>;

    async fn urls_for_both_markets(
        &self,
        home_keyword: &str,
        target_keyword: &str,
        n: usize,
    ) -> Result<MarketPair<Vec<String>>> {
        let home = self.top_urls(home_keyword, Market::Home, n).await?;
        let target = self.top_urls(target_keyword, Market::Target, n).await?;
        Ok(MarketPair { home, target })
    }

    /// 只有付費來源有帳號資訊
    async fn account_status(&self) -> Option<AccountStatus> {
        None
    }
}
