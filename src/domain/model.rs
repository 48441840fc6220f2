use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 百分制欄位一律夾在 [0, 100]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Home,
    Target,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Home => write!(f, "home"),
            Market::Target => write!(f, "target"),
        }
    }
}

/// 市場的語言、地區與搜尋端點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketProfile {
    /// Trends / SERP 使用的地區代碼，例如 "US"
    pub geo: String,
    pub language: String,
    pub search_url: String,
    /// SerpAPI 的 location 參數
    pub location: String,
}

impl MarketProfile {
    pub fn home_default() -> Self {
        Self {
            geo: "US".to_string(),
            language: "en".to_string(),
            search_url: "https://www.google.com/search".to_string(),
            location: "United States".to_string(),
        }
    }

    pub fn target_default() -> Self {
        Self {
            geo: "BR".to_string(),
            language: "pt".to_string(),
            search_url: "https://www.google.com.br/search".to_string(),
            location: "Brazil".to_string(),
        }
    }
}

/// 兩個市場的設定，依 `Market` 取用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markets {
    pub home: MarketProfile,
    pub target: MarketProfile,
}

impl Markets {
    pub fn profile(&self, market: Market) -> &MarketProfile {
        match market {
            Market::Home => &self.home,
            Market::Target => &self.target,
        }
    }
}

impl Default for Markets {
    fn default() -> Self {
        Self {
            home: MarketProfile::home_default(),
            target: MarketProfile::target_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPair<T> {
    pub home: T,
    pub target: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPair {
    pub source_text: String,
    pub translated_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub url: String,
    pub has_https: bool,
    pub is_responsive: bool,
    pub is_web_app: bool,
    pub is_recent: bool,
    pub page_load_success: bool,
    pub quality_score: f64,
    pub error_message: Option<String>,
}

impl QualityMetrics {
    /// 所有指標皆為否定預設值
    pub fn unloaded(url: &str) -> Self {
        Self {
            url: url.to_string(),
            has_https: false,
            is_responsive: false,
            is_web_app: false,
            is_recent: false,
            page_load_success: false,
            quality_score: 0.0,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub average_quality: f64,
    pub per_url_metrics: Vec<QualityMetrics>,
    pub web_app_count: usize,
    pub responsive_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedQuery {
    pub query: String,
    pub value: f64,
}

/// 趨勢來源的相關搜尋：熱門與上升中兩份清單
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedQueries {
    pub top: Vec<RelatedQuery>,
    pub rising: Vec<RelatedQuery>,
}

impl RelatedQueries {
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.rising.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub plan: String,
    pub searches_per_month: u64,
    pub used: u64,
    pub remaining: u64,
}

/// 單一關鍵字的完整掃描結果，建立後不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    pub source_keyword: String,
    pub translated_keyword: String,
    pub home_interest: u8,
    pub target_interest: u8,
    pub home_urls: Vec<String>,
    pub target_urls: Vec<String>,
    pub target_avg_quality: f64,
    pub gap_score: f64,
    pub timestamp: DateTime<Utc>,
}

pub const URL_LIST_SEPARATOR: &str = " | ";

impl GapAnalysisResult {
    /// 攤平成 key/value，欄位名稱與結構欄位相同
    pub fn to_flat_record(&self) -> Vec<(&'static str, String)> {
        vec![
            ("source_keyword", self.source_keyword.clone()),
            ("translated_keyword", self.translated_keyword.clone()),
            ("home_interest", self.home_interest.to_string()),
            ("target_interest", self.target_interest.to_string()),
            ("home_urls", self.home_urls.join(URL_LIST_SEPARATOR)),
            ("target_urls", self.target_urls.join(URL_LIST_SEPARATOR)),
            ("target_avg_quality", format!("{:.1}", self.target_avg_quality)),
            ("gap_score", format!("{:.1}", self.gap_score)),
            ("timestamp", self.timestamp.to_rfc3339()),
        ]
    }
}

impl fmt::Display for GapAnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' -> '{}' | Gap Score: {:.1} | Home: {} | Target: {} | Target Quality: {:.1}",
            self.source_keyword,
            self.translated_keyword,
            self.gap_score,
            self.home_interest,
            self.target_interest,
            self.target_avg_quality
        )
    }
}
