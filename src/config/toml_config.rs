use crate::core::gap_scorer::{BonusRule, BonusRuleOverride, GapWeights};
use crate::core::quality::QualityWeights;
use crate::domain::model::{MarketProfile, Markets};
use crate::utils::error::{Result, ScanError};
use crate::utils::throttle::Throttle;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub markets: Markets,
    pub serp: SerpConfig,
    pub trends: TrendsConfig,
    pub rate_limits: RateLimitConfig,
    pub http: HttpConfig,
    pub scoring: ScoringConfig,
    pub endpoints: EndpointConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerpConfig {
    pub top_n: usize,
    pub use_serpapi: bool,
    pub serpapi_key: Option<String>,
    /// 搜尋引擎自家網域，出現在網址中即排除
    pub skip_domains: Vec<String>,
}

impl Default for SerpConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            use_serpapi: true,
            serpapi_key: None,
            skip_domains: [
                "google.com",
                "google.com.br",
                "youtube.com",
                "support.google",
                "accounts.google",
                "maps.google",
                "play.google",
                "policies.google",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    pub timeframe: String,
    pub hl: String,
    pub tz: i32,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            timeframe: "today 12-m".to_string(),
            hl: "en-US".to_string(),
            tz: 360,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub serp_delay_ms: u64,
    pub trends_delay_ms: u64,
    pub quality_delay_ms: u64,
    pub translate_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            serp_delay_ms: 3000,
            trends_delay_ms: 2000,
            quality_delay_ms: 1000,
            translate_delay_ms: 500,
        }
    }
}

impl RateLimitConfig {
    /// 全部歸零，測試用
    pub fn disabled() -> Self {
        Self {
            serp_delay_ms: 0,
            trends_delay_ms: 0,
            quality_delay_ms: 0,
            translate_delay_ms: 0,
        }
    }

    pub fn serp(&self) -> Throttle {
        Throttle::from_millis(self.serp_delay_ms)
    }

    pub fn trends(&self) -> Throttle {
        Throttle::from_millis(self.trends_delay_ms)
    }

    pub fn quality(&self) -> Throttle {
        Throttle::from_millis(self.quality_delay_ms)
    }

    pub fn translate(&self) -> Throttle {
        Throttle::from_millis(self.translate_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_seconds: u64,
    pub serpapi_timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 10,
            serpapi_timeout_seconds: 15,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn serpapi_timeout(&self) -> Duration {
        Duration::from_secs(self.serpapi_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: GapWeights,
    #[serde(deserialize_with = "deserialize_golden")]
    pub golden: BonusRule,
    #[serde(deserialize_with = "deserialize_strong")]
    pub strong: BonusRule,
    pub quality_weights: QualityWeights,
}

fn deserialize_golden<'de, D>(deserializer: D) -> std::result::Result<BonusRule, D::Error>
where
    D: Deserializer<'de>,
{
    BonusRuleOverride::deserialize(deserializer).map(|rule| rule.apply(BonusRule::golden()))
}

fn deserialize_strong<'de, D>(deserializer: D) -> std::result::Result<BonusRule, D::Error>
where
    D: Deserializer<'de>,
{
    BonusRuleOverride::deserialize(deserializer).map(|rule| rule.apply(BonusRule::strong()))
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: GapWeights::default(),
            golden: BonusRule::golden(),
            strong: BonusRule::strong(),
            quality_weights: QualityWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub translate_url: String,
    pub trends_url: String,
    pub serpapi_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            translate_url: "https://translate.googleapis.com/translate_a/single".to_string(),
            trends_url: "https://trends.google.com/trends".to_string(),
            serpapi_url: "https://serpapi.com".to_string(),
        }
    }
}

impl ScannerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 載入配置檔（若有），再套用環境變數覆蓋
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${SERPAPI_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// SERPAPI_KEY / USE_SERPAPI 覆蓋檔案設定
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("SERPAPI_KEY").filter(|k| !k.trim().is_empty()) {
            self.serp.serpapi_key = Some(key.trim().to_string());
        }
        if let Some(flag) = lookup("USE_SERPAPI") {
            self.serp.use_serpapi = flag.trim().eq_ignore_ascii_case("true");
        }
    }

    /// 有效的 SerpAPI 金鑰；空字串或未替換的 ${VAR} 視為未設定
    pub fn serpapi_key(&self) -> Option<&str> {
        self.serp
            .serpapi_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.starts_with("${"))
    }

    pub fn serpapi_enabled(&self) -> bool {
        self.serp.use_serpapi && self.serpapi_key().is_some()
    }

    fn validate_market(prefix: &str, market: &MarketProfile) -> Result<()> {
        validate_non_empty_string(&format!("{}.geo", prefix), &market.geo)?;
        validate_non_empty_string(&format!("{}.language", prefix), &market.language)?;
        validate_url(&format!("{}.search_url", prefix), &market.search_url)?;
        Ok(())
    }

    fn validate_bonus(prefix: &str, rule: &BonusRule) -> Result<()> {
        validate_range(&format!("{}.home_min", prefix), rule.home_min, 0.0, 100.0)?;
        if let Some(target_max) = rule.target_max {
            validate_range(&format!("{}.target_max", prefix), target_max, 0.0, 100.0)?;
        }
        validate_range(&format!("{}.quality_max", prefix), rule.quality_max, 0.0, 100.0)?;
        validate_range(&format!("{}.points", prefix), rule.points, 0.0, 100.0)?;
        Ok(())
    }
}

impl Validate for ScannerConfig {
    fn validate(&self) -> Result<()> {
        Self::validate_market("markets.home", &self.markets.home)?;
        Self::validate_market("markets.target", &self.markets.target)?;

        validate_range("serp.top_n", self.serp.top_n, 1, 50)?;
        validate_non_empty_string("trends.timeframe", &self.trends.timeframe)?;

        validate_positive_number(
            "http.request_timeout_seconds",
            self.http.request_timeout_seconds,
            1,
        )?;
        validate_positive_number(
            "http.serpapi_timeout_seconds",
            self.http.serpapi_timeout_seconds,
            1,
        )?;

        validate_url("endpoints.translate_url", &self.endpoints.translate_url)?;
        validate_url("endpoints.trends_url", &self.endpoints.trends_url)?;
        validate_url("endpoints.serpapi_url", &self.endpoints.serpapi_url)?;

        let weights = &self.scoring.weights;
        validate_range("scoring.weights.demand", weights.demand, 0.0, 1.0)?;
        validate_range("scoring.weights.saturation", weights.saturation, 0.0, 1.0)?;
        validate_range("scoring.weights.quality_gap", weights.quality_gap, 0.0, 1.0)?;
        Self::validate_bonus("scoring.golden", &self.scoring.golden)?;
        Self::validate_bonus("scoring.strong", &self.scoring.strong)?;

        Ok(())
    }
}
