use crate::domain::model::{clamp_percent, CompetitorAnalysis, QualityMetrics};
use crate::domain::ports::PageFetcher;
use crate::utils::throttle::Throttle;
use chrono::Datelike;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 品質分數權重，加總上限 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub web_app: f64,
    pub responsive: f64,
    pub recent: f64,
    pub https: f64,
    pub load_success: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            web_app: 40.0,
            responsive: 25.0,
            recent: 20.0,
            https: 10.0,
            load_success: 5.0,
        }
    }
}

impl QualityWeights {
    pub fn score(&self, metrics: &QualityMetrics) -> f64 {
        let mut score = 0.0;
        if metrics.is_web_app {
            score += self.web_app;
        }
        if metrics.is_responsive {
            score += self.responsive;
        }
        if metrics.is_recent {
            score += self.recent;
        }
        if metrics.has_https {
            score += self.https;
        }
        if metrics.page_load_success {
            score += self.load_success;
        }
        clamp_percent(score)
    }
}

/// 判斷「工具型網站」的加減分表
#[derive(Debug, Clone, PartialEq)]
pub struct WebAppRules {
    pub app_keywords: Vec<&'static str>,
    pub app_keyword_points: i32,
    pub file_input_points: i32,
    pub form_points: i32,
    pub min_buttons: usize,
    pub buttons_points: i32,
    pub url_tokens: Vec<&'static str>,
    pub url_points: i32,
    pub blog_keywords: Vec<&'static str>,
    pub blog_points: i32,
    pub threshold: i32,
}

impl Default for WebAppRules {
    fn default() -> Self {
        Self {
            app_keywords: vec![
                "tool",
                "converter",
                "generator",
                "editor",
                "maker",
                "creator",
                "online",
                "free",
                "download",
                "convert",
                "transform",
            ],
            app_keyword_points: 2,
            file_input_points: 3,
            form_points: 1,
            min_buttons: 2,
            buttons_points: 1,
            url_tokens: vec!["tool", "convert", "generator", "online"],
            url_points: 2,
            blog_keywords: vec!["blog", "article", "post", "author", "published"],
            blog_points: -3,
            threshold: 3,
        }
    }
}

impl WebAppRules {
    pub fn points(&self, signals: &PageSignals, url: &str) -> i32 {
        let title = signals.title.to_lowercase();
        let description = signals.description.to_lowercase();
        let url = url.to_lowercase();

        let mut points = 0;
        if self
            .app_keywords
            .iter()
            .any(|kw| title.contains(kw) || description.contains(kw))
        {
            points += self.app_keyword_points;
        }
        if signals.has_file_input {
            points += self.file_input_points;
        }
        if signals.form_count > 0 {
            points += self.form_points;
        }
        if signals.button_count >= self.min_buttons {
            points += self.buttons_points;
        }
        if self.url_tokens.iter().any(|token| url.contains(token)) {
            points += self.url_points;
        }
        if self
            .blog_keywords
            .iter()
            .any(|kw| title.contains(kw) || url.contains(kw))
        {
            points += self.blog_points;
        }
        points
    }

    pub fn is_web_app(&self, signals: &PageSignals, url: &str) -> bool {
        self.points(signals, url) >= self.threshold
    }
}

/// 從 HTML 抽出的結構訊號；解析後不再持有 DOM
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    pub title: String,
    pub description: String,
    pub has_viewport: bool,
    pub has_file_input: bool,
    pub form_count: usize,
    pub button_count: usize,
    pub copyright_years: Vec<i32>,
    pub modified_time: Option<String>,
}

struct PageSelectors {
    title: Selector,
    description: Selector,
    viewport: Selector,
    file_input: Selector,
    form: Selector,
    button: Selector,
    modified_time: Selector,
}

fn page_selectors() -> &'static PageSelectors {
    static SELECTORS: OnceLock<PageSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| PageSelectors {
        title: Selector::parse("title").unwrap(),
        description: Selector::parse("meta[name='description']").unwrap(),
        viewport: Selector::parse("meta[name='viewport']").unwrap(),
        file_input: Selector::parse("input[type='file']").unwrap(),
        form: Selector::parse("form").unwrap(),
        button: Selector::parse("button").unwrap(),
        modified_time: Selector::parse("meta[property='article:modified_time']").unwrap(),
    })
}

fn copyright_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 「© 2019-2025」取後面的年份
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:©|copyright)\s*(?:\d{4}\s*[-–]\s*)?(\d{4})").unwrap()
    })
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(20\d{2})\b").unwrap())
}

fn first_year(text: &str) -> Option<i32> {
    year_regex()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

impl PageSignals {
    pub fn from_html(body: &str) -> Self {
        let document = Html::parse_document(body);
        let selectors = page_selectors();

        let title = document
            .select(&selectors.title)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let description = document
            .select(&selectors.description)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let text = document.root_element().text().collect::<Vec<_>>().join(" ");
        let copyright_years = copyright_regex()
            .captures_iter(&text)
            .filter_map(|caps| caps[1].parse().ok())
            .collect();

        let modified_time = document
            .select(&selectors.modified_time)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.to_string());

        Self {
            title,
            description,
            has_viewport: document.select(&selectors.viewport).next().is_some(),
            has_file_input: document.select(&selectors.file_input).next().is_some(),
            form_count: document.select(&selectors.form).count(),
            button_count: document.select(&selectors.button).count(),
            copyright_years,
            modified_time,
        }
    }

    /// 最近兩年內更新：Last-Modified、版權年份或 article:modified_time 任一符合
    pub fn is_recent(&self, last_modified: Option<&str>, threshold_year: i32) -> bool {
        if last_modified
            .and_then(first_year)
            .is_some_and(|year| year >= threshold_year)
        {
            return true;
        }

        if self.copyright_years.iter().any(|&year| year >= threshold_year) {
            return true;
        }

        self.modified_time
            .as_deref()
            .and_then(first_year)
            .is_some_and(|year| year >= threshold_year)
    }
}

pub struct QualityAssessor {
    fetcher: Box<dyn PageFetcher>,
    weights: QualityWeights,
    rules: WebAppRules,
    throttle: Throttle,
    recency_threshold: i32,
}

impl QualityAssessor {
    pub fn new(fetcher: Box<dyn PageFetcher>, weights: QualityWeights) -> Self {
        let current_year = chrono::Utc::now().year();
        Self {
            fetcher,
            weights,
            rules: WebAppRules::default(),
            throttle: Throttle::none(),
            recency_threshold: current_year - 2,
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_rules(mut self, rules: WebAppRules) -> Self {
        self.rules = rules;
        self
    }

    /// 以指定年份為「今年」計算近期門檻
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.recency_threshold = year - 2;
        self
    }

    pub fn recency_threshold(&self) -> i32 {
        self.recency_threshold
    }

    pub async fn analyze(&self, url: &str) -> QualityMetrics {
        let mut metrics = QualityMetrics::unloaded(url);

        self.throttle.wait().await;

        // 載入失敗時所有指標維持 false，分數為 0
        match self.fetcher.fetch(url).await {
            Ok(page) if page.status == 200 => {
                metrics.page_load_success = true;
                metrics.has_https = url.starts_with("https://");

                let signals = PageSignals::from_html(&page.body);
                metrics.is_responsive = signals.has_viewport;
                metrics.is_web_app = self.rules.is_web_app(&signals, url);
                metrics.is_recent =
                    signals.is_recent(page.last_modified.as_deref(), self.recency_threshold);
            }
            Ok(page) => {
                tracing::warn!("Failed to load {}: status {}", url, page.status);
                metrics.error_message = Some(format!("HTTP status {}", page.status));
            }
            Err(e) => {
                tracing::error!("Error loading {}: {}", url, e);
                metrics.error_message = Some(e.to_string());
            }
        }

        metrics.quality_score = self.weights.score(&metrics);
        tracing::info!("Analyzed {}: quality={:.1}", url, metrics.quality_score);
        metrics
    }

    pub async fn analyze_competitors(&self, urls: &[String]) -> CompetitorAnalysis {
        let mut per_url_metrics = Vec::with_capacity(urls.len());
        for url in urls {
            per_url_metrics.push(self.analyze(url).await);
        }

        let average_quality = if per_url_metrics.is_empty() {
            0.0
        } else {
            let total: f64 = per_url_metrics.iter().map(|m| m.quality_score).sum();
            clamp_percent(total / per_url_metrics.len() as f64)
        };

        CompetitorAnalysis {
            average_quality,
            web_app_count: per_url_metrics.iter().filter(|m| m.is_web_app).count(),
            responsive_count: per_url_metrics.iter().filter(|m| m.is_responsive).count(),
            per_url_metrics,
        }
    }
}
