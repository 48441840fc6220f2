use crate::adapters::http::build_client;
use crate::adapters::{GoogleTranslateSource, GoogleTrendsSource, HttpPageFetcher};
use crate::config::ScannerConfig;
use crate::core::gap_scorer::GapScorer;
use crate::core::interest::InterestScorer;
use crate::core::quality::QualityAssessor;
use crate::core::serp::{select_results_source, ResultsBackend};
use crate::core::translator::{TranslationCache, Translator};
use crate::domain::model::{AccountStatus, GapAnalysisResult, Market, RelatedQueries};
use crate::domain::ports::ResultsSource;
use crate::utils::error::Result;
use crate::utils::validation::validate_keyword;

/// 串起翻譯、熱度、搜尋結果、品質與評分的掃描流程
///
/// 每個外部呼叫都依序完成後才進行下一個，批次中的關鍵字也逐一處理。
pub struct MarketScanner {
    translator: Translator,
    interest: InterestScorer,
    results: Box<dyn ResultsSource>,
    backend: ResultsBackend,
    quality: QualityAssessor,
    scorer: GapScorer,
    top_n: usize,
}

impl MarketScanner {
    pub fn new(
        translator: Translator,
        interest: InterestScorer,
        results: Box<dyn ResultsSource>,
        backend: ResultsBackend,
        quality: QualityAssessor,
        scorer: GapScorer,
        top_n: usize,
    ) -> Self {
        Self {
            translator,
            interest,
            results,
            backend,
            quality,
            scorer,
            top_n,
        }
    }

    /// 依設定建立所有真實的外部來源；搜尋結果來源只在這裡選一次
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        let client = build_client(config.http.request_timeout())?;
        let markets = &config.markets;

        let translator = Translator::new(
            Box::new(GoogleTranslateSource::new(
                client.clone(),
                config.endpoints.translate_url.clone(),
            )),
            TranslationCache::new(),
            markets.home.language.clone(),
            markets.target.language.clone(),
        )
        .with_throttle(config.rate_limits.translate());

        let interest = InterestScorer::new(
            Box::new(GoogleTrendsSource::new(
                client.clone(),
                &config.endpoints.trends_url,
                config.trends.hl.clone(),
                config.trends.tz,
            )),
            markets.clone(),
            config.trends.timeframe.clone(),
        )
        .with_throttle(config.rate_limits.trends());

        let (backend, results) = select_results_source(config)?;

        let quality = QualityAssessor::new(
            Box::new(HttpPageFetcher::new(client)),
            config.scoring.quality_weights,
        )
        .with_throttle(config.rate_limits.quality());

        let scorer = GapScorer::new(
            config.scoring.weights,
            config.scoring.golden,
            config.scoring.strong,
        )
        .with_market_labels(markets.home.geo.clone(), markets.target.geo.clone());

        Ok(Self::new(
            translator,
            interest,
            results,
            backend,
            quality,
            scorer,
            config.serp.top_n,
        ))
    }

    pub fn backend(&self) -> ResultsBackend {
        self.backend
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// 免費來源沒有帳號資訊，回傳 `None`
    pub async fn account_status(&self) -> Option<AccountStatus> {
        self.results.account_status().await
    }

    pub async fn log_backend_status(&self) {
        tracing::info!(
            "SERP backend: {} ({})",
            self.backend,
            self.results.name()
        );

        if self.backend == ResultsBackend::SerpApi {
            match self.account_status().await {
                Some(status) => tracing::info!(
                    "SerpAPI plan: {} | used {}/{} | remaining {}",
                    status.plan,
                    status.used,
                    status.searches_per_month,
                    status.remaining
                ),
                None => tracing::warn!("SerpAPI account status unavailable"),
            }
        }
    }

    pub async fn scan_keyword(&mut self, keyword: &str) -> Result<GapAnalysisResult> {
        let keyword = validate_keyword(keyword)?;

        tracing::info!("{}", "=".repeat(60));
        tracing::info!("Analyzing: '{}'", keyword);
        tracing::info!("{}", "=".repeat(60));

        let pair = self.translator.translate_pair(keyword).await;

        let interest = self
            .interest
            .compare_markets(&pair.source_text, &pair.translated_text)
            .await;

        let urls = self
            .results
            .urls_for_both_markets(&pair.source_text, &pair.translated_text, self.top_n)
            .await?;

        // 只評估目標市場的競爭者
        let competitors = self.quality.analyze_competitors(&urls.target).await;

        let gap_score = self.scorer.calculate_gap_score(
            interest.home,
            interest.target,
            competitors.average_quality,
        );

        let insights = self.scorer.insights(
            interest.home,
            interest.target,
            competitors.average_quality,
            gap_score,
        );
        tracing::info!("Gap score: {:.1} | {}", gap_score, insights);

        Ok(GapAnalysisResult {
            source_keyword: pair.source_text,
            translated_keyword: pair.translated_text,
            home_interest: interest.home,
            target_interest: interest.target,
            home_urls: urls.home,
            target_urls: urls.target,
            target_avg_quality: competitors.average_quality,
            gap_score,
            timestamp: chrono::Utc::now(),
        })
    }

    /// 單一關鍵字失敗只記錄下來，不影響其他關鍵字
    pub async fn scan_batch(&mut self, keywords: &[String]) -> Vec<GapAnalysisResult> {
        let total = keywords.len();
        let mut results = Vec::with_capacity(total);

        for (index, keyword) in keywords.iter().enumerate() {
            tracing::info!("[{}/{}] Processing: {}", index + 1, total, keyword);

            match self.scan_keyword(keyword).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Error analyzing '{}': {}", keyword, e);
                }
            }
        }

        tracing::info!("Batch complete: analyzed {}/{} keywords", results.len(), total);
        results
    }

    /// 目標市場查詢前先翻譯關鍵字
    pub async fn related_queries(&mut self, keyword: &str, market: Market) -> Result<RelatedQueries> {
        let keyword = validate_keyword(keyword)?;
        let query = match market {
            Market::Home => keyword.to_string(),
            Market::Target => self.translator.translate(keyword).await,
        };
        Ok(self.interest.related_queries(&query, market).await)
    }

    /// 給 CLI 顯示用
    pub fn insights_for(&self, result: &GapAnalysisResult) -> String {
        self.scorer.insights(
            result.home_interest,
            result.target_interest,
            result.target_avg_quality,
            result.gap_score,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quality::QualityWeights;
    use crate::domain::model::Markets;
    use crate::domain::ports::{FetchedPage, PageFetcher, TranslationSource, TrendsSource};
    use crate::utils::error::ScanError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct LoggedTranslator(CallLog);

    #[async_trait]
    impl TranslationSource for LoggedTranslator {
        async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String> {
            self.0.lock().unwrap().push(format!("translate:{}", text));
            Ok(format!("{} (pt)", text))
        }
    }

    struct LoggedTrends(CallLog);

    #[async_trait]
    impl TrendsSource for LoggedTrends {
        async fn series(&self, keyword: &str, geo: &str, _: &str) -> Result<Vec<f64>> {
            self.0.lock().unwrap().push(format!("trends:{}:{}", geo, keyword));
            Ok(match geo {
                "US" => vec![80.0],
                _ => vec![10.0],
            })
        }

        async fn related_queries(&self, keyword: &str, geo: &str, _: &str) -> Result<RelatedQueries> {
            self.0.lock().unwrap().push(format!("related:{}:{}", geo, keyword));
            Ok(RelatedQueries::default())
        }
    }

    struct LoggedResults {
        log: CallLog,
        failing_keyword: Option<String>,
    }

    #[async_trait]
    impl ResultsSource for LoggedResults {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn top_urls(&self, keyword: &str, market: Market, n: usize) -> Result<Vec<String>> {
            self.log
                .lock()
                .unwrap()
                .push(format!("serp:{}:{}", market, keyword));
            if self.failing_keyword.as_deref() == Some(keyword) {
                return Err(ScanError::source_error("mock serp", "captcha"));
            }
            Ok((1..=n)
                .map(|i| format!("https://{}-{}.example/", market, i))
                .collect())
        }
    }

    struct LoggedFetcher(CallLog);

    #[async_trait]
    impl PageFetcher for LoggedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            self.0.lock().unwrap().push(format!("fetch:{}", url));
            Ok(FetchedPage {
                status: 200,
                body: "<html><head><title>Simple page</title></head></html>".to_string(),
                last_modified: None,
            })
        }
    }

    fn scanner(failing_keyword: Option<&str>) -> (MarketScanner, CallLog) {
        let log: CallLog = Arc::default();
        let translator = Translator::new(
            Box::new(LoggedTranslator(log.clone())),
            TranslationCache::new(),
            "en",
            "pt",
        );
        let interest = InterestScorer::new(
            Box::new(LoggedTrends(log.clone())),
            Markets::default(),
            "today 12-m",
        );
        let results = LoggedResults {
            log: log.clone(),
            failing_keyword: failing_keyword.map(str::to_string),
        };
        let quality = QualityAssessor::new(
            Box::new(LoggedFetcher(log.clone())),
            QualityWeights::default(),
        );

        let scanner = MarketScanner::new(
            translator,
            interest,
            Box::new(results),
            ResultsBackend::Scraper,
            quality,
            GapScorer::default(),
            2,
        );
        (scanner, log)
    }

    #[tokio::test]
    async fn test_scan_keyword_runs_stages_in_order() {
        let (mut scanner, log) = scanner(None);

        let result = scanner.scan_keyword("  pdf to excel ").await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "translate:pdf to excel",
                "trends:US:pdf to excel",
                "trends:BR:pdf to excel (pt)",
                "serp:home:pdf to excel",
                "serp:target:pdf to excel (pt)",
                "fetch:https://target-1.example/",
                "fetch:https://target-2.example/",
            ]
        );

        assert_eq!(result.source_keyword, "pdf to excel");
        assert_eq!(result.translated_keyword, "pdf to excel (pt)");
        assert_eq!(result.home_interest, 80);
        assert_eq!(result.target_interest, 10);
        assert_eq!(result.home_urls.len(), 2);
        assert_eq!(result.target_urls[0], "https://target-1.example/");
        // https 頁面、成功載入，其他指標皆無：10 + 5
        assert_eq!(result.target_avg_quality, 15.0);
        assert!((0.0..=100.0).contains(&result.gap_score));
    }

    #[tokio::test]
    async fn test_scan_keyword_matches_scorer() {
        let (mut scanner, _) = scanner(None);
        let result = scanner.scan_keyword("background remover").await.unwrap();

        // 80*0.4 + 90*0.3 + 85*0.3 = 84.5，加上黃金機會 +10
        assert_eq!(result.gap_score, 94.5);
        assert!(scanner.insights_for(&result).contains("Strong US demand"));
    }

    #[tokio::test]
    async fn test_blank_keyword_is_rejected() {
        let (mut scanner, log) = scanner(None);
        let err = scanner.scan_keyword("   ").await.unwrap_err();

        assert!(matches!(err, ScanError::ValidationError { .. }));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_keeps_order() {
        let (mut scanner, _) = scanner(Some("broken keyword"));
        let keywords: Vec<String> = ["merge pdf", "", "broken keyword", "image resizer"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let results = scanner.scan_batch(&keywords).await;

        let scanned: Vec<&str> = results.iter().map(|r| r.source_keyword.as_str()).collect();
        assert_eq!(scanned, vec!["merge pdf", "image resizer"]);
    }

    #[tokio::test]
    async fn test_repeated_keyword_uses_translation_cache() {
        let (mut scanner, log) = scanner(None);
        let keywords = vec!["merge pdf".to_string(), "merge pdf".to_string()];

        let results = scanner.scan_batch(&keywords).await;

        assert_eq!(results.len(), 2);
        let translations = log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.starts_with("translate:"))
            .count();
        assert_eq!(translations, 1);
        assert_eq!(scanner.translator().cache().len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_selects_backend_once() {
        let config = ScannerConfig::default();
        let scanner = MarketScanner::from_config(&config).unwrap();
        assert_eq!(scanner.backend(), ResultsBackend::Scraper);
    }

    #[tokio::test]
    async fn test_related_queries_translate_for_target_market() {
        let (mut scanner, log) = scanner(None);

        scanner.related_queries("merge pdf", Market::Home).await.unwrap();
        scanner.related_queries("merge pdf", Market::Target).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "related:US:merge pdf",
                "translate:merge pdf",
                "related:BR:merge pdf (pt)",
            ]
        );
        assert!(scanner.related_queries(" ", Market::Home).await.is_err());
    }
}
