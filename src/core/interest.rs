use crate::domain::model::{clamp_percent, Market, MarketPair, Markets, RelatedQueries};
use crate::domain::ports::TrendsSource;
use crate::utils::throttle::Throttle;

pub struct InterestScorer {
    source: Box<dyn TrendsSource>,
    markets: Markets,
    timeframe: String,
    throttle: Throttle,
}

impl InterestScorer {
    pub fn new(source: Box<dyn TrendsSource>, markets: Markets, timeframe: impl Into<String>) -> Self {
        Self {
            source,
            markets,
            timeframe: timeframe.into(),
            throttle: Throttle::none(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// 相對熱度 (0-100)：時間序列平均值取整；沒有資料或來源失敗都是 0
    pub async fn interest_score(&self, keyword: &str, market: Market) -> u8 {
        let geo = &self.markets.profile(market).geo;

        self.throttle.wait().await;

        match self.source.series(keyword, geo, &self.timeframe).await {
            Ok(samples) if samples.is_empty() => {
                tracing::warn!("No data for '{}' in {}", keyword, geo);
                0
            }
            Ok(samples) => {
                let score = mean_score(&samples);
                tracing::info!("'{}' in {}: interest score = {}", keyword, geo, score);
                score
            }
            Err(e) => {
                tracing::error!("Error getting interest for '{}' in {}: {}", keyword, geo, e);
                0
            }
        }
    }

    pub async fn compare_markets(&self, home_keyword: &str, target_keyword: &str) -> MarketPair<u8> {
        let home = self.interest_score(home_keyword, Market::Home).await;
        let target = self.interest_score(target_keyword, Market::Target).await;

        tracing::info!(
            "Market comparison: {} ({}: {}) vs {} ({}: {})",
            home_keyword,
            self.markets.home.geo,
            home,
            target_keyword,
            self.markets.target.geo,
            target
        );

        MarketPair { home, target }
    }

    /// 額外的參考資訊，不影響分數；來源失敗時回傳空結果
    pub async fn related_queries(&self, keyword: &str, market: Market) -> RelatedQueries {
        let geo = &self.markets.profile(market).geo;

        self.throttle.wait().await;

        match self.source.related_queries(keyword, geo, &self.timeframe).await {
            Ok(related) => related,
            Err(e) => {
                tracing::error!("Error getting related queries for '{}': {}", keyword, e);
                RelatedQueries::default()
            }
        }
    }
}

fn mean_score(samples: &[f64]) -> u8 {
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    clamp_percent(mean).trunc() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RelatedQuery;
    use crate::utils::error::{Result, ScanError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockTrendsSource {
        series: HashMap<(String, String), Vec<f64>>,
        failing_geo: Option<String>,
        calls: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl MockTrendsSource {
        fn with_series(mut self, keyword: &str, geo: &str, samples: Vec<f64>) -> Self {
            self.series
                .insert((keyword.to_string(), geo.to_string()), samples);
            self
        }
    }

    #[async_trait]
    impl TrendsSource for MockTrendsSource {
        async fn series(&self, keyword: &str, geo: &str, timeframe: &str) -> Result<Vec<f64>> {
            self.calls.lock().unwrap().push((
                keyword.to_string(),
                geo.to_string(),
                timeframe.to_string(),
            ));
            if self.failing_geo.as_deref() == Some(geo) {
                return Err(ScanError::source_error("mock trends", "429 Too Many Requests"));
            }
            Ok(self
                .series
                .get(&(keyword.to_string(), geo.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn related_queries(&self, keyword: &str, geo: &str, _timeframe: &str) -> Result<RelatedQueries> {
            if self.failing_geo.as_deref() == Some(geo) {
                return Err(ScanError::source_error("mock trends", "429 Too Many Requests"));
            }
            Ok(RelatedQueries {
                top: vec![RelatedQuery {
                    query: format!("{} online", keyword),
                    value: 100.0,
                }],
                rising: Vec::new(),
            })
        }
    }

    fn scorer(source: MockTrendsSource) -> InterestScorer {
        InterestScorer::new(Box::new(source), Markets::default(), "today 12-m")
    }

    #[tokio::test]
    async fn test_interest_score_is_truncated_mean() {
        let source = MockTrendsSource::default().with_series("pdf to excel", "US", vec![50.0, 61.0, 70.0]);
        let scorer = scorer(source.clone());

        // 181 / 3 = 60.33
        assert_eq!(scorer.interest_score("pdf to excel", Market::Home).await, 60);

        let calls = source.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            ("pdf to excel".to_string(), "US".to_string(), "today 12-m".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_series_is_zero() {
        let scorer = scorer(MockTrendsSource::default());
        assert_eq!(scorer.interest_score("unknown keyword", Market::Target).await, 0);
    }

    #[tokio::test]
    async fn test_source_failure_is_zero() {
        let source = MockTrendsSource {
            failing_geo: Some("BR".to_string()),
            ..Default::default()
        }
        .with_series("pdf para excel", "BR", vec![80.0]);

        let scorer = scorer(source);
        assert_eq!(scorer.interest_score("pdf para excel", Market::Target).await, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_samples_are_clamped() {
        let source = MockTrendsSource::default().with_series("spike", "US", vec![250.0, 150.0]);
        assert_eq!(scorer(source).interest_score("spike", Market::Home).await, 100);
    }

    #[tokio::test]
    async fn test_compare_markets_queries_home_then_target() {
        let source = MockTrendsSource::default()
            .with_series("background remover", "US", vec![80.0, 90.0])
            .with_series("removedor de fundo", "BR", vec![10.0, 20.0]);
        let scorer = scorer(source.clone());

        let pair = scorer
            .compare_markets("background remover", "removedor de fundo")
            .await;

        assert_eq!(pair, MarketPair { home: 85, target: 15 });

        let geos: Vec<String> = source
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, geo, _)| geo.clone())
            .collect();
        assert_eq!(geos, vec!["US", "BR"]);
    }

    #[tokio::test]
    async fn test_related_queries_for_market() {
        let scorer = scorer(MockTrendsSource::default());
        let related = scorer.related_queries("merge pdf", Market::Home).await;
        assert_eq!(related.top[0].query, "merge pdf online");
        assert!(related.rising.is_empty());
    }

    #[tokio::test]
    async fn test_related_queries_failure_is_empty() {
        let source = MockTrendsSource {
            failing_geo: Some("BR".to_string()),
            ..Default::default()
        };
        let related = scorer(source).related_queries("juntar pdf", Market::Target).await;
        assert!(related.is_empty());
    }
}
