pub mod gap_scorer;
pub mod interest;
pub mod quality;
pub mod scanner;
pub mod serp;
pub mod translator;

pub use crate::domain::model::{GapAnalysisResult, KeywordPair, QualityMetrics};
pub use crate::domain::ports::{PageFetcher, ResultsSource, TranslationSource, TrendsSource};
pub use crate::utils::error::Result;
pub use scanner::MarketScanner;
