pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::ScannerConfig;
pub use core::scanner::MarketScanner;
pub use core::serp::ResultsBackend;
pub use domain::model::GapAnalysisResult;
pub use utils::error::{Result, ScanError};
