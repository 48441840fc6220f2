// 轉接層：以 HTTP 實作 domain 的 ports

pub mod google_translate;
pub mod google_trends;
pub mod http;

pub use google_translate::GoogleTranslateSource;
pub use google_trends::GoogleTrendsSource;
pub use http::HttpPageFetcher;
