use crate::domain::ports::TranslationSource;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Google Translate 的公開端點 (client=gtx)
pub struct GoogleTranslateSource {
    client: Client,
    endpoint: String,
}

impl GoogleTranslateSource {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

/// 回應格式為 `[[["譯文片段", "原文片段", ...], ...], ...]`，把每段譯文串起來
pub fn parse_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    let translated = translated.trim();
    if translated.is_empty() {
        None
    } else {
        Some(translated.to_string())
    }
}

#[async_trait]
impl TranslationSource for GoogleTranslateSource {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_translation(&body)
            .ok_or_else(|| ScanError::source_error("Google Translate", "empty translation"))
    }
}
