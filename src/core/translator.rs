use crate::domain::model::KeywordPair;
use crate::domain::ports::TranslationSource;
use crate::utils::throttle::Throttle;
use std::collections::{BTreeMap, HashMap};

/// 翻譯快取：單純的 memo，行程存活期間不淘汰
///
/// 不會自動清除也沒有容量上限；需要上限的呼叫端應自行包裝。
#[derive(Debug, Default, Clone)]
pub struct TranslationCache {
    entries: HashMap<String, String>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(String::as_str)
    }

    pub fn insert(&mut self, text: String, translation: String) {
        self.entries.insert(text, translation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 只由呼叫端明確觸發
    pub fn clear(&mut self) {
        self.entries.clear();
        tracing::info!("Translation cache cleared");
    }
}

pub struct Translator {
    source: Box<dyn TranslationSource>,
    cache: TranslationCache,
    source_lang: String,
    target_lang: String,
    throttle: Throttle,
}

impl Translator {
    pub fn new(
        source: Box<dyn TranslationSource>,
        cache: TranslationCache,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cache,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            throttle: Throttle::none(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TranslationCache {
        &mut self.cache
    }

    /// 翻譯；來源失敗時回傳原文且不寫入快取
    pub async fn translate(&mut self, text: &str) -> String {
        if let Some(cached) = self.cache.get(text) {
            tracing::debug!("Cache hit for: {}", text);
            return cached.to_string();
        }

        self.throttle.wait().await;

        match self
            .source
            .translate(text, &self.source_lang, &self.target_lang)
            .await
        {
            Ok(translation) => {
                tracing::info!("Translated: '{}' -> '{}'", text, translation);
                self.cache.insert(text.to_string(), translation.clone());
                translation
            }
            Err(e) => {
                tracing::error!("Translation failed for '{}': {}", text, e);
                text.to_string()
            }
        }
    }

    pub async fn translate_pair(&mut self, text: &str) -> KeywordPair {
        let translated_text = self.translate(text).await;
        KeywordPair {
            source_text: text.to_string(),
            translated_text,
        }
    }

    pub async fn translate_batch(&mut self, texts: &[String]) -> BTreeMap<String, String> {
        let mut results = BTreeMap::new();
        for text in texts {
            let translation = self.translate(text).await;
            results.insert(text.clone(), translation);
        }
        results
    }
}
