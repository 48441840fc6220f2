use crate::domain::model::{RelatedQueries, RelatedQuery};
use crate::domain::ports::TrendsSource;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    #[serde(default)]
    id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    request: Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RelatedSearchesResponse {
    default: RankedLists,
}

#[derive(Debug, Deserialize)]
struct RankedLists {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Deserialize)]
struct RankedKeyword {
    query: String,
    #[serde(default)]
    value: f64,
}

/// Google Trends 的非公開 JSON API，兩段式：explore 取得 widget token，再查時間序列
pub struct GoogleTrendsSource {
    client: Client,
    base_url: String,
    hl: String,
    tz: i32,
}

impl GoogleTrendsSource {
    pub fn new(client: Client, base_url: &str, hl: impl Into<String>, tz: i32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hl: hl.into(),
            tz,
        }
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Trends request: {}", url);

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        Ok(strip_json_prefix(&body).to_string())
    }

    async fn explore_widget(
        &self,
        keyword: &str,
        geo: &str,
        timeframe: &str,
        widget_id: &str,
    ) -> Result<Option<Widget>> {
        let req = json!({
            "comparisonItem": [{ "keyword": keyword, "geo": geo, "time": timeframe }],
            "category": 0,
            "property": "",
        });

        let body = self
            .get_json(
                "/api/explore",
                &[
                    ("hl", self.hl.clone()),
                    ("tz", self.tz.to_string()),
                    ("req", req.to_string()),
                ],
            )
            .await?;

        let explore: ExploreResponse = serde_json::from_str(&body)?;
        Ok(explore
            .widgets
            .into_iter()
            .find(|widget| widget.id == widget_id))
    }

    async fn widget_data(&self, path: &str, widget: Widget) -> Result<String> {
        if widget.token.is_empty() {
            return Err(ScanError::source_error("Google Trends", "missing widget token"));
        }

        self.get_json(
            path,
            &[
                ("hl", self.hl.clone()),
                ("tz", self.tz.to_string()),
                ("req", widget.request.to_string()),
                ("token", widget.token),
            ],
        )
        .await
    }
}

/// 回應前面帶有 `)]}'` 之類的防護前綴
fn strip_json_prefix(body: &str) -> &str {
    match body.find('{') {
        Some(start) => &body[start..],
        None => body,
    }
}

/// 單一關鍵字查詢，每個時間點取第一個值
fn parse_timeline(body: &str) -> Result<Vec<f64>> {
    let multiline: MultilineResponse = serde_json::from_str(body)?;
    Ok(multiline
        .default
        .timeline_data
        .into_iter()
        .filter_map(|point| point.value.first().copied())
        .collect())
}

/// 第一份清單是熱門搜尋，第二份是上升中的搜尋
fn parse_related(body: &str) -> Result<RelatedQueries> {
    let response: RelatedSearchesResponse = serde_json::from_str(body)?;
    let mut lists = response.default.ranked_list.into_iter().map(|list| {
        list.ranked_keyword
            .into_iter()
            .map(|ranked| RelatedQuery {
                query: ranked.query,
                value: ranked.value,
            })
            .collect::<Vec<_>>()
    });

    Ok(RelatedQueries {
        top: lists.next().unwrap_or_default(),
        rising: lists.next().unwrap_or_default(),
    })
}

#[async_trait]
impl TrendsSource for GoogleTrendsSource {
    async fn series(&self, keyword: &str, geo: &str, timeframe: &str) -> Result<Vec<f64>> {
        let Some(widget) = self
            .explore_widget(keyword, geo, timeframe, "TIMESERIES")
            .await?
        else {
            tracing::debug!("No TIMESERIES widget for '{}' in {}", keyword, geo);
            return Ok(Vec::new());
        };

        let body = self.widget_data("/api/widgetdata/multiline", widget).await?;
        parse_timeline(&body)
    }

    async fn related_queries(&self, keyword: &str, geo: &str, timeframe: &str) -> Result<RelatedQueries> {
        let Some(widget) = self
            .explore_widget(keyword, geo, timeframe, "RELATED_QUERIES")
            .await?
        else {
            tracing::debug!("No RELATED_QUERIES widget for '{}' in {}", keyword, geo);
            return Ok(RelatedQueries::default());
        };

        let body = self
            .widget_data("/api/widgetdata/relatedsearches", widget)
            .await?;
        parse_related(&body)
    }
}
