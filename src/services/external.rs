//! 外部检索
//!
//! 本地置信度不足时的兜底。调用是尽力而为的：任何失败或空结果都被
//! 视作"没有外部答案"，由编排器替换为固定回复。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::config::SearchConfig;
use crate::error::{AppError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalResolver: Send + Sync {
    /// 返回 `Ok(None)` 表示检索成功但没有可用答案
    async fn search(&self, query: &str) -> Result<Option<String>>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    abstract_text: String,
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RelatedTopic {
    text: Option<String>,
}

impl InstantAnswer {
    /// 摘要优先，其次第一条相关主题
    fn into_answer(self) -> Option<String> {
        if !self.abstract_text.trim().is_empty() {
            return Some(self.abstract_text);
        }
        self.related_topics
            .into_iter()
            .next()
            .and_then(|topic| topic.text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// DuckDuckGo Instant Answer API 客户端
pub struct DuckDuckGoResolver {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl ExternalResolver for DuckDuckGoResolver {
    async fn search(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("no_redirect", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "instant answer request failed with status {}",
                response.status()
            )));
        }

        let body: InstantAnswer = response.json().await?;
        let answer = body.into_answer();
        debug!(query = %query, found = answer.is_some(), "Instant answer lookup finished");
        Ok(answer)
    }
}

pub fn create_external_resolver(config: &SearchConfig) -> Result<Option<Box<dyn ExternalResolver>>> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Box::new(DuckDuckGoResolver::from_config(config)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer) -> DuckDuckGoResolver {
        DuckDuckGoResolver::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_abstract_text_is_preferred() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "rust language"))
            .and(query_param("format", "json"))
            .and(query_param("no_redirect", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AbstractText": "Rust is a systems programming language.",
                "RelatedTopics": [{"Text": "Rust (fungus)"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = resolver(&server).search("rust language").await.unwrap();
        assert_eq!(answer.as_deref(), Some("Rust is a systems programming language."));
    }

    #[tokio::test]
    async fn test_falls_back_to_first_related_topic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AbstractText": "",
                "RelatedTopics": [{"Text": "Ferris, the Rust mascot"}, {"Text": "other"}]
            })))
            .mount(&server)
            .await;

        let answer = resolver(&server).search("ferris").await.unwrap();
        assert_eq!(answer.as_deref(), Some("Ferris, the Rust mascot"));
    }

    #[tokio::test]
    async fn test_empty_result_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AbstractText": "",
                "RelatedTopics": []
            })))
            .mount(&server)
            .await;

        assert_eq!(resolver(&server).search("zzzz").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = resolver(&server).search("anything").await;
        assert!(matches!(result, Err(AppError::External(_))));
    }

    #[test]
    fn test_disabled_search_creates_no_resolver() {
        let mut config = crate::config::config::AppConfig::development().search;
        config.enabled = false;
        assert!(create_external_resolver(&config).unwrap().is_none());
    }
}
