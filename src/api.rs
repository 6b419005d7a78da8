//! HTTP client for the social-mapping / analysis API.
//!
//! Every call is a `GET` carrying `Authorization: {API_KEY}`. Anything
//! other than a 2xx JSON body is an [`ApiError`]; callers decide whether
//! that is fatal or just "no data".

use crate::config::{ApiConfig, Credentials};
use crate::error::ApiError;
use crate::models::{SearchType, Tweet};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Classification endpoints under `/api/chatgpt/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifyAttribute {
    ObjectsSentiment,
    Topics,
}

impl ClassifyAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifyAttribute::ObjectsSentiment => "objects_sentiment",
            ClassifyAttribute::Topics => "topics",
        }
    }
}

/// Shared API client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    settings: ApiConfig,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.settings.timeout_seconds)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for an explicit base URL (e.g. `https://api.example.com`).
    pub fn new(base_url: &str, api_key: &str, settings: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            settings,
        })
    }

    /// Create a client for `https://{API_DOMAIN}`.
    pub fn from_credentials(creds: &Credentials, settings: ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            &format!("https://{}", creds.domain),
            &creds.api_key,
            settings,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base_url}{path}?{query}` and parse the body as JSON.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.settings.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.settings.timeout_seconds))
    }

    /// Raw profile records from the social mapper for one platform.
    ///
    /// The API returns records under `results` or, for some platforms,
    /// `result`; both are accepted here.
    pub async fn social_mapper(
        &self,
        platform: &str,
        fullname: &str,
        photo_url: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let path = format!("/api/social_mapper/{}/v2", platform);
        let query = [
            ("fullname", fullname.to_string()),
            ("photo", photo_url.to_string()),
            ("max_profiles", self.settings.max_profiles.to_string()),
            ("only_first_equal", "1".to_string()),
        ];

        let body = self.get_json(&path, &query).await?;
        Ok(records_of(&body, &["results", "result"]))
    }

    /// Run one classification over `text`.
    pub async fn classify<T: DeserializeOwned>(
        &self,
        attribute: ClassifyAttribute,
        text: &str,
    ) -> Result<Vec<T>, ApiError> {
        let path = format!("/api/chatgpt/{}", attribute.as_str());
        let query = [
            ("query", text.to_string()),
            ("task_id", String::new()),
            ("delayed", "1".to_string()),
            ("timeout", self.settings.classify_timeout.to_string()),
            ("limit", self.settings.limit.to_string()),
            ("in_english", "1".to_string()),
        ];

        let body = self.get_json(&path, &query).await?;
        Ok(decode_each(records_of(&body, &["results"]), attribute.as_str()))
    }

    /// Fetch tweets for a username, hashtag set or keyword query.
    pub async fn tweets(&self, search_type: SearchType, query: &str) -> Result<Vec<Tweet>, ApiError> {
        let (path, param) = match search_type {
            SearchType::Username => ("/api/twitter_v2/user/tweets", "query"),
            SearchType::Hashtags => ("/api/twitter_v2/search/tweets", "hashtags"),
            SearchType::Keywords => ("/api/twitter_v2/search/tweets", "query"),
        };
        let params = [
            (param, query.to_string()),
            ("type", "all".to_string()),
            ("limit", self.settings.limit.to_string()),
        ];

        let body = self.get_json(path, &params).await?;
        Ok(decode_each(records_of(&body, &["results"]), "tweets"))
    }
}

/// First array found under any of `keys`, in order. Missing → empty.
fn records_of(body: &Value, keys: &[&str]) -> Vec<Value> {
    keys.iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Decode every record, dropping (and logging) those that don't fit `T`.
fn decode_each<T: DeserializeOwned>(records: Vec<Value>, what: &str) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Dropping malformed {} record: {}", what, e);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(
            "Dropped {} of {} malformed {} records",
            total - decoded.len(),
            total,
            what
        );
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentimentObject, Topic};
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&server.url(), "secret-key", ApiConfig::default()).unwrap()
    }

    #[test]
    fn test_records_of_prefers_results_then_result() {
        let body = json!({"results": [1], "result": [2]});
        assert_eq!(records_of(&body, &["results", "result"]), vec![json!(1)]);

        let body = json!({"result": [2]});
        assert_eq!(records_of(&body, &["results", "result"]), vec![json!(2)]);

        let body = json!({"status": "ok"});
        assert!(records_of(&body, &["results", "result"]).is_empty());
    }

    #[tokio::test]
    async fn test_social_mapper_sends_auth_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/social_mapper/twitter/v2")
            .match_header("authorization", "secret-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fullname".into(), "Jane Doe".into()),
                Matcher::UrlEncoded("photo".into(), "https://example.com/p.jpg".into()),
                Matcher::UrlEncoded("max_profiles".into(), "300".into()),
                Matcher::UrlEncoded("only_first_equal".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": [{"url": "https://twitter.com/jane", "name": "Jane"}]}"#)
            .create_async()
            .await;

        let records = client_for(&server)
            .social_mapper("twitter", "Jane Doe", "https://example.com/p.jpg")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], json!("Jane"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/social_mapper/myspace/v2")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = client_for(&server)
            .social_mapper("myspace", "Jane", "https://example.com/p.jpg")
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/chatgpt/topics")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let result = client_for(&server)
            .classify::<Topic>(ClassifyAttribute::Topics, "hello")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_classify_decodes_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/chatgpt/objects_sentiment")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "prices are up again".into()),
                Matcher::UrlEncoded("delayed".into(), "1".into()),
                Matcher::UrlEncoded("timeout".into(), "110".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("in_english".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"results": [{"object": "prices", "kind": "negative"}, 7]}"#)
            .create_async()
            .await;

        let sentiments: Vec<SentimentObject> = client_for(&server)
            .classify(ClassifyAttribute::ObjectsSentiment, "prices are up again")
            .await
            .unwrap();

        assert_eq!(sentiments.len(), 1);
        assert!(sentiments[0].is_negative());
        assert_eq!(sentiments[0].object, "prices");
    }

    #[tokio::test]
    async fn test_tweets_endpoint_per_search_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/twitter_v2/search/tweets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("hashtags".into(), "rust".into()),
                Matcher::UrlEncoded("type".into(), "all".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"results": [{"id": 1, "text": "hi", "like_count": 3, "view_count": 10}]}"#)
            .create_async()
            .await;

        let tweets = client_for(&server)
            .tweets(SearchType::Hashtags, "rust")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].id, "1");
        assert_eq!(tweets[0].view_count, 10);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = ApiClient::new("https://api.example.com/", "secret-key", ApiConfig::default())
            .unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}
