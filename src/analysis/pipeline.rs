//! Cache-aware fetch and classification flow for `post-analysis`.
//!
//! Tweets are read from the cache when a fresh entry exists and fetched
//! otherwise. Sentiments and topics are reused only when both cached
//! files are fresh; otherwise both are recomputed and rewritten.

use crate::analysis::aggregator::{SentimentMap, TopicMap};
use crate::analysis::classify::classify_tweets;
use crate::api::ApiClient;
use crate::cache::{CacheKind, ResultCache};
use crate::fanout::FanOut;
use crate::models::{SearchType, Tweet};
use crate::progress_bar;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Everything one analysis run needs besides the query.
#[derive(Debug, Clone)]
pub struct Session {
    pub client: ApiClient,
    pub fanout: FanOut,
    pub cache: ResultCache,
    /// Per-request timeout for classification tasks.
    pub timeout: Duration,
    /// Use cached entries. Writes happen either way.
    pub read_cache: bool,
    pub show_progress: bool,
}

/// Number of distinct tweet ids; one classification task runs per id.
pub fn distinct_ids(tweets: &[Tweet]) -> usize {
    tweets
        .iter()
        .map(|t| t.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Cached or freshly fetched tweets. A failed fetch yields no tweets.
pub async fn load_tweets(session: &Session, search_type: SearchType, query: &str) -> Vec<Tweet> {
    if session.read_cache {
        if let Some(entry) = session
            .cache
            .load::<Vec<Tweet>>(CacheKind::Tweets, search_type, query)
        {
            info!("Loaded {} tweets from cache", entry.payload.len());
            return entry.payload;
        }
    }

    if session.show_progress {
        println!("Extracting tweets, please wait...");
    }

    let tweets = match session.client.tweets(search_type, query).await {
        Ok(tweets) => tweets,
        Err(e) => {
            warn!("Failed to fetch tweets for {} '{}': {}", search_type, query, e);
            return Vec::new();
        }
    };
    info!("Fetched {} tweets", tweets.len());

    if !tweets.is_empty() {
        if let Err(e) = session
            .cache
            .store(CacheKind::Tweets, search_type, query, &tweets)
        {
            warn!("Failed to cache tweets: {}", e);
        }
    }

    tweets
}

/// Cached or freshly computed sentiments and topics for `tweets`.
pub async fn load_classifications(
    session: &Session,
    search_type: SearchType,
    query: &str,
    tweets: &[Tweet],
) -> (SentimentMap, TopicMap) {
    if session.read_cache {
        let sentiments = session
            .cache
            .load::<SentimentMap>(CacheKind::Sentiments, search_type, query);
        let topics = session
            .cache
            .load::<TopicMap>(CacheKind::Topics, search_type, query);

        if let (Some(sentiments), Some(topics)) = (sentiments, topics) {
            info!("Loaded sentiments and topics from cache");
            return (sentiments.payload, topics.payload);
        }
    }

    let pb = progress_bar(
        distinct_ids(tweets) * 2,
        "Analyzing tweets",
        !session.show_progress,
    );
    let (sentiments, topics) =
        classify_tweets(&session.client, session.fanout, session.timeout, tweets, &pb).await;
    pb.finish_and_clear();

    for result in [
        session
            .cache
            .store(CacheKind::Sentiments, search_type, query, &sentiments),
        session
            .cache
            .store(CacheKind::Topics, search_type, query, &topics),
    ] {
        if let Err(e) = result {
            warn!("Failed to cache classification results: {}", e);
        }
    }

    (sentiments, topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use mockito::{Matcher, Mock, ServerGuard};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    const TWEETS_BODY: &str = r#"{"results": [
        {"id": "1", "text": "fees are absurd", "like_count": 2, "view_count": 40},
        {"id": "2", "text": "great service", "like_count": 5, "view_count": 60}
    ]}"#;

    fn session(server: &ServerGuard, dir: &TempDir, max_age_hours: Option<u64>, read_cache: bool) -> Session {
        Session {
            client: ApiClient::new(&server.url(), "key", ApiConfig::default()).unwrap(),
            fanout: FanOut::new(2),
            cache: ResultCache::new(dir.path(), max_age_hours),
            timeout: Duration::from_secs(10),
            read_cache,
            show_progress: false,
        }
    }

    async fn mock_endpoint(server: &mut ServerGuard, path: &str, body: &str, hits: usize) -> Mock {
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    async fn run(session: &Session) -> (Vec<Tweet>, SentimentMap, TopicMap) {
        let tweets = load_tweets(session, SearchType::Username, "bank").await;
        let (sentiments, topics) =
            load_classifications(session, SearchType::Username, "bank", &tweets).await;
        (tweets, sentiments, topics)
    }

    #[tokio::test]
    async fn test_second_run_reads_everything_from_cache() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let tweets_mock = mock_endpoint(&mut server, "/api/twitter_v2/user/tweets", TWEETS_BODY, 1).await;
        let sentiment_mock = mock_endpoint(
            &mut server,
            "/api/chatgpt/objects_sentiment",
            r#"{"results": [{"object": "fees", "kind": "negative"}]}"#,
            2,
        )
        .await;
        let topics_mock = mock_endpoint(
            &mut server,
            "/api/chatgpt/topics",
            r#"{"results": [{"topic": "Banking"}]}"#,
            2,
        )
        .await;

        let session = session(&server, &dir, None, true);
        let first = run(&session).await;
        let second = run(&session).await;

        // One fetch, one classification per tweet and attribute, across both runs.
        tweets_mock.assert_async().await;
        sentiment_mock.assert_async().await;
        topics_mock.assert_async().await;

        assert_eq!(first.0.len(), 2);
        assert_eq!(first, second);
        assert_eq!(second.1["1"][0].object, "fees");
    }

    #[tokio::test]
    async fn test_no_cache_refetches_but_still_writes() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let tweets_mock = mock_endpoint(&mut server, "/api/twitter_v2/user/tweets", TWEETS_BODY, 2).await;
        let sentiment_mock =
            mock_endpoint(&mut server, "/api/chatgpt/objects_sentiment", r#"{"results": []}"#, 4).await;
        let topics_mock = mock_endpoint(&mut server, "/api/chatgpt/topics", r#"{"results": []}"#, 4).await;

        let session = session(&server, &dir, None, false);
        run(&session).await;
        run(&session).await;

        tweets_mock.assert_async().await;
        sentiment_mock.assert_async().await;
        topics_mock.assert_async().await;
        assert!(session.cache.path_for(CacheKind::Tweets, "bank").exists());
        assert!(session.cache.path_for(CacheKind::Topics, "bank").exists());
    }

    #[tokio::test]
    async fn test_one_stale_classification_file_recomputes_both() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let tweets_mock = mock_endpoint(&mut server, "/api/twitter_v2/user/tweets", TWEETS_BODY, 1).await;
        let sentiment_mock =
            mock_endpoint(&mut server, "/api/chatgpt/objects_sentiment", r#"{"results": []}"#, 4).await;
        let topics_mock = mock_endpoint(
            &mut server,
            "/api/chatgpt/topics",
            r#"{"results": [{"topic": "Banking"}]}"#,
            4,
        )
        .await;

        let session = session(&server, &dir, Some(1), true);
        run(&session).await;

        // Age the topics file past max_age_hours; sentiments stay fresh.
        let topics_path = session.cache.path_for(CacheKind::Topics, "bank");
        let mut entry: Value =
            serde_json::from_str(&std::fs::read_to_string(&topics_path).unwrap()).unwrap();
        entry["created_at"] = json!((chrono::Utc::now() - chrono::Duration::hours(3)).to_rfc3339());
        std::fs::write(&topics_path, entry.to_string()).unwrap();

        let (_, _, topics) = run(&session).await;

        tweets_mock.assert_async().await;
        sentiment_mock.assert_async().await;
        topics_mock.assert_async().await;
        assert_eq!(topics["2"][0].topic, "Banking");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_no_data_and_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        server
            .mock("GET", "/api/twitter_v2/user/tweets")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let session = session(&server, &dir, None, true);
        let tweets = load_tweets(&session, SearchType::Username, "bank").await;

        assert!(tweets.is_empty());
        assert!(!session.cache.path_for(CacheKind::Tweets, "bank").exists());
    }

    #[tokio::test]
    async fn test_empty_result_is_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let tweets_mock =
            mock_endpoint(&mut server, "/api/twitter_v2/user/tweets", r#"{"results": []}"#, 2).await;

        let session = session(&server, &dir, None, true);
        assert!(load_tweets(&session, SearchType::Username, "bank").await.is_empty());
        assert!(load_tweets(&session, SearchType::Username, "bank").await.is_empty());

        tweets_mock.assert_async().await;
        assert!(!session.cache.path_for(CacheKind::Tweets, "bank").exists());
    }

    #[test]
    fn test_distinct_ids_counts_repeated_tweets_once() {
        let tweets: Vec<Tweet> = serde_json::from_value(json!([
            {"id": "1", "text": "a"},
            {"id": "1", "text": "a again"},
            {"id": "2", "text": "b"}
        ]))
        .unwrap();
        assert_eq!(distinct_ids(&tweets), 2);
        assert_eq!(distinct_ids(&[]), 0);
    }
}
