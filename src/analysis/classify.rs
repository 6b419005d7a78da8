//! Per-tweet sentiment and topic classification.
//!
//! Each classification is a batch of one task per tweet, keyed by tweet
//! id. A failed tweet maps to an empty result list.

use crate::analysis::aggregator::{SentimentMap, TopicMap};
use crate::api::{ApiClient, ClassifyAttribute};
use crate::error::ApiError;
use crate::fanout::{Batch, FanOut, Progress, Task};
use crate::models::Tweet;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// Classify every tweet's text with one attribute.
pub async fn classify_all<T, P>(
    client: &ApiClient,
    fanout: FanOut,
    timeout: Duration,
    attribute: ClassifyAttribute,
    tweets: &[Tweet],
    progress: &P,
) -> BTreeMap<String, Vec<T>>
where
    T: DeserializeOwned + Send + 'static,
    P: Progress + ?Sized,
{
    let batch: Batch<String, Vec<T>, ApiError> = tweets
        .iter()
        .map(|tweet| {
            let client = client.clone();
            let text = tweet.text.clone();
            Task::new(tweet.id.clone(), timeout, async move {
                client.classify(attribute, &text).await
            })
        })
        .collect();

    info!(
        "Running {} classification on {} tweets",
        attribute.as_str(),
        batch.len()
    );

    let aggregate = fanout.run(batch, progress).await;
    if !aggregate.failures.is_empty() {
        info!(
            "{} of {} {} requests failed",
            aggregate.failures.len(),
            aggregate.len(),
            attribute.as_str()
        );
    }

    aggregate.into_keyed()
}

/// Sentiment and topic results for a set of tweets.
pub async fn classify_tweets<P>(
    client: &ApiClient,
    fanout: FanOut,
    timeout: Duration,
    tweets: &[Tweet],
    progress: &P,
) -> (SentimentMap, TopicMap)
where
    P: Progress + ?Sized,
{
    let sentiments = classify_all(
        client,
        fanout,
        timeout,
        ClassifyAttribute::ObjectsSentiment,
        tweets,
        progress,
    )
    .await;

    let topics = classify_all(
        client,
        fanout,
        timeout,
        ClassifyAttribute::Topics,
        tweets,
        progress,
    )
    .await;

    (sentiments, topics)
}
