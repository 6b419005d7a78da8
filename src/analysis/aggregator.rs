//! Tweet statistics and rankings.
//!
//! Counting ties are broken by first appearance, walking tweets in the
//! order the API returned them.

use crate::models::{SentimentObject, Topic, Tweet};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Sentiment results keyed by tweet id.
pub type SentimentMap = BTreeMap<String, Vec<SentimentObject>>;

/// Topic results keyed by tweet id.
pub type TopicMap = BTreeMap<String, Vec<Topic>>;

/// Totals and medians over a set of tweets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TweetStats {
    pub total_tweets: usize,
    pub total_likes: u64,
    pub median_likes: f64,
    pub total_views: u64,
    pub median_views: f64,
}

impl TweetStats {
    pub fn from_tweets(tweets: &[Tweet]) -> Self {
        if tweets.is_empty() {
            return Self::default();
        }

        let likes: Vec<u64> = tweets.iter().map(|t| t.like_count).collect();
        let views: Vec<u64> = tweets.iter().map(|t| t.view_count).collect();

        Self {
            total_tweets: tweets.len(),
            total_likes: likes.iter().sum(),
            median_likes: median(&likes),
            total_views: views.iter().sum(),
            median_views: median(&views),
        }
    }
}

/// Median; for an even count, the mean of the two middle values. Empty → 0.
pub fn median(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    }
}

/// Round to two decimal places, exact halves to even, matching `{:.2}`.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        round2(part / total * 100.0)
    } else {
        0.0
    }
}

/// Count items, most common first, ties in first-seen order.
pub fn rank_by_count<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut counts: HashMap<K, (usize, usize)> = HashMap::new();
    for (index, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, index)).0 += 1;
    }

    let mut ranked: Vec<(K, usize, usize)> = counts
        .into_iter()
        .map(|(key, (count, first_seen))| (key, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .map(|(key, count, _)| (key, count))
        .collect()
}

/// A sentiment object that attracted negative sentiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeTopic {
    pub object: String,
    /// Number of negative sentiment entries naming this object.
    pub count: usize,
    pub tweet_percentage: f64,
    /// Views of the related tweets as a share of all views, two decimals.
    pub view_percentage: f64,
    /// Related tweets, most viewed first.
    pub tweets: Vec<Tweet>,
}

fn negative_entries<'a>(sentiments: &'a SentimentMap, tweet: &Tweet) -> Vec<&'a SentimentObject> {
    sentiments
        .get(&tweet.id)
        .map(|list| list.iter().filter(|s| s.is_negative()).collect())
        .unwrap_or_default()
}

/// Objects most often tagged with negative sentiment.
pub fn negative_topics(
    tweets: &[Tweet],
    sentiments: &SentimentMap,
    stats: &TweetStats,
    limit: usize,
) -> Vec<NegativeTopic> {
    let objects = tweets.iter().flat_map(|tweet| {
        negative_entries(sentiments, tweet)
            .into_iter()
            .map(|s| s.object.clone())
    });

    rank_by_count(objects)
        .into_iter()
        .take(limit)
        .map(|(object, count)| {
            let mut related: Vec<Tweet> = tweets
                .iter()
                .filter(|tweet| {
                    negative_entries(sentiments, tweet)
                        .iter()
                        .any(|s| s.object == object)
                })
                .cloned()
                .collect();
            related.sort_by(|a, b| b.view_count.cmp(&a.view_count));

            let related_views: u64 = related.iter().map(|t| t.view_count).sum();

            NegativeTopic {
                tweet_percentage: percentage(count as f64, stats.total_tweets as f64),
                view_percentage: percentage(related_views as f64, stats.total_views as f64),
                object,
                count,
                tweets: related,
            }
        })
        .collect()
}

/// The `n` most viewed tweets.
pub fn top_viewed(tweets: &[Tweet], n: usize) -> Vec<Tweet> {
    let mut sorted = tweets.to_vec();
    sorted.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    sorted.truncate(n);
    sorted
}

/// A topic and how many identical entries were seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingTopic {
    pub topic: String,
    pub count: usize,
}

/// Most frequent topic entries, skipping blocklisted labels.
pub fn trending_topics(
    tweets: &[Tweet],
    topics: &TopicMap,
    blocklist: &[String],
    limit: usize,
) -> Vec<TrendingTopic> {
    let mut labels: HashMap<String, String> = HashMap::new();

    let entries = tweets
        .iter()
        .filter_map(|tweet| topics.get(&tweet.id))
        .flatten()
        .filter(|t| !t.topic.is_empty() && !blocklist.iter().any(|b| b == &t.topic))
        .map(|t| {
            let identity = t.identity();
            labels
                .entry(identity.clone())
                .or_insert_with(|| t.topic.clone());
            identity
        })
        .collect::<Vec<_>>();

    rank_by_count(entries)
        .into_iter()
        .take(limit)
        .map(|(identity, count)| TrendingTopic {
            topic: labels.get(&identity).cloned().unwrap_or_default(),
            count,
        })
        .collect()
}
