//! Tweet analysis: statistics, rankings, classification fan-out and the
//! cache-aware pipeline feeding them.

pub mod aggregator;
pub mod classify;
pub mod pipeline;

pub use aggregator::*;
pub use classify::{classify_all, classify_tweets};
pub use pipeline::{load_classifications, load_tweets, Session};

use crate::config::ReportConfig;
use crate::models::{SearchType, Tweet};
use serde::Serialize;

/// Everything the post-analysis report shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostAnalysis {
    pub query: String,
    pub search_type: SearchType,
    pub stats: TweetStats,
    pub negative_topics: Vec<NegativeTopic>,
    pub top_viewed: Vec<Tweet>,
    pub trending_topics: Vec<TrendingTopic>,
}

impl PostAnalysis {
    pub fn build(
        query: &str,
        search_type: SearchType,
        tweets: &[Tweet],
        sentiments: &SentimentMap,
        topics: &TopicMap,
        settings: &ReportConfig,
    ) -> Self {
        let stats = TweetStats::from_tweets(tweets);

        Self {
            query: query.to_string(),
            search_type,
            negative_topics: negative_topics(tweets, sentiments, &stats, settings.top_negative),
            top_viewed: top_viewed(tweets, settings.top_viewed),
            trending_topics: trending_topics(
                tweets,
                topics,
                &settings.topic_blocklist,
                settings.top_topics,
            ),
            stats,
        }
    }
}
