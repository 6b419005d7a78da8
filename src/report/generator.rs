//! Console and JSON report generation.
//!
//! Text output mirrors what an analyst reads in a terminal: colored
//! section headings, one line per item. JSON output is the structured
//! result, for piping into other tools.

use crate::analysis::{NegativeTopic, PostAnalysis, TrendingTopic, TweetStats};
use crate::models::Tweet;
use crate::search::SearchOutcome;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// One `Name: ..., URL: ...` line per discovered profile.
pub fn generate_profiles_report(outcome: &SearchOutcome) -> String {
    if outcome.profiles.is_empty() {
        return "No profiles found.\n".to_string();
    }

    let mut output = String::new();
    for profile in &outcome.profiles {
        output.push_str(&format!("Name: {}, URL: {}\n", profile.label, profile.url));
    }
    output
}

/// Full post-analysis report.
pub fn generate_post_report(analysis: &PostAnalysis, verbose: bool) -> String {
    let mut output = String::new();

    output.push_str(&generate_stats_section(&analysis.stats));
    output.push_str(&generate_negative_section(&analysis.negative_topics, verbose));
    output.push_str(&generate_top_viewed_section(&analysis.top_viewed, verbose));
    output.push_str(&generate_trending_section(&analysis.trending_topics));

    output
}

fn generate_stats_section(stats: &TweetStats) -> String {
    let block = format!(
        "\nTotal tweets: {}\nTotal likes: {}\nMedian likes per post: {}\nTotal views: {}\nMedian views per post: {}\n",
        stats.total_tweets,
        stats.total_likes,
        stats.median_likes,
        stats.total_views,
        stats.median_views
    );
    format!("{}\n", block.green())
}

fn generate_negative_section(topics: &[NegativeTopic], verbose: bool) -> String {
    if topics.is_empty() {
        return format!("{}\n", "No negative sentiments found.".green());
    }

    let mut section = String::new();
    section.push_str(&format!(
        "{}\n",
        format!(
            "Top {} negative sentiment topics with tweet links:",
            topics.len()
        )
        .green()
    ));

    for topic in topics {
        section.push_str(&format!(
            "{}\n",
            format!(
                "- {} (found in {} tweets, {:.2}% of total views):",
                topic.object, topic.count, topic.view_percentage
            )
            .cyan()
        ));

        for tweet in &topic.tweets {
            if verbose {
                section.push_str(&format!("   - URL: {}\n", tweet.url().bright_black()));
            }
            section.push_str(&format!("  - {}\n", tweet.single_line_text().red()));
        }
    }

    section
}

fn generate_top_viewed_section(tweets: &[Tweet], verbose: bool) -> String {
    if tweets.is_empty() {
        return format!("{}\n", "No tweets found.".red());
    }

    let mut section = String::new();
    section.push_str(&format!(
        "\n{}\n",
        format!("Top {} most viewed tweets:", tweets.len()).green()
    ));

    for tweet in tweets {
        if verbose {
            section.push_str(&format!("- URL: {}\n", tweet.url().bright_black()));
            section.push_str(&format!(
                "  Views: {}, Likes: {}\n",
                tweet.view_count, tweet.like_count
            ));
        }
        section.push_str(&format!("  - {}\n", tweet.single_line_text().cyan()));
    }

    section
}

fn generate_trending_section(topics: &[TrendingTopic]) -> String {
    if topics.is_empty() {
        return "No topics found after applying blocklist.\n".to_string();
    }

    let mut section = String::new();
    section.push_str(&format!("\n{}\n", "Trending topics:".green()));
    for topic in topics {
        section.push_str(&format!("  - {}: {}\n", topic.topic, topic.count));
    }

    section
}

/// Generate a JSON report.
pub fn generate_json_report<T: Serialize + ?Sized>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
