//! Data models for both tools.
//!
//! Remote records (tweets, classification results) keep every field the
//! API sent so they can be cached and re-emitted unmodified; only the
//! fields the analysis reads are typed.

use crate::error::DecodeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A social profile discovered by the face search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile {
    /// Profile URL on the platform.
    pub url: String,
    /// Display label (title, name, or first + last name).
    pub label: String,
}

/// Known shapes of a social-mapper search record.
///
/// Decoding tries the shapes in declaration order: `title`, then `name`,
/// then `first_name`/`last_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRecord {
    Titled {
        url: String,
        title: String,
    },
    Named {
        url: String,
        name: String,
    },
    Split {
        url: String,
        first_name: Option<String>,
        last_name: Option<String>,
    },
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl ProfileRecord {
    /// Decode one raw record, rejecting anything that matches no shape.
    pub fn decode(record: &Value) -> Result<Self, DecodeError> {
        let obj = record.as_object().ok_or(DecodeError::NotAnObject)?;
        let url = non_empty_str(obj, "url")
            .ok_or(DecodeError::MissingUrl)?
            .to_string();

        if let Some(title) = non_empty_str(obj, "title") {
            return Ok(ProfileRecord::Titled {
                url,
                title: title.to_string(),
            });
        }

        if let Some(name) = non_empty_str(obj, "name") {
            return Ok(ProfileRecord::Named {
                url,
                name: name.to_string(),
            });
        }

        let first_name = non_empty_str(obj, "first_name").map(String::from);
        let last_name = non_empty_str(obj, "last_name").map(String::from);
        if first_name.is_none() && last_name.is_none() {
            return Err(DecodeError::MissingLabel { url });
        }

        Ok(ProfileRecord::Split {
            url,
            first_name,
            last_name,
        })
    }

    /// Collapse the record into a `Profile`.
    pub fn into_profile(self) -> Profile {
        match self {
            ProfileRecord::Titled { url, title } => Profile { url, label: title },
            ProfileRecord::Named { url, name } => Profile { url, label: name },
            ProfileRecord::Split {
                url,
                first_name,
                last_name,
            } => {
                let label = [first_name, last_name]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                Profile { url, label }
            }
        }
    }
}

/// How tweets are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Username,
    Hashtags,
    Keywords,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Username => "username",
            SearchType::Hashtags => "hashtags",
            SearchType::Keywords => "keywords",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tweet as returned by the twitter_v2 endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub view_count: u64,
    /// Fields the analysis does not read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tweet {
    /// Public permalink for the tweet.
    pub fn url(&self) -> String {
        format!("https://x.com/_/status/{}", self.id)
    }

    /// Tweet text on a single line.
    pub fn single_line_text(&self) -> String {
        self.text.replace(['\n', '\r'], "")
    }
}

/// One entry of an `objects_sentiment` classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentObject {
    #[serde(default)]
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SentimentObject {
    pub fn is_negative(&self) -> bool {
        self.kind.as_deref() == Some("negative")
    }
}

/// One entry of a `topics` classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default)]
    pub topic: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Topic {
    /// Identity key: two topics are the same entry only if every field matches.
    pub fn identity(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.topic.clone())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
