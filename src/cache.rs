//! On-disk JSON cache for fetched tweets and classification results.
//!
//! Each file wraps its payload in a [`CacheEntry`] carrying a SHA-256
//! fingerprint of the search, the original query and a creation time.
//! Entries whose fingerprint doesn't match, that fail to parse, or that
//! are older than the configured maximum age are treated as misses.

use crate::error::CacheError;
use crate::models::SearchType;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Anything above a century is treated as a century.
const MAX_AGE_HOURS_CAP: u64 = 24 * 365 * 100;

/// Which result a cache file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Tweets,
    Sentiments,
    Topics,
}

impl CacheKind {
    fn file_prefix(&self) -> &'static str {
        match self {
            CacheKind::Tweets => "tweets",
            CacheKind::Sentiments => "tweets_sentiments",
            CacheKind::Topics => "tweets_topics",
        }
    }
}

/// A cached payload plus the search it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub fingerprint: String,
    pub query: String,
    pub search_type: SearchType,
    pub created_at: DateTime<Utc>,
    pub payload: T,
}

/// SHA-256 over search type and query, hex encoded.
pub fn fingerprint(search_type: SearchType, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(search_type.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}

/// Make a query usable as part of a file name.
pub fn sanitize_query(query: &str) -> String {
    let cleaned: String = query
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '#' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Directory-backed result cache.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
    max_age: Option<Duration>,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>, max_age_hours: Option<u64>) -> Self {
        Self {
            dir: dir.into(),
            max_age: max_age_hours.map(|h| Duration::hours(h.min(MAX_AGE_HOURS_CAP) as i64)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `kind` results for `query`.
    pub fn path_for(&self, kind: CacheKind, query: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", kind.file_prefix(), sanitize_query(query)))
    }

    /// Load a fresh entry, or `None` on any kind of miss.
    pub fn load<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        search_type: SearchType,
        query: &str,
    ) -> Option<CacheEntry<T>> {
        self.load_at(kind, search_type, query, Utc::now())
    }

    /// Like [`ResultCache::load`] with an explicit notion of "now".
    pub fn load_at<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        search_type: SearchType,
        query: &str,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        let path = self.path_for(kind, query);
        if !path.exists() {
            debug!("Cache miss: {}", path.display());
            return None;
        }

        let entry: CacheEntry<T> = match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                return None;
            }
        };

        if entry.fingerprint != fingerprint(search_type, query) {
            warn!(
                "Ignoring cache file {}: it belongs to a different search ({} '{}')",
                path.display(),
                entry.search_type,
                entry.query
            );
            return None;
        }

        if let Some(max_age) = self.max_age {
            if now - entry.created_at > max_age {
                info!(
                    "Cache file {} is stale (created {})",
                    path.display(),
                    entry.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                return None;
            }
        }

        debug!("Cache hit: {}", path.display());
        Some(entry)
    }

    /// Write `payload` for this search, replacing any previous entry.
    pub fn store<T: Serialize>(
        &self,
        kind: CacheKind,
        search_type: SearchType,
        query: &str,
        payload: T,
    ) -> Result<PathBuf, CacheError> {
        let path = self.path_for(kind, query);
        let entry = CacheEntry {
            fingerprint: fingerprint(search_type, query),
            query: query.to_string(),
            search_type,
            created_at: Utc::now(),
            payload,
        };

        let content = serde_json::to_string_pretty(&entry).map_err(|source| CacheError::Json {
            path: path.display().to_string(),
            source,
        })?;

        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        std::fs::write(&path, content).map_err(|source| CacheError::Io {
            path: path.display().to_string(),
            source,
        })?;

        debug!("Wrote cache file {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tweet;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_tweets() -> Vec<Tweet> {
        serde_json::from_value(json!([
            {"id": "1", "text": "first", "like_count": 1, "view_count": 10, "lang": "en"},
            {"id": "2", "text": "second", "like_count": 0, "view_count": 5}
        ]))
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path(), None);
        let tweets = sample_tweets();

        let path = cache
            .store(CacheKind::Tweets, SearchType::Username, "jack", &tweets)
            .unwrap();
        assert_eq!(path, dir.path().join("tweets_jack.json"));

        let entry: CacheEntry<Vec<Tweet>> = cache
            .load(CacheKind::Tweets, SearchType::Username, "jack")
            .unwrap();
        assert_eq!(entry.payload, tweets);
        assert_eq!(entry.query, "jack");
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path(), None);
        let entry: Option<CacheEntry<Vec<Tweet>>> =
            cache.load(CacheKind::Topics, SearchType::Keywords, "nothing");
        assert!(entry.is_none());
    }

    #[test]
    fn test_fingerprint_mismatch_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path(), None);
        cache
            .store(CacheKind::Tweets, SearchType::Username, "rust", sample_tweets())
            .unwrap();

        // Same file name, different search type.
        let entry: Option<CacheEntry<Vec<Tweet>>> =
            cache.load(CacheKind::Tweets, SearchType::Keywords, "rust");
        assert!(entry.is_none());
    }

    #[test]
    fn test_stale_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path(), Some(1));
        cache
            .store(CacheKind::Tweets, SearchType::Hashtags, "rust", sample_tweets())
            .unwrap();

        let fresh: Option<CacheEntry<Vec<Tweet>>> =
            cache.load(CacheKind::Tweets, SearchType::Hashtags, "rust");
        assert!(fresh.is_some());

        let later = Utc::now() + Duration::hours(2);
        let stale: Option<CacheEntry<Vec<Tweet>>> =
            cache.load_at(CacheKind::Tweets, SearchType::Hashtags, "rust", later);
        assert!(stale.is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path(), None);
        let path = cache.path_for(CacheKind::Sentiments, "rust");
        std::fs::write(&path, "[{\"id\": 1}]").unwrap();

        let entry: Option<CacheEntry<Vec<Tweet>>> =
            cache.load(CacheKind::Sentiments, SearchType::Keywords, "rust");
        assert!(entry.is_none());
    }

    #[test]
    fn test_sanitize_query() {
        assert_eq!(sanitize_query("#rust"), "#rust");
        assert_eq!(sanitize_query("open source"), "open_source");
        assert_eq!(sanitize_query("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_query(".."), "_");
        assert_eq!(sanitize_query(""), "_");
    }

    #[test]
    fn test_fingerprint_depends_on_type_and_query() {
        let a = fingerprint(SearchType::Username, "rust");
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint(SearchType::Keywords, "rust"));
        assert_ne!(a, fingerprint(SearchType::Username, "rustlang"));
        assert_eq!(a, fingerprint(SearchType::Username, "rust"));
    }
}
