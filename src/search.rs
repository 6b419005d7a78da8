//! Reverse face/name search across social platforms.
//!
//! One fan-out task per platform; successful platforms contribute their
//! decoded profiles, failed platforms are logged and skipped.

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::fanout::{Batch, FanOut, Progress, Task};
use crate::models::{Profile, ProfileRecord};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// What to look for.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub platforms: Vec<String>,
    pub name: String,
    pub photo_url: String,
}

/// Combined search result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    /// Profiles from every successful platform, in completion order.
    pub profiles: Vec<Profile>,
    /// Platforms whose request failed, with the reason.
    pub failed_platforms: Vec<(String, String)>,
}

/// Turn raw records into profiles, logging the ones that match no known shape.
pub fn decode_profiles(platform: &str, records: Vec<Value>) -> Vec<Profile> {
    records
        .iter()
        .filter_map(|record| match ProfileRecord::decode(record) {
            Ok(decoded) => Some(decoded.into_profile()),
            Err(e) => {
                warn!("Skipping {} record: {}", platform, e);
                None
            }
        })
        .collect()
}

/// Search every platform concurrently.
pub async fn search_profiles<P>(
    client: &ApiClient,
    fanout: FanOut,
    timeout: Duration,
    request: &SearchRequest,
    progress: &P,
) -> SearchOutcome
where
    P: Progress + ?Sized,
{
    let batch: Batch<String, Vec<Profile>, ApiError> = request
        .platforms
        .iter()
        .map(|platform| {
            let client = client.clone();
            let platform_name = platform.clone();
            let name = request.name.clone();
            let photo_url = request.photo_url.clone();

            Task::new(platform.clone(), timeout, async move {
                let records = client
                    .social_mapper(&platform_name, &name, &photo_url)
                    .await?;
                Ok(decode_profiles(&platform_name, records))
            })
        })
        .collect();

    info!("Searching {} platforms", batch.len());
    let aggregate = fanout.run(batch, progress).await;
    let failed_platforms = aggregate.failures.clone();

    SearchOutcome {
        profiles: aggregate.into_flat(),
        failed_platforms,
    }
}
