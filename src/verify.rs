//! Feed Verification Module
//!
//! Framework for testing the configured endpoint against the live API to
//! determine whether the feed is reachable and returning parseable data.
//!
//! Use this before pointing the service at a new endpoint or after a feed
//! format change upstream.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::ingest::usgs::{self, FeatureErrorMode};
use crate::loader::CancelToken;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedVerification {
    pub endpoint: String,
    pub timestamp: String,
    pub status: VerificationStatus,
    pub endpoint_reachable: bool,
    pub feature_count: usize,
    pub record_count: usize,
    pub skipped_features: usize,
    pub error_message: Option<String>,
}

// ============================================================================
// Feed Verification
// ============================================================================

/// Fetches the configured feed once and reports what came back.
///
/// Parsing runs in isolation mode so a single malformed feature shows up
/// as `PartialSuccess` instead of masking the rest of the batch.
pub fn verify_feed(client: &reqwest::blocking::Client, config: &PipelineConfig) -> FeedVerification {
    let url = usgs::build_query_url(usgs::USGS_FDSN_URL, &config.query);

    let mut result = FeedVerification {
        endpoint: url.clone(),
        timestamp: Utc::now().to_rfc3339(),
        status: VerificationStatus::Failed,
        endpoint_reachable: false,
        feature_count: 0,
        record_count: 0,
        skipped_features: 0,
        error_message: None,
    };

    let body = match usgs::fetch_feed(client, &url, &config.fetch, &CancelToken::new()) {
        Ok(body) => {
            result.endpoint_reachable = true;
            body
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };

    // Count features through generic JSON first, so the report can tell
    // "document unusable" apart from "some features malformed".
    result.feature_count = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|doc| doc.get("features").and_then(|f| f.as_array().map(|a| a.len())))
        .unwrap_or(0);

    match usgs::parse_feed(&body, FeatureErrorMode::SkipAndLog) {
        Ok(records) => {
            result.record_count = records.len();
            result.skipped_features = result.feature_count.saturating_sub(records.len());
            result.status = if result.record_count == 0 && result.feature_count > 0 {
                VerificationStatus::Failed
            } else if result.skipped_features > 0 {
                VerificationStatus::PartialSuccess
            } else {
                VerificationStatus::Success
            };
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    result
}

/// Renders a verification report as pretty JSON for console inspection.
pub fn format_report(report: &FeedVerification) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!("report serialization failed: {}", e))
}
