/// USGS FDSN Event API Client
///
/// Retrieves the earthquake event feed in GeoJSON form from the USGS
/// FDSN event service and maps each feature into an `EarthquakeRecord`.
///
/// API Documentation: https://earthquake.usgs.gov/fdsnws/event/1/
/// Feed endpoint: https://earthquake.usgs.gov/fdsnws/event/1/query

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::{FetchConfig, PipelineConfig, QueryPrefs};
use crate::loader::CancelToken;
use crate::logging::{self, DataSource};
use crate::model::{EarthquakeRecord, FeedError};

pub const USGS_FDSN_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

// ============================================================================
// GeoJSON Response Structures
// ============================================================================

/// Envelope of the GeoJSON feature collection. Only `features` is read;
/// everything else in the document is ignored. Features stay raw here so
/// one malformed feature is distinguishable from a malformed document.
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Value>,
}

/// One seismic event feature
#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
}

/// The subset of `properties` this service consumes. All four fields are
/// required; a feature missing any of them is malformed as a whole.
#[derive(Debug, Deserialize)]
struct FeatureProperties {
    mag: f64,
    place: String,
    /// Epoch milliseconds, UTC.
    time: i64,
    url: String,
}

/// How to treat a malformed feature within an otherwise valid document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureErrorMode {
    /// Stock behavior: the first malformed feature aborts the remaining batch.
    AbortBatch,
    /// Hardened behavior: skip and log the malformed feature, keep the rest.
    SkipAndLog,
}

// ============================================================================
// Query URL Construction
// ============================================================================

/// Builds the event query URL from the base endpoint and filter preferences.
///
/// Example output:
///   https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&eventtype=earthquake&minmag=1.9&orderby=time&limit=10
pub fn build_query_url(base: &str, prefs: &QueryPrefs) -> String {
    format!(
        "{}?format=geojson&eventtype=earthquake&minmag={}&orderby={}&limit={}",
        base,
        prefs.min_magnitude,
        prefs.order_by.as_query_value(),
        prefs.limit
    )
}

// ============================================================================
// Fetcher
// ============================================================================

/// Builds the shared blocking HTTP client from fetch configuration.
///
/// Automatic redirects are disabled; `fetch_feed` chases them itself so
/// the hop count stays bounded and observable.
pub fn build_http_client(config: &FetchConfig) -> Result<reqwest::blocking::Client, FeedError> {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.read_timeout_ms))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| FeedError::ConnectionFailure(e.to_string()))
}

/// Performs the HTTP GET and returns the raw response body.
///
/// # Behavior
/// - An empty URL is "nothing to fetch": an empty body, not an error.
/// - 200 → the whole body as UTF-8 text.
/// - 3xx → the `Location` header is followed, up to `config.max_redirects`
///   hops; past that the fetch fails with `TooManyRedirects`.
/// - Any other status → `HttpError` with the status code.
/// - The cancel token is checked before every hop.
///
/// This is a blocking, synchronous network call. Keep it off any
/// interactive thread; `loader::FeedLoader` does the scheduling.
pub fn fetch_feed(
    client: &reqwest::blocking::Client,
    url: &str,
    config: &FetchConfig,
    cancel: &CancelToken,
) -> Result<String, FeedError> {
    if url.is_empty() {
        return Ok(String::new());
    }

    let mut target =
        reqwest::Url::parse(url).map_err(|_| FeedError::MalformedUrl(url.to_string()))?;

    for _ in 0..=config.max_redirects {
        if cancel.is_cancelled() {
            return Err(FeedError::Cancelled);
        }

        let response = client
            .get(target.clone())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FeedError::ConnectionFailure(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return response
                .text()
                .map_err(|e| FeedError::ConnectionFailure(e.to_string()));
        }

        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| FeedError::HttpError(status.as_u16()))?;
            logging::debug(
                DataSource::Usgs,
                None,
                &format!("Server redirected ({}) to {}", status.as_u16(), location),
            );
            // Location may be relative; resolve it against the current URL.
            target = target
                .join(location)
                .map_err(|_| FeedError::MalformedUrl(location.to_string()))?;
            continue;
        }

        return Err(FeedError::HttpError(status.as_u16()));
    }

    Err(FeedError::TooManyRedirects(config.max_redirects))
}

// ============================================================================
// Parser
// ============================================================================

/// Parses a GeoJSON feature collection into earthquake records.
///
/// An empty body yields an empty batch. A document that does not parse as
/// a feature collection fails whole (`DocumentParseFailure`). A feature
/// missing a required field fails per `mode`: abort the remaining batch,
/// or skip and log it. Records come out in source order, every field
/// populated.
pub fn parse_feed(body: &str, mode: FeatureErrorMode) -> Result<Vec<EarthquakeRecord>, FeedError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| FeedError::DocumentParseFailure(e.to_string()))?;

    let total = collection.features.len();
    let mut records = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for (index, raw) in collection.features.into_iter().enumerate() {
        match serde_json::from_value::<Feature>(raw) {
            Ok(feature) => {
                let p = feature.properties;
                records.push(EarthquakeRecord {
                    magnitude: p.mag,
                    location: p.place,
                    occurred_at_ms: p.time,
                    info_url: p.url,
                });
            }
            Err(e) => match mode {
                FeatureErrorMode::AbortBatch => {
                    return Err(FeedError::FeatureExtractionFailure {
                        index,
                        reason: e.to_string(),
                    });
                }
                FeatureErrorMode::SkipAndLog => {
                    skipped += 1;
                    logging::warn(
                        DataSource::Usgs,
                        None,
                        &format!("Skipping malformed feature {}: {}", index, e),
                    );
                }
            },
        }
    }

    if skipped > 0 {
        logging::log_fetch_summary(DataSource::Usgs, total, records.len(), skipped);
    }

    Ok(records)
}

// ============================================================================
// Pipeline Entry
// ============================================================================

/// Fetches and parses the feed in one call.
///
/// This is the pipeline boundary: every failure kind is logged with its
/// cause here and returned as a typed error, never a panic. The caller
/// treats an error as "no data" and decides when to re-invoke.
pub fn fetch_earthquake_data(
    client: &reqwest::blocking::Client,
    url: &str,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Result<Vec<EarthquakeRecord>, FeedError> {
    let body = fetch_feed(client, url, &config.fetch, cancel).map_err(|e| {
        logging::log_feed_failure(url, "Feed fetch", &e);
        e
    })?;

    // A fetch superseded mid-flight discards its result before parsing.
    if cancel.is_cancelled() {
        let e = FeedError::Cancelled;
        logging::log_feed_failure(url, "Feed fetch", &e);
        return Err(e);
    }

    let mode = if config.isolate_bad_features {
        FeatureErrorMode::SkipAndLog
    } else {
        FeatureErrorMode::AbortBatch
    };

    parse_feed(&body, mode).map_err(|e| {
        logging::log_feed_failure(url, "Feed parse", &e);
        e
    })
}

// ============================================================================
// Tests
// ============================================================================
