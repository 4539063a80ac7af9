/// Core data types for the earthquake feed service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic, no I/O, and no external dependencies — only types.

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// A single seismic event from the USGS FDSN event feed.
///
/// Corresponds to one entry in the `features[]` array of a GeoJSON feature
/// collection, flattened from the nested `properties` object. A record is
/// only constructed once all four fields were extracted successfully from
/// one feature; partial features are skipped, never emitted half-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeRecord {
    /// Event magnitude. Typically in [0, 10+); range is unvalidated and
    /// taken as reported by the feed.
    pub magnitude: f64,
    /// Location description, e.g. "5km N of Example City". May or may not
    /// contain a directional-offset clause.
    pub location: String,
    /// Event time, milliseconds since the Unix epoch, UTC.
    pub occurred_at_ms: i64,
    /// USGS event page URL for further detail.
    pub info_url: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or parsing the earthquake feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The request URL string could not be parsed.
    MalformedUrl(String),
    /// The connection failed: timeout, refused, DNS.
    ConnectionFailure(String),
    /// Non-200, non-redirect HTTP response from the feed.
    HttpError(u16),
    /// The redirect chain exceeded the configured hop limit.
    TooManyRedirects(usize),
    /// The response body was not a parseable feature collection.
    DocumentParseFailure(String),
    /// A feature was missing a required field or carried the wrong type.
    /// Aborts the remaining batch unless per-feature isolation is enabled.
    FeatureExtractionFailure { index: usize, reason: String },
    /// The fetch was abandoned because a newer one superseded it.
    Cancelled,
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::MalformedUrl(url) => write!(f, "Malformed URL: {}", url),
            FeedError::ConnectionFailure(cause) => write!(f, "Connection failure: {}", cause),
            FeedError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FeedError::TooManyRedirects(hops) => {
                write!(f, "Too many redirects: gave up after {} hops", hops)
            }
            FeedError::DocumentParseFailure(cause) => write!(f, "Parse error: {}", cause),
            FeedError::FeatureExtractionFailure { index, reason } => {
                write!(f, "Feature {} extraction error: {}", index, reason)
            }
            FeedError::Cancelled => write!(f, "Fetch cancelled"),
        }
    }
}

impl std::error::Error for FeedError {}
