/// Pipeline configuration for the earthquake feed service.
///
/// Defaults mirror the feed client's stock behavior: 15 s connect and 10 s
/// read timeouts, five redirect hops, and a query for the ten most recent
/// events at or above magnitude 1.9. Any value can be overridden from a
/// TOML file; omitted keys keep their defaults.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Query preferences
// ---------------------------------------------------------------------------

/// Sort order accepted by the FDSN event endpoint's `orderby` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Time,
    Magnitude,
}

impl OrderBy {
    /// The literal value sent in the query string.
    pub fn as_query_value(self) -> &'static str {
        match self {
            OrderBy::Time => "time",
            OrderBy::Magnitude => "magnitude",
        }
    }
}

/// Filter parameters for the event query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryPrefs {
    /// Minimum magnitude to include (`minmag`).
    pub min_magnitude: f64,
    /// Result sort order (`orderby`).
    pub order_by: OrderBy,
    /// Maximum number of events to return (`limit`).
    pub limit: u32,
}

impl Default for QueryPrefs {
    fn default() -> Self {
        QueryPrefs {
            min_magnitude: 1.9,
            order_by: OrderBy::Time,
            limit: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch configuration
// ---------------------------------------------------------------------------

/// Timeouts and redirect bounds for the HTTP fetch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds, applied to the whole request.
    pub read_timeout_ms: u64,
    /// Maximum redirect hops to follow before giving up.
    /// The upstream feed normally answers directly; anything past a few
    /// hops indicates a misconfigured endpoint or a redirect loop.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            connect_timeout_ms: 15_000,
            read_timeout_ms: 10_000,
            max_redirects: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Top-level configuration consumed by the fetch/parse pipeline.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub query: QueryPrefs,
    /// When true, a malformed feature is skipped and logged instead of
    /// aborting the remaining batch. Off by default to match the feed
    /// client's stock behavior.
    pub isolate_bad_features: bool,
}

/// Loads a `PipelineConfig` from a TOML file.
pub fn load_from_file(path: &str) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let config: PipelineConfig = toml::from_str(&text)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
