/// Development mode utilities for working with saved feed snapshots
///
/// When the live USGS feed is unavailable, use this module to replay a
/// saved GeoJSON snapshot through the parser for testing and development.

use crate::ingest::usgs::{self, FeatureErrorMode};
use crate::model::EarthquakeRecord;

/// Configuration for development mode feed replay
pub struct DevMode {
    /// Path to a saved GeoJSON feature collection
    pub snapshot_path: String,
}

impl DevMode {
    pub fn new(snapshot_path: impl Into<String>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Replays the snapshot through the same parser a live fetch uses,
    /// simulating the live feed without network access.
    pub fn load_records(
        &self,
        mode: FeatureErrorMode,
    ) -> Result<Vec<EarthquakeRecord>, Box<dyn std::error::Error>> {
        let body = std::fs::read_to_string(&self.snapshot_path)?;
        let records = usgs::parse_feed(&body, mode)?;
        Ok(records)
    }
}
