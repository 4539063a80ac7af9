/// Feed ingestion clients.
///
/// Submodules:
/// - `usgs` — FDSN event feed fetch and GeoJSON parsing.

pub mod usgs;
