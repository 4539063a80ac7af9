/// Display derivation for earthquake records.
///
/// Pure functions only: no I/O, no mutable state. Everything a list row
/// needs is derived here from an `EarthquakeRecord`: magnitude text, the
/// magnitude color tier, the offset/primary location split, and the date
/// and time strings.
///
/// # Clock injection
/// `format_date` and `format_time` render in the host's local time zone.
/// The `*_in` variants accept an explicit time zone so tests stay
/// deterministic across machines.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::model::EarthquakeRecord;

// ---------------------------------------------------------------------------
// Magnitude
// ---------------------------------------------------------------------------

/// Hex colors for the magnitude circle, indexed by tier 0–10. Indices 0
/// and 1 carry the same color: floor values 0 and 1 share one visual tier.
pub static TIER_COLORS: [&str; 11] = [
    "#4A7BA6", // 0 — shares the tier-1 color
    "#4A7BA6", // 1
    "#04B4B3", // 2
    "#10CAC9", // 3
    "#F5A623", // 4
    "#FF7D50", // 5
    "#FC6644", // 6
    "#E75F40", // 7
    "#E13929", // 8
    "#E40303", // 9
    "#D93218", // 10+
];

/// Formats a magnitude to exactly one decimal digit, e.g. "6.2".
/// Locale independent; the decimal separator is always a point.
pub fn format_magnitude(magnitude: f64) -> String {
    format!("{:.1}", magnitude)
}

/// Magnitude tier selecting the display color: floor(m) clamped to [0, 10].
pub fn magnitude_tier(magnitude: f64) -> usize {
    let floor = magnitude.floor();
    if floor < 0.0 {
        0
    } else if floor > 10.0 {
        10
    } else {
        floor as usize
    }
}

/// Color for a magnitude's circle, straight from the tier table.
pub fn magnitude_color(magnitude: f64) -> &'static str {
    TIER_COLORS[magnitude_tier(magnitude)]
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Rendered in place of the offset when a location has no "of" clause.
pub const NEAR_THE_PREFIX: &str = "Near the";

/// The two halves a location string can split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPart {
    /// The directional-distance clause through "of", e.g. "5km N of".
    Offset,
    /// The named place after the clause, e.g. "Example City".
    Primary,
}

/// Splits a location on its "of" clause and returns the requested part.
///
/// Returns the empty string when the clause is absent. Callers probe with
/// `is_only_primary` first: an empty offset means the whole string is the
/// primary location, rendered behind the `NEAR_THE_PREFIX` constant
/// instead. Both the probe and the extraction go through this one split.
pub fn split_location(location: &str, part: LocationPart) -> String {
    if let Some(index) = location.find("of") {
        let end = index + 2; // through "of" inclusive
        match part {
            LocationPart::Offset => return location[..end].to_string(),
            // One separating character, normally a space, is dropped.
            LocationPart::Primary => return location.get(end + 1..).unwrap_or("").to_string(),
        }
    }
    String::new()
}

/// True if the location carries no offset clause.
pub fn is_only_primary(location: &str) -> bool {
    split_location(location, LocationPart::Offset).is_empty()
}

// ---------------------------------------------------------------------------
// Date and time
// ---------------------------------------------------------------------------

/// Formats an epoch-millisecond timestamp as e.g. "Jan 05, 2007",
/// in local time.
pub fn format_date(timestamp_ms: i64) -> String {
    format_date_in(timestamp_ms, &Local)
}

/// Formats an epoch-millisecond timestamp as e.g. "4:17 AM", in local
/// time. The hour digit is 24-hour while the AM/PM marker stays; this is
/// the feed client's historical format, kept as-is.
pub fn format_time(timestamp_ms: i64) -> String {
    format_time_in(timestamp_ms, &Local)
}

/// `format_date` against an explicit time zone.
pub fn format_date_in<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    moment(timestamp_ms).with_timezone(tz).format("%b %d, %Y").to_string()
}

/// `format_time` against an explicit time zone.
pub fn format_time_in<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    moment(timestamp_ms).with_timezone(tz).format("%-H:%M %p").to_string()
}

/// Timestamps outside chrono's representable range collapse to the epoch
/// rather than failing; formatting stays total over all of i64.
fn moment(timestamp_ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

// ---------------------------------------------------------------------------
// Row assembly
// ---------------------------------------------------------------------------

/// Everything a list row renders for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields {
    pub magnitude_text: String,
    /// Color tier in [0, 10]; index into `TIER_COLORS`.
    pub magnitude_tier: usize,
    pub offset_text: String,
    pub primary_location_text: String,
    pub date_text: String,
    pub time_text: String,
}

/// Derives all display fields for one record, in local time.
pub fn display_fields(record: &EarthquakeRecord) -> DisplayFields {
    display_fields_in(record, &Local)
}

/// `display_fields` against an explicit time zone.
pub fn display_fields_in<Tz: TimeZone>(record: &EarthquakeRecord, tz: &Tz) -> DisplayFields
where
    Tz::Offset: std::fmt::Display,
{
    let (offset_text, primary_location_text) = if is_only_primary(&record.location) {
        (NEAR_THE_PREFIX.to_string(), record.location.clone())
    } else {
        (
            split_location(&record.location, LocationPart::Offset),
            split_location(&record.location, LocationPart::Primary),
        )
    };

    DisplayFields {
        magnitude_text: format_magnitude(record.magnitude),
        magnitude_tier: magnitude_tier(record.magnitude),
        offset_text,
        primary_location_text,
        date_text: format_date_in(record.occurred_at_ms, tz),
        time_text: format_time_in(record.occurred_at_ms, tz),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
