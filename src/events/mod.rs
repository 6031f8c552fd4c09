//! Shared authentication-event record types and CSV persistence.
//! Raw records tolerate missing fields; cleaned events are fully populated.

use crate::error::PipelineError;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILURE: &str = "failure";
pub const EVENT_TYPE_LOGIN: &str = "login";

/// One authentication attempt after cleaning. Field order matches the CSV
/// column order: user_id, timestamp, event_type, status, ip_address, device,
/// location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoginEvent {
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub event_type: String,
    pub status: String,
    pub ip_address: String,
    pub device: String,
    pub location: String,
}

/// One row as read from a raw log file. Empty CSV cells deserialize to `None`;
/// the cleaning stage decides what to fill and what to drop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub user_id: Option<String>,
    pub timestamp: Option<String>,
    pub event_type: Option<String>,
    pub status: Option<String>,
    pub ip_address: Option<String>,
    pub device: Option<String>,
    pub location: Option<String>,
}

impl RawRecord {
    pub fn from_event(event: &LoginEvent) -> Self {
        Self {
            user_id: Some(event.user_id.clone()),
            timestamp: Some(format_timestamp(&event.timestamp)),
            event_type: Some(event.event_type.clone()),
            status: Some(event.status.clone()),
            ip_address: Some(event.ip_address.clone()),
            device: Some(event.device.clone()),
            location: Some(event.location.clone()),
        }
    }
}

/// Parse an ISO-8601 timestamp, with or without fractional seconds or a
/// trailing UTC offset. Returns `None` for anything unparseable.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    None
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Read a raw log file; the caller is responsible for the existence check.
pub fn read_raw(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Read a cleaned log file. Strict: the processed file is pipeline output, so
/// a malformed row is an error rather than something to repair.
pub fn read_events(path: &Path) -> Result<Vec<LoginEvent>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut events = Vec::new();
    for row in reader.deserialize() {
        events.push(row?);
    }
    Ok(events)
}

/// Strict read used at stage boundaries: an absent file is fatal, with a hint
/// naming the stage that produces it.
pub fn read_events_required(path: &Path, hint: &str) -> Result<Vec<LoginEvent>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::missing_input(path, hint));
    }
    read_events(path)
}

/// Write events as CSV, creating parent directories as needed.
pub fn write_events(path: &Path, events: &[LoginEvent]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for event in events {
        writer.serialize(event)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_plain_iso() {
        let ts = parse_timestamp("2024-03-01T08:30:15").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T08:30:15");
    }

    #[test]
    fn parse_timestamp_fractional_and_offset() {
        assert!(parse_timestamp("2024-03-01T08:30:15.250").is_some());
        assert!(parse_timestamp("2024-03-01 08:30:15").is_some());
        let with_offset = parse_timestamp("2024-03-01T08:30:15+02:00").unwrap();
        assert_eq!(format_timestamp(&with_offset), "2024-03-01T06:30:15");
    }

    #[test]
    fn parse_timestamp_garbage_is_none() {
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
