//! Cleaning stage: fill missing fields, parse timestamps, drop unusable rows,
//! deduplicate, sort. Data-quality problems are repaired or dropped silently;
//! only a missing input file is an error.

use crate::error::PipelineError;
use crate::events::{
    self, LoginEvent, RawRecord, EVENT_TYPE_LOGIN, STATUS_FAILURE,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

const UNKNOWN: &str = "unknown";
const NULL_IP: &str = "0.0.0.0";

/// Clean a raw log file and persist the canonical table. Fails fast when the
/// input does not exist, pointing at the stage that produces it.
pub fn clean_logs(input: &Path, output: &Path) -> Result<Vec<LoginEvent>, PipelineError> {
    if !input.exists() {
        return Err(PipelineError::missing_input(
            input,
            "run `authlens generate` first",
        ));
    }
    let raw = events::read_raw(input)?;
    let total = raw.len();
    let cleaned = clean_records(raw);
    events::write_events(output, &cleaned)?;
    info!(
        rows_in = total,
        rows_out = cleaned.len(),
        path = %output.display(),
        "processed logs written"
    );
    Ok(cleaned)
}

/// Pure cleaning transformation: fill, parse, dedup, sort. Idempotent.
pub fn clean_records(raw: Vec<RawRecord>) -> Vec<LoginEvent> {
    let mut seen: HashSet<LoginEvent> = HashSet::new();
    let mut cleaned: Vec<LoginEvent> = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for record in raw {
        let user_id = fill(record.user_id, UNKNOWN);
        // The fill above makes an absent identity impossible, but an all
        // whitespace cell still counts as missing.
        if user_id.trim().is_empty() {
            dropped += 1;
            continue;
        }
        let Some(timestamp) = record.timestamp.as_deref().and_then(events::parse_timestamp)
        else {
            dropped += 1;
            continue;
        };
        let event = LoginEvent {
            user_id,
            timestamp,
            event_type: fill(record.event_type, EVENT_TYPE_LOGIN),
            status: fill(record.status, STATUS_FAILURE),
            ip_address: fill(record.ip_address, NULL_IP),
            device: fill(record.device, UNKNOWN),
            location: fill(record.location, UNKNOWN),
        };
        if seen.insert(event.clone()) {
            cleaned.push(event);
        }
    }

    if dropped > 0 {
        debug!(dropped, "rows dropped during cleaning");
    }
    cleaned.sort_by_key(|event| event.timestamp);
    cleaned
}

fn fill(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}
