//! Per-event numeric feature derivation. Aggregates are computed per identity
//! over the whole dataset and broadcast to each of the identity's rows; output
//! row order matches input row order exactly.

use crate::events::{LoginEvent, STATUS_FAILURE};
use chrono::{NaiveDateTime, Timelike};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const FEATURE_DIM: usize = 4;

/// Model-ready features for one event, aligned 1:1 with the cleaned table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    /// 0-23, extracted from the event timestamp
    pub hour_of_day: u32,
    /// Total event count for the identity across the dataset
    pub login_frequency_per_user: f64,
    /// Fraction of the identity's events with status "failure"
    pub failed_login_ratio: f64,
    /// Distinct IP addresses used by the identity
    pub unique_ip_count: f64,
}

/// Contextual fields carried alongside the features for traceability; never
/// used as model input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub status: String,
    pub ip_address: String,
    pub device: String,
    pub location: String,
}

#[derive(Debug, Default)]
struct IdentityAggregate<'a> {
    count: usize,
    failures: usize,
    ips: HashSet<&'a str>,
}

/// Derive the feature table and the reference table from cleaned events.
pub fn build_features(events: &[LoginEvent]) -> (Vec<FeatureVector>, Vec<ReferenceRow>) {
    let mut aggregates: HashMap<&str, IdentityAggregate<'_>> = HashMap::new();
    for event in events {
        let agg = aggregates.entry(event.user_id.as_str()).or_default();
        agg.count += 1;
        if event.status == STATUS_FAILURE {
            agg.failures += 1;
        }
        agg.ips.insert(event.ip_address.as_str());
    }

    let features = events
        .iter()
        .map(|event| {
            let agg = aggregates.get(event.user_id.as_str());
            FeatureVector {
                hour_of_day: event.timestamp.hour(),
                login_frequency_per_user: agg.map_or(0.0, |a| a.count as f64),
                failed_login_ratio: agg.map_or(0.0, |a| {
                    if a.count == 0 {
                        0.0
                    } else {
                        a.failures as f64 / a.count as f64
                    }
                }),
                unique_ip_count: agg.map_or(0.0, |a| a.ips.len() as f64),
            }
        })
        .collect();

    let reference = events
        .iter()
        .map(|event| ReferenceRow {
            user_id: event.user_id.clone(),
            timestamp: event.timestamp,
            status: event.status.clone(),
            ip_address: event.ip_address.clone(),
            device: event.device.clone(),
            location: event.location.clone(),
        })
        .collect();

    (features, reference)
}

/// Pack the feature table into an `n x 4` matrix for the model.
pub fn to_matrix(features: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((features.len(), FEATURE_DIM));
    for (i, f) in features.iter().enumerate() {
        matrix[[i, 0]] = f64::from(f.hour_of_day);
        matrix[[i, 1]] = f.login_frequency_per_user;
        matrix[[i, 2]] = f.failed_login_ratio;
        matrix[[i, 3]] = f.unique_ip_count;
    }
    matrix
}
