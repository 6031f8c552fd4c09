//! Injected anomaly patterns: credential-stuffing bursts, off-hours access,
//! volumetric spikes, and never-seen asset usage. Each pattern draws its own
//! ~10% identity subset; subsets may overlap.

use super::{at, pick, random_ip, UserProfile, DEVICE_POOL, LOCATION_POOL};
use crate::events::{LoginEvent, EVENT_TYPE_LOGIN, STATUS_FAILURE, STATUS_SUCCESS};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

/// Run all four injectors in a fixed order; returns the union of targeted
/// identities.
pub(super) fn inject_all(
    events: &mut Vec<LoginEvent>,
    users: &[String],
    profiles: &HashMap<String, UserProfile>,
    start: NaiveDate,
    days: i64,
    rng: &mut StdRng,
) -> BTreeSet<String> {
    let subset = (users.len() / 10).max(1);
    let mut injected = BTreeSet::new();

    for user in targets(users, subset, rng) {
        credential_stuffing(events, &user, &profiles[&user], start, days, rng);
        injected.insert(user);
    }
    for user in targets(users, subset, rng) {
        off_hours(events, &user, &profiles[&user], start, days, rng);
        injected.insert(user);
    }
    for user in targets(users, subset, rng) {
        activity_spike(events, &user, &profiles[&user], start, days, rng);
        injected.insert(user);
    }
    for user in targets(users, subset, rng) {
        new_asset_usage(events, &user, start, days, rng);
        injected.insert(user);
    }

    injected
}

fn targets(users: &[String], count: usize, rng: &mut StdRng) -> Vec<String> {
    users.choose_multiple(rng, count).cloned().collect()
}

fn random_day(start: NaiveDate, days: i64, rng: &mut StdRng) -> NaiveDate {
    start + Duration::days(rng.gen_range(0..days))
}

/// 15-35 failed logins at one-minute spacing with randomized IPs and devices,
/// breaking the identity's asset affinity.
fn credential_stuffing(
    events: &mut Vec<LoginEvent>,
    user: &str,
    profile: &UserProfile,
    start: NaiveDate,
    days: i64,
    rng: &mut StdRng,
) {
    let base = at(random_day(start, days, rng), 0, 0, 0);
    let count: i64 = rng.gen_range(15..35);
    for i in 0..count {
        events.push(LoginEvent {
            user_id: user.to_string(),
            timestamp: base + Duration::minutes(i),
            event_type: EVENT_TYPE_LOGIN.to_string(),
            status: STATUS_FAILURE.to_string(),
            ip_address: random_ip(rng),
            device: pick(rng, &DEVICE_POOL).to_string(),
            location: profile.location.clone(),
        });
    }
}

/// 20-40 logins concentrated in the 02:00-05:00 window from the identity's
/// own assets.
fn off_hours(
    events: &mut Vec<LoginEvent>,
    user: &str,
    profile: &UserProfile,
    start: NaiveDate,
    days: i64,
    rng: &mut StdRng,
) {
    let day = random_day(start, days, rng);
    let count: u32 = rng.gen_range(20..40);
    for _ in 0..count {
        let hour: u32 = rng.gen_range(2..5);
        let minute: u32 = rng.gen_range(0..60);
        let status = if rng.gen_bool(0.7) {
            STATUS_SUCCESS
        } else {
            STATUS_FAILURE
        };
        events.push(LoginEvent {
            user_id: user.to_string(),
            timestamp: at(day, hour, minute, 0),
            event_type: EVENT_TYPE_LOGIN.to_string(),
            status: status.to_string(),
            ip_address: pick(rng, &profile.ips).clone(),
            device: pick(rng, &profile.devices).clone(),
            location: profile.location.clone(),
        });
    }
}

/// 100-200 logins within seconds of one base time; volumetric anomaly.
fn activity_spike(
    events: &mut Vec<LoginEvent>,
    user: &str,
    profile: &UserProfile,
    start: NaiveDate,
    days: i64,
    rng: &mut StdRng,
) {
    let base = at(random_day(start, days, rng), 0, 0, 0);
    let size: i64 = rng.gen_range(100..200);
    for i in 0..size {
        let status = if rng.gen_bool(0.9) {
            STATUS_SUCCESS
        } else {
            STATUS_FAILURE
        };
        events.push(LoginEvent {
            user_id: user.to_string(),
            timestamp: base + Duration::seconds(i),
            event_type: EVENT_TYPE_LOGIN.to_string(),
            status: status.to_string(),
            ip_address: pick(rng, &profile.ips).clone(),
            device: pick(rng, &profile.devices).clone(),
            location: profile.location.clone(),
        });
    }
}

/// 10-25 successful logins spread across all 24 hours from IPs, devices, and
/// locations absent from the identity's profile.
fn new_asset_usage(
    events: &mut Vec<LoginEvent>,
    user: &str,
    start: NaiveDate,
    days: i64,
    rng: &mut StdRng,
) {
    let day = random_day(start, days, rng);
    let count: u32 = rng.gen_range(10..25);
    for _ in 0..count {
        let hour: u32 = rng.gen_range(0..24);
        events.push(LoginEvent {
            user_id: user.to_string(),
            timestamp: at(day, hour, 0, 0),
            event_type: EVENT_TYPE_LOGIN.to_string(),
            status: STATUS_SUCCESS.to_string(),
            ip_address: random_ip(rng),
            device: pick(rng, &DEVICE_POOL).to_string(),
            location: pick(rng, &LOCATION_POOL).to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn profile() -> UserProfile {
        UserProfile {
            hours: vec![9, 13, 18],
            devices: vec!["Linux".to_string()],
            ips: vec!["10.0.0.1".to_string()],
            location: "Berlin".to_string(),
        }
    }

    #[test]
    fn stuffing_is_all_failures_at_minute_spacing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut events = Vec::new();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        credential_stuffing(&mut events, "user_001", &profile(), start, 5, &mut rng);

        assert!((15..35).contains(&(events.len() as i64)));
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.status, STATUS_FAILURE);
            assert_eq!(
                (event.timestamp - events[0].timestamp).num_minutes(),
                i as i64
            );
        }
    }

    #[test]
    fn off_hours_stays_in_window() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut events = Vec::new();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        off_hours(&mut events, "user_002", &profile(), start, 5, &mut rng);

        use chrono::Timelike;
        for event in &events {
            assert!((2..5).contains(&event.timestamp.hour()));
            assert_eq!(event.ip_address, "10.0.0.1");
        }
    }

    #[test]
    fn new_assets_avoid_profile_assets() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut events = Vec::new();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        new_asset_usage(&mut events, "user_003", start, 5, &mut rng);

        for event in &events {
            assert_eq!(event.status, STATUS_SUCCESS);
            assert_ne!(event.ip_address, "10.0.0.1");
        }
    }
}
