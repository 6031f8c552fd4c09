//! Synthetic authentication-log generation: per-identity behavioral profiles,
//! Poisson baseline activity, four injected anomaly patterns, seeded shuffle.

mod anomalies;

use crate::config::SynthConfig;
use crate::error::PipelineError;
use crate::events::{self, LoginEvent, EVENT_TYPE_LOGIN, STATUS_FAILURE, STATUS_SUCCESS};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

pub const DEVICE_POOL: [&str; 6] = ["Windows", "macOS", "Linux", "Android", "iOS", "ChromeOS"];

pub const LOCATION_POOL: [&str; 10] = [
    "New York",
    "San Francisco",
    "London",
    "Berlin",
    "Singapore",
    "Sydney",
    "Toronto",
    "Tokyo",
    "Paris",
    "Bengaluru",
];

/// Behavioral profile drawn once per identity and held fixed: typical login
/// hours, 1-2 devices, 1-2 source IPs, one location.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub hours: Vec<u32>,
    pub devices: Vec<String>,
    pub ips: Vec<String>,
    pub location: String,
}

/// Synthesis output: the shuffled event table plus the identities that
/// received at least one injected anomaly pattern.
#[derive(Debug)]
pub struct SynthReport {
    pub events: Vec<LoginEvent>,
    pub injected_users: BTreeSet<String>,
}

pub struct LogSynthesizer {
    config: SynthConfig,
}

impl LogSynthesizer {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// Generate the full event table in memory. Every draw goes through one
    /// generator seeded from the config, so equal seeds yield equal tables.
    pub fn synthesize(&self) -> Result<SynthReport, PipelineError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let start = self
            .config
            .start_date
            .unwrap_or_else(|| Utc::now().date_naive() - Duration::days(self.config.days));

        let users: Vec<String> = (1..=self.config.n_users)
            .map(|i| format!("user_{i:03}"))
            .collect();

        let mut profiles: HashMap<String, UserProfile> = HashMap::new();
        for user in &users {
            profiles.insert(user.clone(), draw_profile(&mut rng));
        }

        let mut events = self.baseline(&users, &profiles, start, &mut rng)?;
        let injected_users =
            anomalies::inject_all(&mut events, &users, &profiles, start, self.config.days, &mut rng);

        // Events must not arrive grouped by injection pattern.
        events.shuffle(&mut rng);

        Ok(SynthReport {
            events,
            injected_users,
        })
    }

    /// Generate and persist the raw log CSV, creating parent directories.
    pub fn synthesize_to(&self, path: &Path) -> Result<SynthReport, PipelineError> {
        let report = self.synthesize()?;
        events::write_events(path, &report.events)?;
        info!(
            rows = report.events.len(),
            injected = report.injected_users.len(),
            path = %path.display(),
            "synthetic logs written"
        );
        Ok(report)
    }

    fn baseline(
        &self,
        users: &[String],
        profiles: &HashMap<String, UserProfile>,
        start: NaiveDate,
        rng: &mut StdRng,
    ) -> Result<Vec<LoginEvent>, PipelineError> {
        let poisson = Poisson::new(self.config.base_events_per_user)
            .map_err(|e| PipelineError::InvalidParameter(format!("base_events_per_user: {e}")))?;

        let mut events = Vec::new();
        for user in users {
            let profile = &profiles[user];
            let count = poisson.sample(rng) as usize;
            for _ in 0..count {
                let day = start + Duration::days(rng.gen_range(0..self.config.days + 1));
                let hour = *pick(rng, &profile.hours);
                let minute: u32 = rng.gen_range(0..60);
                let second: u32 = rng.gen_range(0..60);
                let status = if rng.gen_bool(0.94) {
                    STATUS_SUCCESS
                } else {
                    STATUS_FAILURE
                };
                events.push(LoginEvent {
                    user_id: user.clone(),
                    timestamp: at(day, hour, minute, second),
                    event_type: EVENT_TYPE_LOGIN.to_string(),
                    status: status.to_string(),
                    ip_address: pick(rng, &profile.ips).clone(),
                    device: pick(rng, &profile.devices).clone(),
                    location: profile.location.clone(),
                });
            }
        }
        Ok(events)
    }
}

fn draw_profile(rng: &mut StdRng) -> UserProfile {
    let hours: Vec<u32> = (0..3).map(|_| rng.gen_range(7..20)).collect();
    let n_devices: usize = rng.gen_range(1..3);
    let devices: Vec<String> = DEVICE_POOL
        .choose_multiple(rng, n_devices)
        .map(|d| d.to_string())
        .collect();
    let n_ips: usize = rng.gen_range(1..3);
    let ips: Vec<String> = (0..n_ips).map(|_| random_ip(rng)).collect();
    let location = pick(rng, &LOCATION_POOL).to_string();
    UserProfile {
        hours,
        devices,
        ips,
        location,
    }
}

pub(crate) fn random_ip(rng: &mut StdRng) -> String {
    let octets: Vec<String> = (0..4).map(|_| rng.gen_range(1..255u8).to_string()).collect();
    octets.join(".")
}

pub(crate) fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

pub(crate) fn at(day: NaiveDate, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN))
}
