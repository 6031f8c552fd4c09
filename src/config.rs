//! Pipeline configuration. Paths are fixed relative defaults under `data/`
//! and `visuals/`; a JSON config file can override them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory for raw and processed CSV snapshots
    pub data_dir: PathBuf,
    /// Directory for rendered charts
    pub visuals_dir: PathBuf,
    /// Log synthesis parameters
    pub synth: SynthConfig,
    /// Outlier model parameters
    pub detector: DetectorConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Seed for every random draw; equal seeds yield equal tables
    pub seed: u64,
    pub n_users: usize,
    /// Day span covered by the generated log
    pub days: i64,
    /// Poisson mean for baseline events per identity
    pub base_events_per_user: f64,
    /// First day of the span; `None` anchors the span at today minus `days`
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Subsample size per tree; `None` means `min(256, n)`
    pub max_samples: Option<usize>,
    /// Expected outlier fraction; `None` lets the model auto-estimate
    pub contamination: Option<f64>,
    /// Seed for subsampling and split selection
    pub random_state: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            visuals_dir: PathBuf::from("visuals"),
            synth: SynthConfig::default(),
            detector: DetectorConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_users: 50,
            days: 14,
            base_events_per_user: 80.0,
            start_date: None,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: None,
            contamination: None,
            random_state: 42,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<PipelineConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn raw_log_path(&self) -> PathBuf {
        self.data_dir.join("raw_logs.csv")
    }

    pub fn processed_log_path(&self) -> PathBuf {
        self.data_dir.join("processed_logs.csv")
    }

    pub fn activity_chart_path(&self) -> PathBuf {
        self.visuals_dir.join("login_activity_over_time.png")
    }

    pub fn score_chart_path(&self) -> PathBuf {
        self.visuals_dir.join("anomaly_score_distribution.png")
    }

    pub fn scatter_chart_path(&self) -> PathBuf {
        self.visuals_dir.join("normal_vs_anomalous_behavior.png")
    }
}
