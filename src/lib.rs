//! authlens — authentication-log anomaly detection pipeline.
//!
//! Four sequential stages over an in-memory event table, with CSV snapshots
//! at stage boundaries:
//! - [`synth`] — synthetic log generation with injected anomaly patterns
//! - [`clean`] — normalization and deduplication of raw logs
//! - [`features`] — per-event numeric feature derivation
//! - [`model`] — feature scaling and isolation-forest scoring
//! - [`viz`] — chart rendering over the stage outputs
//! - [`logging`] — structured tracing setup

pub mod clean;
pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod logging;
pub mod model;
pub mod synth;
pub mod viz;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use events::{LoginEvent, RawRecord};
pub use features::{build_features, FeatureVector, ReferenceRow};
pub use logging::StructuredLogger;
pub use model::{Detector, IsolationForest, ScoreRecord, StandardScaler};
pub use synth::{LogSynthesizer, SynthReport};
