//! Integration tests: seeded generation, cleaning invariants, feature/score
//! alignment, end-to-end anomaly separation, chart rendering boundaries.

use authlens::{
    clean::{clean_logs, clean_records},
    config::{DetectorConfig, PipelineConfig, SynthConfig},
    events,
    features::{build_features, to_matrix},
    model::Detector,
    synth::LogSynthesizer,
    viz,
    PipelineError,
};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;

fn synth_config() -> SynthConfig {
    SynthConfig {
        seed: 42,
        n_users: 10,
        days: 7,
        base_events_per_user: 20.0,
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
    }
}

#[test]
fn config_load_default() {
    let config = PipelineConfig::load(Path::new("nonexistent.json"));
    assert_eq!(config.synth.seed, 42);
    assert_eq!(config.detector.n_estimators, 100);
    assert_eq!(config.raw_log_path(), Path::new("data/raw_logs.csv"));
}

#[test]
fn generation_is_byte_identical_under_one_seed() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");

    let synthesizer = LogSynthesizer::new(synth_config());
    synthesizer.synthesize_to(&a).unwrap();
    synthesizer.synthesize_to(&b).unwrap();

    let bytes_a = std::fs::read(&a).unwrap();
    let bytes_b = std::fs::read(&b).unwrap();
    assert!(!bytes_a.is_empty());
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn cleaned_table_upholds_invariants() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("data").join("raw_logs.csv");
    let processed = dir.path().join("data").join("processed_logs.csv");

    LogSynthesizer::new(synth_config())
        .synthesize_to(&raw)
        .unwrap();
    let cleaned = clean_logs(&raw, &processed).unwrap();

    assert!(!cleaned.is_empty());
    let mut unique = HashSet::new();
    for pair in cleaned.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    for event in &cleaned {
        assert!(!event.user_id.is_empty());
        assert!(unique.insert(event.clone()), "duplicate row survived");
    }
}

#[test]
fn cleaning_twice_equals_cleaning_once() {
    let report = LogSynthesizer::new(synth_config()).synthesize().unwrap();
    let raw: Vec<authlens::RawRecord> = report
        .events
        .iter()
        .map(authlens::RawRecord::from_event)
        .collect();

    let once = clean_records(raw);
    let again: Vec<authlens::RawRecord> =
        once.iter().map(authlens::RawRecord::from_event).collect();
    let twice = clean_records(again);
    assert_eq!(once, twice);
}

#[test]
fn feature_rows_align_with_cleaned_rows() {
    let report = LogSynthesizer::new(synth_config()).synthesize().unwrap();
    let raw = report
        .events
        .iter()
        .map(authlens::RawRecord::from_event)
        .collect();
    let cleaned = clean_records(raw);

    let (features, reference) = build_features(&cleaned);
    assert_eq!(features.len(), cleaned.len());
    assert_eq!(reference.len(), cleaned.len());
    for (event, row) in cleaned.iter().zip(&reference) {
        assert_eq!(event.user_id, row.user_id);
        assert_eq!(event.timestamp, row.timestamp);
    }
}

#[test]
fn end_to_end_injected_identities_score_higher() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw_logs.csv");
    let processed = dir.path().join("processed_logs.csv");

    let report = LogSynthesizer::new(synth_config())
        .synthesize_to(&raw)
        .unwrap();
    assert!(!report.injected_users.is_empty());

    let cleaned = clean_logs(&raw, &processed).unwrap();
    let (features, _) = build_features(&cleaned);
    let matrix = to_matrix(&features);

    let detector = Detector::new(DetectorConfig::default());
    let (scores, _) = detector.score(&matrix).unwrap();
    assert_eq!(scores.len(), features.len());
    for record in &scores {
        assert!(record.anomaly_label == 0 || record.anomaly_label == 1);
    }

    let mut injected_sum = 0.0;
    let mut injected_count = 0usize;
    let mut baseline_sum = 0.0;
    let mut baseline_count = 0usize;
    for (event, record) in cleaned.iter().zip(&scores) {
        if report.injected_users.contains(&event.user_id) {
            injected_sum += record.anomaly_score;
            injected_count += 1;
        } else {
            baseline_sum += record.anomaly_score;
            baseline_count += 1;
        }
    }
    assert!(injected_count > 0 && baseline_count > 0);
    let injected_mean = injected_sum / injected_count as f64;
    let baseline_mean = baseline_sum / baseline_count as f64;
    assert!(
        injected_mean > baseline_mean,
        "injected mean {injected_mean} should exceed baseline mean {baseline_mean}"
    );
}

#[test]
fn detect_input_missing_is_actionable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("processed_logs.csv");
    let err = events::read_events_required(&missing, "run `authlens clean` first").unwrap_err();
    match err {
        PipelineError::MissingInput { hint, .. } => assert!(hint.contains("clean")),
        other => panic!("expected MissingInput, got {other}"),
    }
}

#[test]
fn charts_render_from_pipeline_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let report = LogSynthesizer::new(synth_config()).synthesize().unwrap();
    let raw = report
        .events
        .iter()
        .map(authlens::RawRecord::from_event)
        .collect();
    let cleaned = clean_records(raw);
    let (features, _) = build_features(&cleaned);
    let (scores, _) = Detector::new(DetectorConfig::default())
        .score(&to_matrix(&features))
        .unwrap();

    let visuals = dir.path().join("visuals");
    viz::plot_login_activity(&cleaned, &visuals.join("login_activity_over_time.png")).unwrap();
    viz::plot_score_distribution(&scores, &visuals.join("anomaly_score_distribution.png")).unwrap();
    viz::plot_normal_vs_anomalous(
        &features,
        &scores,
        &visuals.join("normal_vs_anomalous_behavior.png"),
    )
    .unwrap();

    assert!(visuals.join("login_activity_over_time.png").exists());
    assert!(visuals.join("anomaly_score_distribution.png").exists());
    assert!(visuals.join("normal_vs_anomalous_behavior.png").exists());
}

#[test]
fn processed_csv_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw_logs.csv");
    let processed = dir.path().join("processed_logs.csv");

    LogSynthesizer::new(synth_config())
        .synthesize_to(&raw)
        .unwrap();
    let cleaned = clean_logs(&raw, &processed).unwrap();
    let reloaded = events::read_events(&processed).unwrap();
    assert_eq!(cleaned, reloaded);
}
