//! authlens entrypoint: three runnable stages over fixed relative paths.
//! `generate` writes the raw log, `clean` produces the canonical table,
//! `detect` scores events and renders the charts.

use authlens::{
    clean::clean_logs,
    config::PipelineConfig,
    error::PipelineError,
    events,
    features::{build_features, to_matrix},
    logging::StructuredLogger,
    model::Detector,
    synth::LogSynthesizer,
    viz,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "authlens", version, about = "Authentication-log anomaly detection pipeline")]
struct Cli {
    /// Optional JSON config; defaults apply when absent
    #[arg(long, global = true, default_value = "authlens.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic authentication logs with injected anomalies
    Generate,
    /// Clean raw logs into the canonical processed table
    Clean,
    /// Derive features, score events, and render charts
    Detect,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config);

    StructuredLogger::init(config.log.json, &config.log.level);

    match cli.command {
        Commands::Generate => generate(&config)?,
        Commands::Clean => {
            clean_logs(&config.raw_log_path(), &config.processed_log_path())?;
        }
        Commands::Detect => detect(&config)?,
    }
    Ok(())
}

fn generate(config: &PipelineConfig) -> Result<(), PipelineError> {
    let synthesizer = LogSynthesizer::new(config.synth.clone());
    synthesizer.synthesize_to(&config.raw_log_path())?;
    Ok(())
}

fn detect(config: &PipelineConfig) -> Result<(), PipelineError> {
    let events =
        events::read_events_required(&config.processed_log_path(), "run `authlens clean` first")?;
    info!(rows = events.len(), "processed logs loaded");

    let (features, _reference) = build_features(&events);
    let matrix = to_matrix(&features);

    let detector = Detector::new(config.detector.clone());
    let (scores, _forest) = detector.score(&matrix)?;

    viz::plot_login_activity(&events, &config.activity_chart_path())?;
    viz::plot_score_distribution(&scores, &config.score_chart_path())?;
    viz::plot_normal_vs_anomalous(&features, &scores, &config.scatter_chart_path())?;
    info!(dir = %config.visuals_dir.display(), "charts rendered");

    let anomalies = scores.iter().filter(|s| s.anomaly_label == 1).count();
    println!("Anomalies detected: {} / {} events", anomalies, scores.len());
    Ok(())
}
