//! Chart rendering: hourly activity time series, anomaly-score histogram,
//! normal-vs-anomalous scatter. Presentation only; each renderer creates its
//! output directory and overwrites the target file.

use crate::error::PipelineError;
use crate::events::LoginEvent;
use crate::features::FeatureVector;
use crate::model::ScoreRecord;
use chrono::{Duration, NaiveDateTime, Timelike};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const HISTOGRAM_BINS: usize = 40;

type RenderResult = Result<(), Box<dyn std::error::Error>>;

/// Hourly-resampled login counts over the cleaned table.
pub fn plot_login_activity(events: &[LoginEvent], path: &Path) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    render_login_activity(events, path).map_err(|e| PipelineError::Render(e.to_string()))
}

/// Distribution of anomaly scores across all events.
pub fn plot_score_distribution(scores: &[ScoreRecord], path: &Path) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    render_score_distribution(scores, path).map_err(|e| PipelineError::Render(e.to_string()))
}

/// Hour-of-day vs login-frequency scatter, colored by anomaly label.
pub fn plot_normal_vs_anomalous(
    features: &[FeatureVector],
    scores: &[ScoreRecord],
    path: &Path,
) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    render_normal_vs_anomalous(features, scores, path)
        .map_err(|e| PipelineError::Render(e.to_string()))
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn render_login_activity(events: &[LoginEvent], path: &Path) -> RenderResult {
    let mut counts: BTreeMap<NaiveDateTime, u32> = BTreeMap::new();
    for event in events {
        let bucket = event
            .timestamp
            .date()
            .and_hms_opt(event.timestamp.hour(), 0, 0)
            .unwrap_or(event.timestamp);
        *counts.entry(bucket).or_insert(0) += 1;
    }

    let root = BitMapBackend::new(path, (1000, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let (Some((&first, _)), Some((&last, _))) = (counts.first_key_value(), counts.last_key_value())
    else {
        root.present()?;
        return Ok(());
    };

    // Walk the hour grid so empty buckets plot as zero.
    let mut series: Vec<(NaiveDateTime, u32)> = Vec::new();
    let mut bucket = first;
    while bucket <= last {
        series.push((bucket, counts.get(&bucket).copied().unwrap_or(0)));
        bucket = bucket + Duration::hours(1);
    }

    let max_count = series.iter().map(|&(_, c)| c).max().unwrap_or(0) + 1;
    let mut chart = ChartBuilder::on(&root)
        .caption("Login Activity Over Time (Hourly)", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            RangedDateTime::from(first..last + Duration::hours(1)),
            0u32..max_count,
        )?;
    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Count")
        .draw()?;
    chart.draw_series(LineSeries::new(series, &STEEL_BLUE))?;
    root.present()?;
    Ok(())
}

fn render_score_distribution(scores: &[ScoreRecord], path: &Path) -> RenderResult {
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    if scores.is_empty() {
        root.present()?;
        return Ok(());
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for record in scores {
        lo = lo.min(record.anomaly_score);
        hi = hi.max(record.anomaly_score);
    }
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / HISTOGRAM_BINS as f64;
    let mut bins = [0u32; HISTOGRAM_BINS];
    for record in scores {
        let idx = (((record.anomaly_score - lo) / width) as usize).min(HISTOGRAM_BINS - 1);
        bins[idx] += 1;
    }
    let max_bin = bins.iter().copied().max().unwrap_or(0) + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Anomaly Score Distribution", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0u32..max_bin)?;
    chart
        .configure_mesh()
        .x_desc("Anomaly Score (higher = more anomalous)")
        .y_desc("Frequency")
        .draw()?;
    chart.draw_series(bins.iter().enumerate().map(|(i, &count)| {
        let x0 = lo + i as f64 * width;
        Rectangle::new([(x0, 0), (x0 + width, count)], STEEL_BLUE.filled())
    }))?;
    root.present()?;
    Ok(())
}

fn render_normal_vs_anomalous(
    features: &[FeatureVector],
    scores: &[ScoreRecord],
    path: &Path,
) -> RenderResult {
    let root = BitMapBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    if features.is_empty() || scores.is_empty() {
        root.present()?;
        return Ok(());
    }

    let max_freq = features
        .iter()
        .map(|f| f.login_frequency_per_user)
        .fold(1.0f64, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption("Normal vs Anomalous Behavior", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..23.5f64, 0.0f64..max_freq * 1.05)?;
    chart
        .configure_mesh()
        .x_desc("Hour of Day")
        .y_desc("Login Frequency per User")
        .draw()?;

    let point = |f: &FeatureVector| (f64::from(f.hour_of_day), f.login_frequency_per_user);
    let normal: Vec<(f64, f64)> = features
        .iter()
        .zip(scores)
        .filter(|(_, s)| s.anomaly_label == 0)
        .map(|(f, _)| point(f))
        .collect();
    let anomalous: Vec<(f64, f64)> = features
        .iter()
        .zip(scores)
        .filter(|(_, s)| s.anomaly_label == 1)
        .map(|(f, _)| point(f))
        .collect();

    chart
        .draw_series(
            normal
                .into_iter()
                .map(|xy| Circle::new(xy, 3, GREEN.mix(0.6).filled())),
        )?
        .label("Normal")
        .legend(|(x, y)| Circle::new((x, y), 3, GREEN.filled()));
    chart
        .draw_series(
            anomalous
                .into_iter()
                .map(|xy| Circle::new(xy, 3, RED.mix(0.7).filled())),
        )?
        .label("Anomalous")
        .legend(|(x, y)| Circle::new((x, y), 3, RED.filled()));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
