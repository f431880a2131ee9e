//! CLI output formatting and feature table export.

use std::fmt::Write as _;
use std::io;
use std::path::Path;
use std::time::Duration;

use bonetexture_core::features::{FeatureResultSet, FilterKind};
use bonetexture_core::suggestion::ParameterSuggestion;
use bonetexture_orchestration::interfaces::JobSuccess;
use bonetexture_orchestration::orchestrator::Completion;

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// Render one family's section of the feature table.
#[must_use]
pub fn format_family(results: &FeatureResultSet, kind: FilterKind) -> String {
    let mut out = format!("{kind}\n");
    match results.get(kind) {
        Some(vector) => {
            let width = kind
                .feature_names()
                .iter()
                .map(|name| name.len())
                .max()
                .unwrap_or(0);
            for (name, value) in vector.named() {
                let _ = writeln!(out, "  {name:<width$}  {value}");
            }
        }
        None => out.push_str("  (no result)\n"),
    }
    out
}

/// Render the whole feature table, every family in table order.
#[must_use]
pub fn format_feature_table(results: &FeatureResultSet) -> String {
    FilterKind::ALL
        .into_iter()
        .map(|kind| format_family(results, kind))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a parameter suggestion.
#[must_use]
pub fn format_suggestion(suggestion: &ParameterSuggestion) -> String {
    format!(
        "binNumber = {}\npixelIntensityMin = {}\npixelIntensityMax = {}",
        suggestion.bin_count, suggestion.intensity_min, suggestion.intensity_max
    )
}

/// Render one line per finished job, then one per job still pending.
#[must_use]
pub fn format_summary(completion: &Completion) -> String {
    let mut out = format!("Jobs:\n{:-<60}\n", "");
    for outcome in &completion.outcomes {
        let status = match &outcome.outcome {
            Ok(JobSuccess::Features(_)) => "OK",
            Ok(JobSuccess::FeatureMap(_)) => "MAP",
            Err(_) => "FAILED",
        };
        let _ = writeln!(
            out,
            "  {:<8} {:>6} {:>12} [{status}]",
            outcome.kind.label(),
            outcome.job.to_string(),
            format_duration(outcome.duration),
        );
    }
    for kind in &completion.pending {
        let _ = writeln!(out, "  {:<8} {:>6} {:>12} [PENDING]", kind.label(), "", "");
    }
    out
}

/// Write the feature table as CSV.
///
/// Each family takes two rows: its feature names, then its values. The
/// value row holds blank fields when the family has no result yet.
///
/// # Errors
///
/// Returns the underlying CSV or I/O error.
pub fn write_csv<W: io::Write>(writer: W, results: &FeatureResultSet) -> csv::Result<()> {
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for kind in FilterKind::ALL {
        csv.write_record(kind.feature_names())?;
        match results.get(kind) {
            Some(vector) => {
                csv.write_record(vector.values().iter().map(ToString::to_string))?;
            }
            None => csv.write_record(std::iter::repeat("").take(kind.feature_count()))?,
        }
    }
    csv.flush()?;
    Ok(())
}

/// Write the feature table to a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv_file(path: &Path, results: &FeatureResultSet) -> csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(io::BufWriter::new(file), results)?;
    tracing::debug!(path = %path.display(), "Wrote feature table");
    Ok(())
}
