//! Default texture parameters derived from the scan's region statistics.

use crate::constants::{BINS_PER_RANGE_STEP, INTENSITY_RANGE_STEP};
use crate::params::ParameterSets;
use crate::statistics::{RegionStatistics, StatisticsError};
use crate::validation::{validate, ValidationError};
use crate::volume::{ImageVolume, RegionMask};

/// Errors deriving a suggestion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SuggestionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Statistics(#[from] StatisticsError),
}

/// Bin count and intensity range suggested for the histogram-based filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSuggestion {
    pub bin_count: u32,
    pub intensity_min: f64,
    pub intensity_max: f64,
}

impl ParameterSuggestion {
    /// A flat region yields zero bins, which the filters cannot use.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.bin_count == 0
    }

    /// Write the suggestion into the co-occurrence and run-length sets.
    ///
    /// Morphometry has no histogram and is left untouched.
    pub fn apply_to(&self, sets: &mut ParameterSets) {
        sets.cooccurrence.bin_number = self.bin_count;
        sets.cooccurrence.pixel_intensity_min = self.intensity_min;
        sets.cooccurrence.pixel_intensity_max = self.intensity_max;
        sets.run_length.bin_number = self.bin_count;
        sets.run_length.pixel_intensity_min = self.intensity_min;
        sets.run_length.pixel_intensity_max = self.intensity_max;
    }
}

/// 100 bins per started 1000 units of dynamic range.
///
/// A zero-width range gives zero bins; callers decide how to treat that.
/// Ranges too wide for a `u32` count saturate at the largest multiple of 100.
///
/// ```
/// use bonetexture_core::suggestion::bins_for_range;
///
/// assert_eq!(bins_for_range(0.0, 4000.0), 400);
/// assert_eq!(bins_for_range(-500.0, 3000.0), 400);
/// assert_eq!(bins_for_range(0.0, 0.0), 0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bins_for_range(intensity_min: f64, intensity_max: f64) -> u32 {
    let steps = ((intensity_max - intensity_min).abs() / INTENSITY_RANGE_STEP).ceil();
    BINS_PER_RANGE_STEP * (steps as u32).min(u32::MAX / BINS_PER_RANGE_STEP)
}

/// Derives [`ParameterSuggestion`]s from a statistics source.
pub struct ParameterSuggestionEngine<S> {
    statistics: S,
}

impl<S: RegionStatistics> ParameterSuggestionEngine<S> {
    #[must_use]
    pub fn new(statistics: S) -> Self {
        Self { statistics }
    }

    /// Validate the inputs, then suggest bins and range from the region's extent.
    pub fn suggest(
        &self,
        scan: Option<&ImageVolume>,
        mask: Option<&RegionMask>,
    ) -> Result<ParameterSuggestion, SuggestionError> {
        validate(scan, mask)?;
        let scan = scan.ok_or(ValidationError::MissingScan)?;
        let (intensity_min, intensity_max) = self.statistics.region_min_max(scan, mask)?;
        let suggestion = ParameterSuggestion {
            bin_count: bins_for_range(intensity_min, intensity_max),
            intensity_min,
            intensity_max,
        };

        if suggestion.is_degenerate() {
            tracing::warn!(
                intensity = intensity_min,
                "Region has a single intensity value; suggested bin count is zero"
            );
        } else {
            tracing::info!(
                bins = suggestion.bin_count,
                min = intensity_min,
                max = intensity_max,
                "Suggested texture parameters"
            );
        }
        Ok(suggestion)
    }
}
