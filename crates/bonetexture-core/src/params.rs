//! Filter parameter sets.
//!
//! One concrete struct per filter family. Field names serialize in camelCase,
//! matching the flags the external filters accept, so a parameter file reads
//! the same as the filter's command line.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIN_NUMBER, DEFAULT_DISTANCE_MAX, DEFAULT_DISTANCE_MIN, DEFAULT_INSIDE_MASK,
    DEFAULT_MORPHOMETRY_THRESHOLD, DEFAULT_NEIGHBORHOOD_RADIUS, DEFAULT_PIXEL_INTENSITY_MAX,
    DEFAULT_PIXEL_INTENSITY_MIN,
};
use crate::features::FilterKind;

/// Co-occurrence (GLCM) filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CooccurrenceParams {
    pub inside_mask: i64,
    pub bin_number: u32,
    pub pixel_intensity_min: f64,
    pub pixel_intensity_max: f64,
    pub neighborhood_radius: u32,
}

impl Default for CooccurrenceParams {
    fn default() -> Self {
        Self {
            inside_mask: DEFAULT_INSIDE_MASK,
            bin_number: DEFAULT_BIN_NUMBER,
            pixel_intensity_min: DEFAULT_PIXEL_INTENSITY_MIN,
            pixel_intensity_max: DEFAULT_PIXEL_INTENSITY_MAX,
            neighborhood_radius: DEFAULT_NEIGHBORHOOD_RADIUS,
        }
    }
}

/// Run-length (GLRLM) filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RunLengthParams {
    pub inside_mask: i64,
    pub bin_number: u32,
    pub pixel_intensity_min: f64,
    pub pixel_intensity_max: f64,
    pub neighborhood_radius: u32,
    pub distance_min: f64,
    pub distance_max: f64,
}

impl Default for RunLengthParams {
    fn default() -> Self {
        Self {
            inside_mask: DEFAULT_INSIDE_MASK,
            bin_number: DEFAULT_BIN_NUMBER,
            pixel_intensity_min: DEFAULT_PIXEL_INTENSITY_MIN,
            pixel_intensity_max: DEFAULT_PIXEL_INTENSITY_MAX,
            neighborhood_radius: DEFAULT_NEIGHBORHOOD_RADIUS,
            distance_min: DEFAULT_DISTANCE_MIN,
            distance_max: DEFAULT_DISTANCE_MAX,
        }
    }
}

/// Bone morphometry filter parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MorphometryParams {
    pub threshold: f64,
    pub neighborhood_radius: u32,
}

impl Default for MorphometryParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MORPHOMETRY_THRESHOLD,
            neighborhood_radius: DEFAULT_NEIGHBORHOOD_RADIUS,
        }
    }
}

/// Parameters for a single filter family, snapshotted into a job at launch.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureParameterSet {
    Cooccurrence(CooccurrenceParams),
    RunLength(RunLengthParams),
    Morphometry(MorphometryParams),
}

impl FeatureParameterSet {
    /// The family these parameters configure.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            FeatureParameterSet::Cooccurrence(_) => FilterKind::Cooccurrence,
            FeatureParameterSet::RunLength(_) => FilterKind::RunLength,
            FeatureParameterSet::Morphometry(_) => FilterKind::Morphometry,
        }
    }

    /// Render as `--flag value` pairs, in the filter's declared order.
    #[must_use]
    pub fn to_flags(&self) -> Vec<String> {
        let pairs: Vec<(&str, String)> = match self {
            FeatureParameterSet::Cooccurrence(p) => vec![
                ("insideMask", p.inside_mask.to_string()),
                ("binNumber", p.bin_number.to_string()),
                ("pixelIntensityMin", p.pixel_intensity_min.to_string()),
                ("pixelIntensityMax", p.pixel_intensity_max.to_string()),
                ("neighborhoodRadius", p.neighborhood_radius.to_string()),
            ],
            FeatureParameterSet::RunLength(p) => vec![
                ("insideMask", p.inside_mask.to_string()),
                ("binNumber", p.bin_number.to_string()),
                ("pixelIntensityMin", p.pixel_intensity_min.to_string()),
                ("pixelIntensityMax", p.pixel_intensity_max.to_string()),
                ("neighborhoodRadius", p.neighborhood_radius.to_string()),
                ("distanceMin", p.distance_min.to_string()),
                ("distanceMax", p.distance_max.to_string()),
            ],
            FeatureParameterSet::Morphometry(p) => vec![
                ("threshold", p.threshold.to_string()),
                ("neighborhoodRadius", p.neighborhood_radius.to_string()),
            ],
        };
        pairs
            .into_iter()
            .flat_map(|(name, value)| [format!("--{name}"), value])
            .collect()
    }
}

/// Errors loading a parameter file.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("cannot read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid parameter file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The user-editable parameters of all three families.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ParameterSets {
    pub cooccurrence: CooccurrenceParams,
    pub run_length: RunLengthParams,
    pub morphometry: MorphometryParams,
}

impl ParameterSets {
    /// Load from a JSON file; any omitted family or field keeps its default.
    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Copy the parameters of one family.
    #[must_use]
    pub fn snapshot(&self, kind: FilterKind) -> FeatureParameterSet {
        match kind {
            FilterKind::Cooccurrence => FeatureParameterSet::Cooccurrence(self.cooccurrence.clone()),
            FilterKind::RunLength => FeatureParameterSet::RunLength(self.run_length.clone()),
            FilterKind::Morphometry => FeatureParameterSet::Morphometry(self.morphometry.clone()),
        }
    }
}
