//! Filter families, feature names, and the per-family result vectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Co-occurrence (GLCM) feature names, in filter output order.
pub const COOCCURRENCE_FEATURES: [&str; 8] = [
    "energy",
    "entropy",
    "correlation",
    "inverseDifferenceMoment",
    "inertia",
    "clusterShade",
    "clusterProminence",
    "haralickCorrelation",
];

/// Run-length (GLRLM) feature names, in filter output order.
pub const RUN_LENGTH_FEATURES: [&str; 10] = [
    "shortRunEmphasis",
    "longRunEmphasis",
    "greyLevelNonuniformity",
    "runLengthNonuniformity",
    "lowGreyLevelRunEmphasis",
    "highGreyLevelRunEmphasis",
    "shortRunLowGreyLevelEmphasis",
    "shortRunHighGreyLevelEmphasis",
    "longRunLowGreyLevelEmphasis",
    "longRunHighGreyLevelEmphasis",
];

/// Bone morphometry feature names, in filter output order.
pub const MORPHOMETRY_FEATURES: [&str; 5] = ["BVTV", "TbTh", "TbSp", "TbN", "BSBV"];

/// The three external filter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Cooccurrence,
    RunLength,
    Morphometry,
}

impl FilterKind {
    /// All filter kinds in table order.
    pub const ALL: [FilterKind; 3] = [
        FilterKind::Cooccurrence,
        FilterKind::RunLength,
        FilterKind::Morphometry,
    ];

    /// Slot index inside a [`FeatureResultSet`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            FilterKind::Cooccurrence => 0,
            FilterKind::RunLength => 1,
            FilterKind::Morphometry => 2,
        }
    }

    /// Short label used in logs, tables and output file names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Cooccurrence => "GLCM",
            FilterKind::RunLength => "GLRLM",
            FilterKind::Morphometry => "BM",
        }
    }

    /// Feature names produced by this family.
    #[must_use]
    pub fn feature_names(self) -> &'static [&'static str] {
        match self {
            FilterKind::Cooccurrence => &COOCCURRENCE_FEATURES,
            FilterKind::RunLength => &RUN_LENGTH_FEATURES,
            FilterKind::Morphometry => &MORPHOMETRY_FEATURES,
        }
    }

    /// Fixed length of the result vector.
    #[must_use]
    pub fn feature_count(self) -> usize {
        self.feature_names().len()
    }

    /// Executable computing the aggregate feature vector.
    #[must_use]
    pub fn feature_executable(self) -> &'static str {
        match self {
            FilterKind::Cooccurrence => "computeGLCMFeatures",
            FilterKind::RunLength => "computeGLRLMFeatures",
            FilterKind::Morphometry => "computeBMFeatures",
        }
    }

    /// Executable computing per-voxel feature maps.
    #[must_use]
    pub fn feature_map_executable(self) -> &'static str {
        match self {
            FilterKind::Cooccurrence => "computeGLCMFeatureMaps",
            FilterKind::RunLength => "computeGLRLMFeatureMaps",
            FilterKind::Morphometry => "computeBMFeatureMaps",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error parsing a filter kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter kind: {0}")]
pub struct UnknownFilterKind(pub String);

impl FromStr for FilterKind {
    type Err = UnknownFilterKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "glcm" | "cooccurrence" | "co-occurrence" => Ok(FilterKind::Cooccurrence),
            "glrlm" | "rl" | "runlength" | "run-length" => Ok(FilterKind::RunLength),
            "bm" | "morphometry" => Ok(FilterKind::Morphometry),
            other => Err(UnknownFilterKind(other.to_string())),
        }
    }
}

/// Error parsing a filter's textual output into a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureParseError {
    /// A component is not a number.
    #[error("component {index} is not a number: {text:?}")]
    NotANumber { index: usize, text: String },

    /// The component count differs from the family's feature count.
    #[error("expected {expected} components, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// A complete, fixed-length result vector for one filter family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    kind: FilterKind,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector, checking its length against the family.
    pub fn new(kind: FilterKind, values: Vec<f64>) -> Result<Self, FeatureParseError> {
        if values.len() != kind.feature_count() {
            return Err(FeatureParseError::WrongLength {
                expected: kind.feature_count(),
                actual: values.len(),
            });
        }
        Ok(Self { kind, values })
    }

    /// Parse a comma-separated list of numbers as emitted by the filters.
    ///
    /// ```
    /// use bonetexture_core::features::{FeatureVector, FilterKind};
    ///
    /// let v = FeatureVector::parse(FilterKind::Morphometry, "0.2, 0.1,0.4,2.5,12").unwrap();
    /// assert_eq!(v.values()[3], 2.5);
    /// assert!(FeatureVector::parse(FilterKind::Morphometry, "1,2").is_err());
    /// ```
    pub fn parse(kind: FilterKind, text: &str) -> Result<Self, FeatureParseError> {
        let values = text
            .split(',')
            .enumerate()
            .map(|(index, part)| {
                let part = part.trim();
                part.parse::<f64>()
                    .map_err(|_| FeatureParseError::NotANumber {
                        index,
                        text: part.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(kind, values)
    }

    /// The family this vector belongs to.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// The feature values, in name order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Pair each value with its feature name.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.kind
            .feature_names()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

/// The most recent result vector per filter family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureResultSet {
    slots: [Option<FeatureVector>; 3],
}

impl FeatureResultSet {
    /// Create an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest vector for `kind`, if its job has completed at least once.
    #[must_use]
    pub fn get(&self, kind: FilterKind) -> Option<&FeatureVector> {
        self.slots[kind.index()].as_ref()
    }

    /// Store a vector in its family's slot, returning the previous one.
    pub fn store(&mut self, vector: FeatureVector) -> Option<FeatureVector> {
        let index = vector.kind().index();
        self.slots[index].replace(vector)
    }

    /// Whether no slot holds a result.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterate over the filled slots in table order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.slots.iter().flatten()
    }
}
