//! # bonetexture-core
//!
//! Core library for BoneTexture-rs: scan and mask volumes, per-family
//! filter parameters, input validation, parameter suggestion from region
//! statistics, and the job records external filter runs report through.

pub mod constants;
pub mod features;
pub mod job;
pub mod observer;
pub mod params;
pub mod statistics;
pub mod suggestion;
pub mod validation;
pub mod volume;

// Re-exports
pub use constants::{exit_codes, FEATURE_OUTPUT_FIELD, GEOMETRY_TOLERANCE};
pub use features::{FeatureResultSet, FeatureVector, FilterKind};
pub use job::{ComputationJob, JobError, JobPayload, JobStatus, OutputMode};
pub use observer::{ObserverControl, StatusObserver, StatusSubject};
pub use params::{FeatureParameterSet, ParameterSets};
pub use statistics::{RegionStatistics, VoxelStatistics};
pub use suggestion::{bins_for_range, ParameterSuggestion, ParameterSuggestionEngine};
pub use validation::{validate, ValidationError};
pub use volume::{Geometry, ImageVolume, PixelKind, RegionMask};
