//! Constants for parameter defaults, tolerances and filter conventions.

/// Absolute per-axis tolerance when comparing scan and mask spacing/origin.
pub const GEOMETRY_TOLERANCE: f64 = 1e-4;

/// Bins added for every [`INTENSITY_RANGE_STEP`] units of dynamic range.
pub const BINS_PER_RANGE_STEP: u32 = 100;

/// Intensity span that earns another [`BINS_PER_RANGE_STEP`] bins.
pub const INTENSITY_RANGE_STEP: f64 = 1000.0;

/// Name of the return parameter holding the comma-separated feature vector.
pub const FEATURE_OUTPUT_FIELD: &str = "outputVector";

/// Flag under which filters accept the path of their return parameter file.
pub const RETURN_PARAMETER_FLAG: &str = "--returnparameterfile";

/// Default label value marking the region of interest inside the mask.
pub const DEFAULT_INSIDE_MASK: i64 = 1;

/// Default number of histogram bins before any suggestion is applied.
pub const DEFAULT_BIN_NUMBER: u32 = 10;

/// Default lower bound of the intensity range.
pub const DEFAULT_PIXEL_INTENSITY_MIN: f64 = 0.0;

/// Default upper bound of the intensity range.
pub const DEFAULT_PIXEL_INTENSITY_MAX: f64 = 4000.0;

/// Default neighborhood radius, in voxels.
pub const DEFAULT_NEIGHBORHOOD_RADIUS: u32 = 4;

/// Default minimum run-length distance.
pub const DEFAULT_DISTANCE_MIN: f64 = 0.0;

/// Default maximum run-length distance.
pub const DEFAULT_DISTANCE_MAX: f64 = 1.0;

/// Default morphometry threshold.
pub const DEFAULT_MORPHOMETRY_THRESHOLD: f64 = 1.0;

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Waiting for job outcomes timed out.
    pub const ERROR_TIMEOUT: i32 = 2;
    /// Invalid input data or configuration.
    pub const ERROR_INPUT: i32 = 4;
    /// At least one launched job did not complete.
    pub const ERROR_JOB_FAILED: i32 = 5;
}
