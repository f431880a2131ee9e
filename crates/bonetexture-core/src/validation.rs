//! Scan and mask compatibility checks run before any suggestion or launch.

use crate::constants::GEOMETRY_TOLERANCE;
use crate::volume::{ImageVolume, RegionMask};

/// Reasons a scan/mask pair cannot be analysed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// No scan was selected.
    #[error("please specify an input scan")]
    MissingScan,

    /// The scan has vector voxels and must be converted to scalar first.
    #[error("the input scan has a vector pixel type ({components} components), please convert it to a scalar type first")]
    VectorTypeUnsupported { components: usize },

    /// Scan and mask grids differ in size.
    #[error("the input scan {scan:?} and the input mask {mask:?} must be the same size")]
    DimensionMismatch { scan: Vec<usize>, mask: Vec<usize> },

    /// Scan and mask do not overlap within tolerance.
    #[error("the input scan and the input mask must overlap: {field} differs beyond tolerance")]
    GeometryMismatch { field: &'static str },
}

/// Whether every pair of components is within `max(rel_tol * max(|a|, |b|), abs_tol)`.
///
/// Sequences of different length are never close.
///
/// ```
/// use bonetexture_core::validation::is_close;
///
/// assert!(is_close(&[1.0, 2.0], &[1.00005, 2.0], 0.0, 1e-4));
/// assert!(!is_close(&[1.0], &[1.0002], 0.0, 1e-4));
/// ```
#[must_use]
pub fn is_close(a: &[f64], b: &[f64], rel_tol: f64, abs_tol: f64) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(&x, &y)| {
            (x - y).abs() <= f64::max(rel_tol * f64::max(x.abs(), y.abs()), abs_tol)
        })
}

/// Check a scan (and optional mask) before use.
///
/// Rules run in order and the first failure wins: the scan must be present,
/// must be scalar, and when a mask is given both must share dimensions
/// exactly and spacing and origin within [`GEOMETRY_TOLERANCE`].
pub fn validate(
    scan: Option<&ImageVolume>,
    mask: Option<&RegionMask>,
) -> Result<(), ValidationError> {
    let scan = scan.ok_or(ValidationError::MissingScan)?;
    if scan.is_vector() {
        return Err(ValidationError::VectorTypeUnsupported {
            components: scan.pixel.components(),
        });
    }

    let Some(mask) = mask else {
        return Ok(());
    };

    if scan.geometry.dimensions != mask.geometry.dimensions {
        return Err(ValidationError::DimensionMismatch {
            scan: scan.geometry.dimensions.clone(),
            mask: mask.geometry.dimensions.clone(),
        });
    }
    if !is_close(
        &scan.geometry.spacing,
        &mask.geometry.spacing,
        0.0,
        GEOMETRY_TOLERANCE,
    ) {
        return Err(ValidationError::GeometryMismatch { field: "spacing" });
    }
    if !is_close(
        &scan.geometry.origin,
        &mask.geometry.origin,
        0.0,
        GEOMETRY_TOLERANCE,
    ) {
        return Err(ValidationError::GeometryMismatch { field: "origin" });
    }
    Ok(())
}
