//! Per-region intensity statistics.

use rayon::prelude::*;

use crate::volume::{ImageVolume, RegionMask};

/// Errors computing region statistics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatisticsError {
    /// The scan was loaded without inline voxel values.
    #[error("scan {0:?} has no voxel data for statistics")]
    VoxelDataUnavailable(String),

    /// The mask was loaded without inline labels.
    #[error("mask {0:?} has no label data for statistics")]
    LabelDataUnavailable(String),

    /// The mask contains no labeled voxel.
    #[error("the region of interest is empty")]
    EmptyRegion,
}

/// Source of per-region minimum and maximum intensity.
pub trait RegionStatistics: Send + Sync {
    /// Minimum and maximum scan intensity inside the mask's region of interest.
    fn region_min_max(
        &self,
        scan: &ImageVolume,
        mask: Option<&RegionMask>,
    ) -> Result<(f64, f64), StatisticsError>;
}

/// Computes statistics from inline voxel data.
///
/// The region is the lowest non-zero label in the mask, i.e. the first
/// segment of the label map. Without a mask the whole scan is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelStatistics;

impl VoxelStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RegionStatistics for VoxelStatistics {
    fn region_min_max(
        &self,
        scan: &ImageVolume,
        mask: Option<&RegionMask>,
    ) -> Result<(f64, f64), StatisticsError> {
        let voxels = scan
            .voxels
            .as_deref()
            .ok_or_else(|| StatisticsError::VoxelDataUnavailable(scan.name.clone()))?;

        let (min, max, count) = match mask {
            None => voxels
                .par_iter()
                .map(|&v| (v, v, 1usize))
                .reduce(empty_extent, merge_extent),
            Some(mask) => {
                let labels = mask
                    .labels
                    .as_deref()
                    .ok_or_else(|| StatisticsError::LabelDataUnavailable(mask.name.clone()))?;
                let region = labels
                    .par_iter()
                    .copied()
                    .filter(|&label| label != 0)
                    .min()
                    .ok_or(StatisticsError::EmptyRegion)?;
                tracing::debug!(region, mask = %mask.name, "Computing statistics for label");
                voxels
                    .par_iter()
                    .zip(labels.par_iter())
                    .filter(|&(_, &label)| label == region)
                    .map(|(&v, _)| (v, v, 1usize))
                    .reduce(empty_extent, merge_extent)
            }
        };

        if count == 0 {
            return Err(StatisticsError::EmptyRegion);
        }
        Ok((min, max))
    }
}

fn empty_extent() -> (f64, f64, usize) {
    (f64::INFINITY, f64::NEG_INFINITY, 0)
}

fn merge_extent(a: (f64, f64, usize), b: (f64, f64, usize)) -> (f64, f64, usize) {
    (a.0.min(b.0), a.1.max(b.1), a.2 + b.2)
}
