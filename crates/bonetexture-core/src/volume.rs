//! Scan volumes, region masks and their on-disk descriptors.
//!
//! The external filters read the image files themselves; this crate only
//! needs each volume's geometry and, for statistics, its voxel values.
//! Both are described by a small JSON descriptor next to the image.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors loading or constructing a volume.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    /// Descriptor could not be read.
    #[error("cannot read descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor is not valid JSON for the expected schema.
    #[error("cannot parse descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Geometry vectors do not describe the same number of axes.
    #[error("geometry rank mismatch: {dimensions} dimensions, {spacing} spacing, {origin} origin values")]
    RankMismatch {
        dimensions: usize,
        spacing: usize,
        origin: usize,
    },

    /// A dimension is zero or the volume has no axes.
    #[error("volume must have at least one axis and no empty dimension")]
    EmptyVolume,

    /// Inline data does not match the geometry.
    #[error("expected {expected} values, found {actual}")]
    DataLength { expected: usize, actual: usize },

    /// Component count of zero.
    #[error("a volume needs at least one component per voxel")]
    NoComponents,
}

/// Grid geometry shared by scans and masks.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub dimensions: Vec<usize>,
    pub spacing: Vec<f64>,
    pub origin: Vec<f64>,
}

impl Geometry {
    /// Build a geometry, checking that all vectors have the same rank.
    pub fn new(
        dimensions: Vec<usize>,
        spacing: Vec<f64>,
        origin: Vec<f64>,
    ) -> Result<Self, VolumeError> {
        let geometry = Self {
            dimensions,
            spacing,
            origin,
        };
        geometry.check()?;
        Ok(geometry)
    }

    /// Number of axes.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of voxels in the grid.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.dimensions.iter().product()
    }

    fn check(&self) -> Result<(), VolumeError> {
        if self.dimensions.len() != self.spacing.len() || self.dimensions.len() != self.origin.len()
        {
            return Err(VolumeError::RankMismatch {
                dimensions: self.dimensions.len(),
                spacing: self.spacing.len(),
                origin: self.origin.len(),
            });
        }
        if self.dimensions.is_empty() || self.dimensions.contains(&0) {
            return Err(VolumeError::EmptyVolume);
        }
        Ok(())
    }
}

/// Voxel type of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelKind {
    Scalar,
    /// Multi-component (e.g. RGB) voxels; must be converted before analysis.
    Vector { components: usize },
}

impl PixelKind {
    fn from_components(components: usize) -> Result<Self, VolumeError> {
        match components {
            0 => Err(VolumeError::NoComponents),
            1 => Ok(PixelKind::Scalar),
            n => Ok(PixelKind::Vector { components: n }),
        }
    }

    /// Values stored per voxel.
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            PixelKind::Scalar => 1,
            PixelKind::Vector { components } => components,
        }
    }
}

/// An N-dimensional scan handed to the texture filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVolume {
    pub name: String,
    pub path: PathBuf,
    pub geometry: Geometry,
    pub pixel: PixelKind,
    /// Inline intensities, interleaved per component; needed only for statistics.
    pub voxels: Option<Vec<f64>>,
}

impl ImageVolume {
    /// A scalar scan without inline voxel data.
    #[must_use]
    pub fn scalar(name: impl Into<String>, path: impl Into<PathBuf>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            geometry,
            pixel: PixelKind::Scalar,
            voxels: None,
        }
    }

    /// Attach inline voxel data, checking its length against the geometry.
    pub fn with_voxels(mut self, voxels: Vec<f64>) -> Result<Self, VolumeError> {
        let expected = self.geometry.voxel_count() * self.pixel.components();
        if voxels.len() != expected {
            return Err(VolumeError::DataLength {
                expected,
                actual: voxels.len(),
            });
        }
        self.voxels = Some(voxels);
        Ok(self)
    }

    /// Whether voxels carry more than one component.
    #[must_use]
    pub fn is_vector(&self) -> bool {
        matches!(self.pixel, PixelKind::Vector { .. })
    }

    /// Load a scan from its JSON descriptor.
    pub fn load(path: &Path) -> Result<Self, VolumeError> {
        let raw = read_descriptor(path)?;
        let geometry = Geometry::new(raw.dimensions, raw.spacing, raw.origin)?;
        let pixel = PixelKind::from_components(raw.components)?;
        let volume = Self {
            name: raw.name.unwrap_or_else(|| stem(&raw.path)),
            path: resolve(path, raw.path),
            geometry,
            pixel,
            voxels: None,
        };
        match raw.voxels {
            Some(voxels) => volume.with_voxels(voxels),
            None => Ok(volume),
        }
    }
}

/// A labeled volume delimiting the region of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    pub name: String,
    pub path: PathBuf,
    pub geometry: Geometry,
    /// Inline labels (0 = background); needed only for statistics.
    pub labels: Option<Vec<i64>>,
}

impl RegionMask {
    /// A mask without inline label data.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            geometry,
            labels: None,
        }
    }

    /// Attach inline labels, checking their count against the geometry.
    pub fn with_labels(mut self, labels: Vec<i64>) -> Result<Self, VolumeError> {
        let expected = self.geometry.voxel_count();
        if labels.len() != expected {
            return Err(VolumeError::DataLength {
                expected,
                actual: labels.len(),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Load a mask from its JSON descriptor.
    pub fn load(path: &Path) -> Result<Self, VolumeError> {
        let raw = read_descriptor(path)?;
        let geometry = Geometry::new(raw.dimensions, raw.spacing, raw.origin)?;
        let mask = Self {
            name: raw.name.unwrap_or_else(|| stem(&raw.path)),
            path: resolve(path, raw.path),
            geometry,
            labels: None,
        };
        match raw.labels {
            Some(labels) => mask.with_labels(labels),
            None => Ok(mask),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    #[serde(default)]
    name: Option<String>,
    path: PathBuf,
    dimensions: Vec<usize>,
    spacing: Vec<f64>,
    origin: Vec<f64>,
    #[serde(default = "one")]
    components: usize,
    #[serde(default)]
    voxels: Option<Vec<f64>>,
    #[serde(default)]
    labels: Option<Vec<i64>>,
}

fn one() -> usize {
    1
}

fn read_descriptor(path: &Path) -> Result<Descriptor, VolumeError> {
    let text = std::fs::read_to_string(path).map_err(|source| VolumeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| VolumeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Image paths inside a descriptor are relative to the descriptor itself.
fn resolve(descriptor: &Path, image: PathBuf) -> PathBuf {
    if image.is_absolute() {
        return image;
    }
    match descriptor.parent() {
        Some(dir) => dir.join(image),
        None => image,
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry_3d() -> Geometry {
        Geometry::new(vec![2, 2, 2], vec![0.5; 3], vec![0.0; 3]).unwrap()
    }

    #[test]
    fn geometry_rank_mismatch() {
        let err = Geometry::new(vec![2, 2], vec![1.0; 3], vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, VolumeError::RankMismatch { .. }));
    }

    #[test]
    fn geometry_rejects_empty_axis() {
        assert!(matches!(
            Geometry::new(vec![4, 0], vec![1.0; 2], vec![0.0; 2]),
            Err(VolumeError::EmptyVolume)
        ));
        assert!(matches!(
            Geometry::new(vec![], vec![], vec![]),
            Err(VolumeError::EmptyVolume)
        ));
    }

    #[test]
    fn voxel_count() {
        assert_eq!(geometry_3d().voxel_count(), 8);
        assert_eq!(geometry_3d().rank(), 3);
    }

    #[test]
    fn with_voxels_checks_length() {
        let scan = ImageVolume::scalar("ct", "ct.nrrd", geometry_3d());
        assert!(scan.clone().with_voxels(vec![0.0; 8]).is_ok());
        assert!(matches!(
            scan.with_voxels(vec![0.0; 7]),
            Err(VolumeError::DataLength {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn vector_volume_needs_interleaved_data() {
        let mut scan = ImageVolume::scalar("rgb", "rgb.nrrd", geometry_3d());
        scan.pixel = PixelKind::Vector { components: 3 };
        assert!(scan.is_vector());
        assert!(scan.with_voxels(vec![0.0; 24]).is_ok());
    }

    #[test]
    fn load_scan_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("scan.json");
        std::fs::write(
            &descriptor,
            r#"{"path": "scan.nrrd", "dimensions": [2, 1], "spacing": [0.1, 0.1],
                "origin": [0, 0], "voxels": [10, 20]}"#,
        )
        .unwrap();

        let scan = ImageVolume::load(&descriptor).unwrap();
        assert_eq!(scan.name, "scan");
        assert_eq!(scan.path, dir.path().join("scan.nrrd"));
        assert_eq!(scan.pixel, PixelKind::Scalar);
        assert_eq!(scan.voxels.as_deref(), Some(&[10.0, 20.0][..]));
    }

    #[test]
    fn load_vector_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("rgb.json");
        std::fs::write(
            &descriptor,
            r#"{"name": "photo", "path": "/data/rgb.nrrd", "dimensions": [2],
                "spacing": [1], "origin": [0], "components": 3}"#,
        )
        .unwrap();

        let scan = ImageVolume::load(&descriptor).unwrap();
        assert_eq!(scan.name, "photo");
        assert_eq!(scan.path, PathBuf::from("/data/rgb.nrrd"));
        assert_eq!(scan.pixel, PixelKind::Vector { components: 3 });
    }

    #[test]
    fn load_mask_descriptor_checks_labels() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("mask.json");
        std::fs::write(
            &descriptor,
            r#"{"path": "mask.nrrd", "dimensions": [3], "spacing": [1], "origin": [0],
                "labels": [0, 1]}"#,
        )
        .unwrap();
        assert!(matches!(
            RegionMask::load(&descriptor),
            Err(VolumeError::DataLength { .. })
        ));
    }

    #[test]
    fn load_missing_file() {
        assert!(matches!(
            ImageVolume::load(Path::new("/nonexistent/scan.json")),
            Err(VolumeError::Io { .. })
        ));
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("scan.json");
        std::fs::write(
            &descriptor,
            r#"{"path": "a", "dimensions": [1], "spacing": [1], "origin": [0], "spacng": 2}"#,
        )
        .unwrap();
        assert!(matches!(
            ImageVolume::load(&descriptor),
            Err(VolumeError::Parse { .. })
        ));
    }
}
