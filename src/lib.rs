//! Shared fixtures for the cross-crate integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use bonetexture_core::features::{FeatureResultSet, FilterKind};
use bonetexture_core::job::JobError;
use bonetexture_core::volume::{Geometry, ImageVolume, RegionMask};
use bonetexture_orchestration::host_runtime::HostDrivenRuntime;
use bonetexture_orchestration::interfaces::ResultConsumer;
use bonetexture_orchestration::orchestrator::JobOrchestrator;

/// Unit-spaced geometry at the origin.
///
/// # Panics
///
/// Panics if `dimensions` is empty or contains a zero.
#[must_use]
pub fn geometry(dimensions: &[usize]) -> Geometry {
    let rank = dimensions.len();
    Geometry::new(dimensions.to_vec(), vec![1.0; rank], vec![0.0; rank])
        .expect("fixture geometry")
}

/// Scalar scan with inline intensities.
///
/// # Panics
///
/// Panics if `voxels` does not match the geometry.
#[must_use]
pub fn scan(dimensions: &[usize], voxels: Vec<f64>) -> ImageVolume {
    ImageVolume::scalar("scan", "/data/scan.nrrd", geometry(dimensions))
        .with_voxels(voxels)
        .expect("fixture voxels")
}

/// Mask with inline labels.
///
/// # Panics
///
/// Panics if `labels` does not match the geometry.
#[must_use]
pub fn mask(dimensions: &[usize], labels: Vec<i64>) -> RegionMask {
    RegionMask::new("mask", "/data/mask.nrrd", geometry(dimensions))
        .with_labels(labels)
        .expect("fixture labels")
}

/// Canned output text for a family, `base, base+1, ...`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn output_text(kind: FilterKind, base: f64) -> String {
    (0..kind.feature_count())
        .map(|i| (base + i as f64).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// What a [`RecordingConsumer`] was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Updated(FilterKind),
    FeatureMap(FilterKind, PathBuf),
    Failed(JobError),
}

/// Consumer that records every notification and the last result set.
#[derive(Default)]
pub struct RecordingConsumer {
    events: Mutex<Vec<Event>>,
    last: Mutex<FeatureResultSet>,
}

impl RecordingConsumer {
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Result set passed with the most recent update.
    #[must_use]
    pub fn last_results(&self) -> FeatureResultSet {
        self.last.lock().clone()
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::Updated(_)))
            .count()
    }
}

impl ResultConsumer for RecordingConsumer {
    fn on_results_updated(&self, kind: FilterKind, results: &FeatureResultSet) {
        *self.last.lock() = results.clone();
        self.events.lock().push(Event::Updated(kind));
    }

    fn on_feature_map_ready(&self, kind: FilterKind, path: &Path) {
        self.events
            .lock()
            .push(Event::FeatureMap(kind, path.to_path_buf()));
    }

    fn on_job_failed(&self, error: &JobError) {
        self.events.lock().push(Event::Failed(error.clone()));
    }
}

/// Orchestrator over a host-driven runtime, with a recording consumer.
#[must_use]
pub fn harness() -> (
    Arc<HostDrivenRuntime>,
    Arc<RecordingConsumer>,
    JobOrchestrator,
) {
    let runtime = Arc::new(HostDrivenRuntime::new());
    let consumer = Arc::new(RecordingConsumer::default());
    let orchestrator = JobOrchestrator::new(runtime.clone(), consumer.clone());
    (runtime, consumer, orchestrator)
}
