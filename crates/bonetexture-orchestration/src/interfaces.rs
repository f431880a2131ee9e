//! Orchestration interfaces.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bonetexture_core::features::{FeatureResultSet, FeatureVector, FilterKind};
use bonetexture_core::job::{ComputationJob, JobError, JobId, JobPayload};

/// Errors raised by an execution runtime when creating or starting a job.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The filter executable could not be located.
    #[error("filter executable {name} not found in {location}")]
    ExecutableNotFound { name: String, location: String },

    /// The worker for the job could not be started.
    #[error("cannot start job worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The runtime does not accept jobs of this kind.
    #[error("runtime refused the {0} job")]
    Refused(FilterKind),
}

/// Host facility that executes external filter jobs without blocking.
pub trait ExecutionRuntime: Send + Sync {
    /// Create an idle job for the payload. Nothing runs yet.
    fn create_job(&self, payload: JobPayload) -> Result<Arc<ComputationJob>, RuntimeError>;

    /// Start the job and return immediately; status changes arrive through
    /// the job's observers.
    fn run(&self, job: Arc<ComputationJob>) -> Result<(), RuntimeError>;
}

/// Receiver of results as jobs finish, e.g. a table display.
pub trait ResultConsumer: Send + Sync {
    /// A feature vector for `kind` was stored; `results` is the full set.
    fn on_results_updated(&self, kind: FilterKind, results: &FeatureResultSet);

    /// A feature-map volume for `kind` was written.
    fn on_feature_map_ready(&self, kind: FilterKind, path: &Path);

    /// A launched job did not produce a usable result.
    fn on_job_failed(&self, error: &JobError);
}

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq)]
pub enum JobSuccess {
    Features(FeatureVector),
    FeatureMap(PathBuf),
}

/// Terminal outcome of a single job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Filter family.
    pub kind: FilterKind,
    /// Runtime job id.
    pub job: JobId,
    /// The result or a structured error.
    pub outcome: Result<JobSuccess, JobError>,
    /// Time from launch to terminal status.
    pub duration: Duration,
}

/// Null result consumer (does nothing).
pub struct NullResultConsumer;

impl ResultConsumer for NullResultConsumer {
    fn on_results_updated(&self, _kind: FilterKind, _results: &FeatureResultSet) {}
    fn on_feature_map_ready(&self, _kind: FilterKind, _path: &Path) {}
    fn on_job_failed(&self, _error: &JobError) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_consumer() {
        let consumer = NullResultConsumer;
        consumer.on_results_updated(FilterKind::Cooccurrence, &FeatureResultSet::new());
        consumer.on_feature_map_ready(FilterKind::Morphometry, Path::new("/tmp/BM.nrrd"));
        consumer.on_job_failed(&JobError::Failed {
            kind: FilterKind::RunLength,
            status: "Failed".into(),
        });
    }

    #[test]
    fn runtime_error_messages() {
        let err = RuntimeError::ExecutableNotFound {
            name: "computeBMFeatures".into(),
            location: "PATH".into(),
        };
        assert_eq!(
            err.to_string(),
            "filter executable computeBMFeatures not found in PATH"
        );
        assert_eq!(
            RuntimeError::Refused(FilterKind::Cooccurrence).to_string(),
            "runtime refused the GLCM job"
        );
    }
}
