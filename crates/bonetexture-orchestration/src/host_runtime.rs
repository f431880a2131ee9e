//! Runtime whose jobs are driven by the host application.
//!
//! Creating and running a job only records it. The host (an embedding
//! application, or a test) then reports status changes and outputs for
//! each job in whatever order the computations actually finish.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use bonetexture_core::constants::FEATURE_OUTPUT_FIELD;
use bonetexture_core::features::FilterKind;
use bonetexture_core::job::{ComputationJob, JobPayload, JobStatus};

use crate::interfaces::{ExecutionRuntime, RuntimeError};

/// Records jobs and lets the host drive them.
///
/// Started jobs are held until [`HostDrivenRuntime::forget_finished`] drops
/// the terminal ones; long-lived hosts should call it after each batch.
#[derive(Default)]
pub struct HostDrivenRuntime {
    created: AtomicUsize,
    started: Mutex<Vec<Arc<ComputationJob>>>,
    refused: Mutex<HashSet<FilterKind>>,
}

impl HostDrivenRuntime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs created so far, started or not.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Jobs handed to [`ExecutionRuntime::run`], in start order.
    #[must_use]
    pub fn started_jobs(&self) -> Vec<Arc<ComputationJob>> {
        self.started.lock().clone()
    }

    /// Most recently started feature job of `kind`.
    #[must_use]
    pub fn job_for(&self, kind: FilterKind) -> Option<Arc<ComputationJob>> {
        self.started
            .lock()
            .iter()
            .rev()
            .find(|job| job.kind() == kind && !job.payload().mode.is_feature_map())
            .cloned()
    }

    /// Drop started jobs that reached a terminal status. Returns how many went.
    pub fn forget_finished(&self) -> usize {
        let mut started = self.started.lock();
        let before = started.len();
        started.retain(|job| !job.status().is_terminal());
        before - started.len()
    }

    /// Make `create_job` fail for `kind`.
    pub fn refuse(&self, kind: FilterKind) {
        self.refused.lock().insert(kind);
    }

    /// Report a status for the latest job of `kind`. Returns false if there is none.
    pub fn report_status(&self, kind: FilterKind, status: JobStatus) -> bool {
        match self.job_for(kind) {
            Some(job) => {
                job.set_status(status);
                true
            }
            None => false,
        }
    }

    /// Store `output` as the feature vector text, then mark the job completed.
    pub fn report_completed(&self, kind: FilterKind, output: &str) -> bool {
        match self.job_for(kind) {
            Some(job) => {
                job.set_output(FEATURE_OUTPUT_FIELD, output);
                job.set_status(JobStatus::Completed);
                true
            }
            None => false,
        }
    }
}

impl ExecutionRuntime for HostDrivenRuntime {
    fn create_job(&self, payload: JobPayload) -> Result<Arc<ComputationJob>, RuntimeError> {
        let kind = payload.kind();
        if self.refused.lock().contains(&kind) {
            return Err(RuntimeError::Refused(kind));
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(ComputationJob::new(payload)))
    }

    fn run(&self, job: Arc<ComputationJob>) -> Result<(), RuntimeError> {
        self.started.lock().push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonetexture_core::job::OutputMode;
    use bonetexture_core::params::ParameterSets;

    fn payload(kind: FilterKind) -> JobPayload {
        JobPayload::new(
            ParameterSets::default().snapshot(kind),
            "/data/scan.nrrd".into(),
            None,
            OutputMode::Features,
        )
    }

    #[test]
    fn create_does_not_start() {
        let runtime = HostDrivenRuntime::new();
        let job = runtime.create_job(payload(FilterKind::RunLength)).unwrap();
        assert_eq!(runtime.created_count(), 1);
        assert!(runtime.started_jobs().is_empty());
        assert!(!runtime.report_status(FilterKind::RunLength, JobStatus::Running));

        runtime.run(job).unwrap();
        assert!(runtime.report_status(FilterKind::RunLength, JobStatus::Running));
        assert!(runtime.job_for(FilterKind::RunLength).unwrap().is_busy());
    }

    #[test]
    fn completed_output_is_recorded() {
        let runtime = HostDrivenRuntime::new();
        let job = runtime.create_job(payload(FilterKind::Morphometry)).unwrap();
        runtime.run(Arc::clone(&job)).unwrap();
        assert!(runtime.report_completed(FilterKind::Morphometry, "1,2,3,4,5"));
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(
            job.output_field(FEATURE_OUTPUT_FIELD).as_deref(),
            Some("1,2,3,4,5")
        );
    }

    #[test]
    fn finished_jobs_are_forgotten() {
        let runtime = HostDrivenRuntime::new();
        for kind in FilterKind::ALL {
            let job = runtime.create_job(payload(kind)).unwrap();
            runtime.run(job).unwrap();
        }
        runtime.report_completed(FilterKind::Morphometry, "1,2,3,4,5");
        runtime.report_status(FilterKind::RunLength, JobStatus::Failed);
        runtime.report_status(FilterKind::Cooccurrence, JobStatus::Running);

        assert_eq!(runtime.forget_finished(), 2);
        assert_eq!(runtime.started_jobs().len(), 1);
        assert!(runtime.job_for(FilterKind::Morphometry).is_none());
        assert!(runtime.job_for(FilterKind::Cooccurrence).is_some());
        assert_eq!(runtime.created_count(), 3);

        runtime.report_status(FilterKind::Cooccurrence, JobStatus::Cancelled);
        assert_eq!(runtime.forget_finished(), 1);
        assert!(runtime.started_jobs().is_empty());
    }

    #[test]
    fn refused_kind() {
        let runtime = HostDrivenRuntime::new();
        runtime.refuse(FilterKind::Cooccurrence);
        assert!(matches!(
            runtime.create_job(payload(FilterKind::Cooccurrence)),
            Err(RuntimeError::Refused(FilterKind::Cooccurrence))
        ));
        assert!(runtime.create_job(payload(FilterKind::Morphometry)).is_ok());
    }
}
