//! Computation job records.
//!
//! A [`ComputationJob`] is the handle an execution runtime hands back for one
//! external filter run. The runtime drives its status; observers registered
//! on the job are told about every change.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::features::FilterKind;
use crate::observer::{StatusObserver, StatusSubject, SubscriptionId};
use crate::params::FeatureParameterSet;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        Self(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a job as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// The runtime's textual status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Idle => "Idle",
            JobStatus::Running => "Running",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// Whether no further transition will happen.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a job produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// One aggregate feature vector for the whole region.
    Features,
    /// A per-voxel feature map volume written to `output`.
    FeatureMap { output: PathBuf },
}

impl OutputMode {
    /// Whether this is a feature-map run.
    #[must_use]
    pub fn is_feature_map(&self) -> bool {
        matches!(self, OutputMode::FeatureMap { .. })
    }
}

/// Everything an external filter needs for one run, captured at launch.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPayload {
    pub parameters: FeatureParameterSet,
    pub input_volume: PathBuf,
    pub input_mask: Option<PathBuf>,
    pub mode: OutputMode,
}

impl JobPayload {
    #[must_use]
    pub fn new(
        parameters: FeatureParameterSet,
        input_volume: PathBuf,
        input_mask: Option<PathBuf>,
        mode: OutputMode,
    ) -> Self {
        Self {
            parameters,
            input_volume,
            input_mask,
            mode,
        }
    }

    /// Filter family of this payload.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        self.parameters.kind()
    }

    /// Command-line arguments for the external filter.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.parameters.to_flags();
        args.push("--inputVolume".into());
        args.push(self.input_volume.display().to_string());
        if let Some(mask) = &self.input_mask {
            args.push("--inputMask".into());
            args.push(mask.display().to_string());
        }
        if let OutputMode::FeatureMap { output } = &self.mode {
            args.push("--outputVolume".into());
            args.push(output.display().to_string());
        }
        args
    }
}

/// Failure of a launched job, reported after the fact.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    /// The runtime reported a terminal status other than Completed.
    #[error("{kind} job finished with status {status}")]
    Failed { kind: FilterKind, status: String },

    /// The job completed but its output could not be used.
    #[error("{kind} job produced unusable output: {reason}")]
    MalformedOutput { kind: FilterKind, reason: String },

    /// The runtime refused to start the job.
    #[error("{kind} job could not be started: {reason}")]
    Launch { kind: FilterKind, reason: String },
}

impl JobError {
    /// Family of the failed job.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            JobError::Failed { kind, .. }
            | JobError::MalformedOutput { kind, .. }
            | JobError::Launch { kind, .. } => *kind,
        }
    }
}

struct JobState {
    status: JobStatus,
    outputs: BTreeMap<String, String>,
    message: Option<String>,
}

/// One in-flight external computation.
pub struct ComputationJob {
    id: JobId,
    payload: JobPayload,
    state: Mutex<JobState>,
    subject: StatusSubject,
}

impl ComputationJob {
    /// Create an idle job.
    #[must_use]
    pub fn new(payload: JobPayload) -> Self {
        Self {
            id: JobId::next(),
            payload,
            state: Mutex::new(JobState {
                status: JobStatus::Idle,
                outputs: BTreeMap::new(),
                message: None,
            }),
            subject: StatusSubject::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> FilterKind {
        self.payload.kind()
    }

    #[must_use]
    pub fn payload(&self) -> &JobPayload {
        &self.payload
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    /// The status in the runtime's textual vocabulary.
    #[must_use]
    pub fn status_string(&self) -> String {
        self.status().as_str().to_string()
    }

    /// Whether the job is still executing.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.status() == JobStatus::Running
    }

    /// Value of a named output parameter, once the job has produced it.
    #[must_use]
    pub fn output_field(&self, name: &str) -> Option<String> {
        self.state.lock().outputs.get(name).cloned()
    }

    /// Diagnostic text attached by the runtime (e.g. the filter's stderr).
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.state.lock().message.clone()
    }

    /// Record a named output parameter. Does not notify.
    pub fn set_output(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state.lock().outputs.insert(name.into(), value.into());
    }

    /// Attach diagnostic text. Does not notify.
    pub fn set_message(&self, message: impl Into<String>) {
        self.state.lock().message = Some(message.into());
    }

    /// Change status and notify observers. Returns false if unchanged.
    pub fn set_status(&self, status: JobStatus) -> bool {
        {
            let mut state = self.state.lock();
            if state.status == status {
                return false;
            }
            state.status = status;
        }
        debug!(job = %self.id, kind = %self.kind(), %status, "Job status changed");
        self.subject.notify(self);
        true
    }

    /// Register a status observer.
    pub fn subscribe(&self, observer: Arc<dyn StatusObserver>) -> SubscriptionId {
        self.subject.register(observer)
    }

    /// Remove a status observer.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subject.unregister(id)
    }

    /// Remove every status observer.
    pub fn unsubscribe_all(&self) {
        self.subject.clear();
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.subject.count()
    }
}

impl fmt::Debug for ComputationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationJob")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FEATURE_OUTPUT_FIELD;
    use crate::observer::ObserverControl;
    use crate::params::ParameterSets;
    use std::sync::atomic::AtomicUsize;

    fn payload(kind: FilterKind, mode: OutputMode) -> JobPayload {
        JobPayload::new(
            ParameterSets::default().snapshot(kind),
            "/data/scan.nrrd".into(),
            Some("/data/mask.nrrd".into()),
            mode,
        )
    }

    #[test]
    fn new_job_is_idle() {
        let job = ComputationJob::new(payload(FilterKind::RunLength, OutputMode::Features));
        assert_eq!(job.status(), JobStatus::Idle);
        assert!(!job.is_busy());
        assert_eq!(job.kind(), FilterKind::RunLength);
        assert!(job.output_field(FEATURE_OUTPUT_FIELD).is_none());
    }

    #[test]
    fn ids_are_unique() {
        let a = ComputationJob::new(payload(FilterKind::Morphometry, OutputMode::Features));
        let b = ComputationJob::new(payload(FilterKind::Morphometry, OutputMode::Features));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn status_strings() {
        assert_eq!(JobStatus::Completed.to_string(), "Completed");
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Idle.is_terminal());
    }

    #[test]
    fn set_status_notifies_only_on_change() {
        struct Counter(AtomicUsize);
        impl StatusObserver for Counter {
            fn on_status_changed(&self, _job: &ComputationJob) -> ObserverControl {
                self.0.fetch_add(1, Ordering::Relaxed);
                ObserverControl::Keep
            }
        }

        let job = ComputationJob::new(payload(FilterKind::Cooccurrence, OutputMode::Features));
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        job.subscribe(counter.clone());

        assert!(job.set_status(JobStatus::Running));
        assert!(job.is_busy());
        assert!(!job.set_status(JobStatus::Running));
        assert!(job.set_status(JobStatus::Completed));
        assert_eq!(counter.0.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn observer_sees_new_status() {
        struct Check;
        impl StatusObserver for Check {
            fn on_status_changed(&self, job: &ComputationJob) -> ObserverControl {
                assert_eq!(job.status(), JobStatus::Failed);
                assert_eq!(job.message().as_deref(), Some("segfault"));
                ObserverControl::Detach
            }
        }

        let job = ComputationJob::new(payload(FilterKind::Cooccurrence, OutputMode::Features));
        job.subscribe(Arc::new(Check));
        job.set_message("segfault");
        job.set_status(JobStatus::Failed);
        assert_eq!(job.observer_count(), 0);
    }

    #[test]
    fn outputs_are_stored() {
        let job = ComputationJob::new(payload(FilterKind::Morphometry, OutputMode::Features));
        job.set_output(FEATURE_OUTPUT_FIELD, "1,2,3,4,5");
        assert_eq!(
            job.output_field(FEATURE_OUTPUT_FIELD).as_deref(),
            Some("1,2,3,4,5")
        );
    }

    #[test]
    fn args_for_features() {
        let args = payload(FilterKind::Morphometry, OutputMode::Features).to_args();
        assert_eq!(
            args,
            [
                "--threshold",
                "1",
                "--neighborhoodRadius",
                "4",
                "--inputVolume",
                "/data/scan.nrrd",
                "--inputMask",
                "/data/mask.nrrd",
            ]
        );
    }

    #[test]
    fn args_for_feature_map() {
        let args = payload(
            FilterKind::Morphometry,
            OutputMode::FeatureMap {
                output: "/out/BM.nrrd".into(),
            },
        )
        .to_args();
        assert_eq!(&args[args.len() - 2..], ["--outputVolume", "/out/BM.nrrd"]);
    }

    #[test]
    fn args_without_mask() {
        let mut p = payload(FilterKind::Cooccurrence, OutputMode::Features);
        p.input_mask = None;
        assert!(!p.to_args().contains(&"--inputMask".to_string()));
    }

    #[test]
    fn job_error_kind() {
        let err = JobError::Failed {
            kind: FilterKind::RunLength,
            status: "Cancelled".into(),
        };
        assert_eq!(err.kind(), FilterKind::RunLength);
        assert_eq!(err.to_string(), "GLRLM job finished with status Cancelled");
    }
}
