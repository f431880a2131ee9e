//! Core orchestration: launching filter jobs and aggregating their results.
//!
//! A launch validates the inputs, creates one job per requested filter
//! kind, attaches a completion observer to each, and hands them to the
//! runtime. Nothing blocks: each observer stores its own result slot and
//! notifies the consumer when its job reaches a terminal status, in
//! whatever order the jobs happen to finish.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{info, warn};

use bonetexture_core::constants::FEATURE_OUTPUT_FIELD;
use bonetexture_core::features::{FeatureResultSet, FeatureVector, FilterKind};
use bonetexture_core::job::{ComputationJob, JobError, JobId, JobPayload, JobStatus, OutputMode};
use bonetexture_core::observer::{ObserverControl, StatusObserver};
use bonetexture_core::params::ParameterSets;
use bonetexture_core::validation::{validate, ValidationError};
use bonetexture_core::volume::{ImageVolume, RegionMask};

use crate::interfaces::{ExecutionRuntime, JobOutcome, JobSuccess, ResultConsumer, RuntimeError};

/// Reasons a launch request was rejected. Nothing was started.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("please select at least one type of features to compute")]
    NoFeatureSelected,

    #[error("a {0} job is still running")]
    AlreadyRunning(FilterKind),

    #[error("cannot create {kind} job: {source}")]
    Runtime {
        kind: FilterKind,
        #[source]
        source: RuntimeError,
    },
}

/// Live jobs are tracked per family and output mode.
type LiveKey = (FilterKind, bool);

fn live_key(kind: FilterKind, mode: &OutputMode) -> LiveKey {
    (kind, mode.is_feature_map())
}

struct Shared {
    consumer: Arc<dyn ResultConsumer>,
    results: Mutex<FeatureResultSet>,
    live: Mutex<HashMap<LiveKey, JobId>>,
}

/// Launches filter jobs and keeps the latest result per family.
pub struct JobOrchestrator {
    runtime: Arc<dyn ExecutionRuntime>,
    shared: Arc<Shared>,
}

impl JobOrchestrator {
    /// Create an orchestrator over a runtime, reporting to `consumer`.
    #[must_use]
    pub fn new(runtime: Arc<dyn ExecutionRuntime>, consumer: Arc<dyn ResultConsumer>) -> Self {
        Self {
            runtime,
            shared: Arc::new(Shared {
                consumer,
                results: Mutex::new(FeatureResultSet::new()),
                live: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Snapshot of the current result set.
    #[must_use]
    pub fn results(&self) -> FeatureResultSet {
        self.shared.results.lock().clone()
    }

    /// Whether a feature job of `kind` has not reached a terminal status yet.
    #[must_use]
    pub fn is_running(&self, kind: FilterKind) -> bool {
        self.shared
            .live
            .lock()
            .contains_key(&live_key(kind, &OutputMode::Features))
    }

    /// Launch feature-vector jobs for every kind in `kinds`.
    ///
    /// Validation failures, an empty selection, a kind that is still
    /// running, or a job the runtime cannot create reject the whole batch.
    pub fn launch(
        &self,
        kinds: &BTreeSet<FilterKind>,
        scan: Option<&ImageVolume>,
        mask: Option<&RegionMask>,
        params: &ParameterSets,
    ) -> Result<LaunchTicket, LaunchError> {
        self.launch_with(kinds, scan, mask, params, |_| OutputMode::Features)
    }

    /// Launch per-voxel feature-map jobs writing into `output_dir`.
    pub fn launch_feature_maps(
        &self,
        kinds: &BTreeSet<FilterKind>,
        scan: Option<&ImageVolume>,
        mask: Option<&RegionMask>,
        params: &ParameterSets,
        output_dir: &Path,
    ) -> Result<LaunchTicket, LaunchError> {
        self.launch_with(kinds, scan, mask, params, |kind| OutputMode::FeatureMap {
            output: output_dir.join(format!("{}_FeatureMaps.nrrd", kind.label())),
        })
    }

    fn launch_with(
        &self,
        kinds: &BTreeSet<FilterKind>,
        scan: Option<&ImageVolume>,
        mask: Option<&RegionMask>,
        params: &ParameterSets,
        mode_for: impl Fn(FilterKind) -> OutputMode,
    ) -> Result<LaunchTicket, LaunchError> {
        validate(scan, mask)?;
        let scan = scan.ok_or(ValidationError::MissingScan)?;
        if kinds.is_empty() {
            return Err(LaunchError::NoFeatureSelected);
        }

        let jobs = {
            let mut live = self.shared.live.lock();
            if let Some(&kind) = kinds
                .iter()
                .find(|&&kind| live.contains_key(&live_key(kind, &mode_for(kind))))
            {
                return Err(LaunchError::AlreadyRunning(kind));
            }

            let mut jobs = Vec::with_capacity(kinds.len());
            for &kind in kinds {
                let payload = JobPayload::new(
                    params.snapshot(kind),
                    scan.path.clone(),
                    mask.map(|m| m.path.clone()),
                    mode_for(kind),
                );
                let job = self
                    .runtime
                    .create_job(payload)
                    .map_err(|source| LaunchError::Runtime { kind, source })?;
                jobs.push(job);
            }
            for job in &jobs {
                live.insert(live_key(job.kind(), &job.payload().mode), job.id());
            }
            jobs
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        for job in jobs {
            info!(kind = %job.kind(), job = %job.id(), "Launching job");
            let observer = Arc::new(CompletionObserver {
                shared: Arc::clone(&self.shared),
                outcomes: tx.clone(),
                started: Instant::now(),
                fired: AtomicBool::new(false),
            });
            job.subscribe(observer.clone());
            if let Err(e) = self.runtime.run(Arc::clone(&job)) {
                job.unsubscribe_all();
                observer.finish(
                    &job,
                    Err(JobError::Launch {
                        kind: job.kind(),
                        reason: e.to_string(),
                    }),
                );
            }
        }

        Ok(LaunchTicket {
            kinds: kinds.iter().copied().collect(),
            receiver: rx,
        })
    }
}

/// Fires once, on the job's terminal transition.
struct CompletionObserver {
    shared: Arc<Shared>,
    outcomes: Sender<JobOutcome>,
    started: Instant,
    fired: AtomicBool,
}

impl CompletionObserver {
    fn collect(job: &ComputationJob) -> Result<JobSuccess, JobError> {
        let kind = job.kind();
        match &job.payload().mode {
            OutputMode::FeatureMap { output } => Ok(JobSuccess::FeatureMap(output.clone())),
            OutputMode::Features => {
                let text = job.output_field(FEATURE_OUTPUT_FIELD).ok_or_else(|| {
                    JobError::MalformedOutput {
                        kind,
                        reason: format!("missing output parameter {FEATURE_OUTPUT_FIELD}"),
                    }
                })?;
                FeatureVector::parse(kind, &text)
                    .map(JobSuccess::Features)
                    .map_err(|e| JobError::MalformedOutput {
                        kind,
                        reason: e.to_string(),
                    })
            }
        }
    }

    fn finish(&self, job: &ComputationJob, outcome: Result<JobSuccess, JobError>) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let kind = job.kind();

        {
            let key = live_key(kind, &job.payload().mode);
            let mut live = self.shared.live.lock();
            if live.get(&key) == Some(&job.id()) {
                live.remove(&key);
            }
        }

        match &outcome {
            Ok(JobSuccess::Features(vector)) => {
                let snapshot = {
                    let mut results = self.shared.results.lock();
                    results.store(vector.clone());
                    results.clone()
                };
                self.shared.consumer.on_results_updated(kind, &snapshot);
            }
            Ok(JobSuccess::FeatureMap(path)) => {
                self.shared.consumer.on_feature_map_ready(kind, path);
            }
            Err(error) => {
                warn!(%kind, job = %job.id(), %error, "Job did not produce a result");
                self.shared.consumer.on_job_failed(error);
            }
        }

        let _ = self.outcomes.send(JobOutcome {
            kind,
            job: job.id(),
            outcome,
            duration: self.started.elapsed(),
        });
    }
}

impl StatusObserver for CompletionObserver {
    fn on_status_changed(&self, job: &ComputationJob) -> ObserverControl {
        let status = job.status();
        if !status.is_terminal() {
            return ObserverControl::Keep;
        }
        info!(kind = %job.kind(), job = %job.id(), %status, "Job finished");
        let outcome = if status == JobStatus::Completed {
            Self::collect(job)
        } else {
            Err(JobError::Failed {
                kind: job.kind(),
                status: job.status_string(),
            })
        };
        self.finish(job, outcome);
        ObserverControl::Detach
    }
}

/// Outcomes gathered by [`LaunchTicket::wait`].
#[derive(Debug)]
pub struct Completion {
    pub outcomes: Vec<JobOutcome>,
    /// Kinds whose job had not finished when waiting stopped.
    pub pending: Vec<FilterKind>,
}

impl Completion {
    /// Whether every job finished with a result.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.pending.is_empty() && self.outcomes.iter().all(|o| o.outcome.is_ok())
    }
}

/// Handle on a launched batch, for callers that want to await it.
///
/// Dropping the ticket does not affect the jobs.
pub struct LaunchTicket {
    kinds: Vec<FilterKind>,
    receiver: Receiver<JobOutcome>,
}

impl LaunchTicket {
    /// Kinds launched in this batch.
    #[must_use]
    pub fn kinds(&self) -> &[FilterKind] {
        &self.kinds
    }

    /// Outcomes that have arrived so far, without blocking.
    pub fn poll(&self) -> Vec<JobOutcome> {
        self.receiver.try_iter().collect()
    }

    /// Block until every job finished or `timeout` elapsed.
    pub fn wait(&self, timeout: Option<Duration>) -> Completion {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut outcomes = Vec::with_capacity(self.kinds.len());
        while outcomes.len() < self.kinds.len() {
            let received = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    self.receiver.recv_timeout(remaining)
                }
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => break,
            }
        }
        let pending = self
            .kinds
            .iter()
            .copied()
            .filter(|kind| !outcomes.iter().any(|o| o.kind == *kind))
            .collect();
        Completion { outcomes, pending }
    }
}
