//! Runtime that executes filters as external processes.
//!
//! Each job runs on its own worker thread: the worker marks the job
//! Running, invokes the filter with a temporary return-parameter file,
//! copies the returned parameters into the job's outputs and finally marks
//! it Completed or Failed.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, warn};

use bonetexture_core::constants::RETURN_PARAMETER_FLAG;
use bonetexture_core::job::{ComputationJob, JobPayload, JobStatus, OutputMode};

use crate::interfaces::{ExecutionRuntime, RuntimeError};
use crate::return_params::parse_return_parameters;

#[derive(Debug, thiserror::Error)]
enum InvocationError {
    #[error("cannot create return parameter file: {0}")]
    ReturnFile(#[source] std::io::Error),

    #[error("cannot execute {path}: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} exited with {status}: {stderr}")]
    ExitStatus {
        path: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("cannot read return parameters: {0}")]
    ReadBack(#[source] std::io::Error),
}

/// Runs filter executables found in a directory or on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRuntime {
    filter_dir: Option<PathBuf>,
}

impl ProcessRuntime {
    /// Look for executables in `filter_dir`, or on `PATH` when `None`.
    #[must_use]
    pub fn new(filter_dir: Option<PathBuf>) -> Self {
        Self { filter_dir }
    }

    fn executable_name(payload: &JobPayload) -> &'static str {
        match payload.mode {
            OutputMode::Features => payload.kind().feature_executable(),
            OutputMode::FeatureMap { .. } => payload.kind().feature_map_executable(),
        }
    }

    /// Locate an executable by name.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, RuntimeError> {
        let file_name = format!("{name}{}", env::consts::EXE_SUFFIX);
        let found = match &self.filter_dir {
            Some(dir) => Some(dir.join(&file_name)).filter(|p| p.is_file()),
            None => env::var_os("PATH").and_then(|paths| {
                env::split_paths(&paths)
                    .map(|dir| dir.join(&file_name))
                    .find(|p| p.is_file())
            }),
        };
        found.ok_or_else(|| RuntimeError::ExecutableNotFound {
            name: name.to_string(),
            location: self
                .filter_dir
                .as_ref()
                .map_or_else(|| "PATH".to_string(), |d| d.display().to_string()),
        })
    }
}

impl ExecutionRuntime for ProcessRuntime {
    fn create_job(&self, payload: JobPayload) -> Result<Arc<ComputationJob>, RuntimeError> {
        self.resolve(Self::executable_name(&payload))?;
        Ok(Arc::new(ComputationJob::new(payload)))
    }

    fn run(&self, job: Arc<ComputationJob>) -> Result<(), RuntimeError> {
        let executable = self.resolve(Self::executable_name(job.payload()))?;
        let name = format!("filter-{}", job.kind().label().to_ascii_lowercase());
        std::thread::Builder::new()
            .name(name)
            .spawn(move || execute(&job, &executable))?;
        Ok(())
    }
}

fn execute(job: &ComputationJob, executable: &Path) {
    job.set_status(JobStatus::Running);
    match invoke(job, executable) {
        Ok(outputs) => {
            for (name, value) in outputs {
                job.set_output(name, value);
            }
            job.set_status(JobStatus::Completed);
        }
        Err(e) => {
            warn!(job = %job.id(), kind = %job.kind(), error = %e, "Filter run failed");
            job.set_message(e.to_string());
            job.set_status(JobStatus::Failed);
        }
    }
}

fn invoke(
    job: &ComputationJob,
    executable: &Path,
) -> Result<BTreeMap<String, String>, InvocationError> {
    let return_file = tempfile::NamedTempFile::new().map_err(InvocationError::ReturnFile)?;
    let args = job.payload().to_args();
    debug!(job = %job.id(), executable = %executable.display(), ?args, "Spawning filter");

    let output = Command::new(executable)
        .args(&args)
        .arg(RETURN_PARAMETER_FLAG)
        .arg(return_file.path())
        .stdin(Stdio::null())
        .output()
        .map_err(|source| InvocationError::Exec {
            path: executable.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(InvocationError::ExitStatus {
            path: executable.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let text = std::fs::read_to_string(return_file.path()).map_err(InvocationError::ReadBack)?;
    Ok(parse_return_parameters(&text))
}
