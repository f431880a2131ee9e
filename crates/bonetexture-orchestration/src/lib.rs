//! # bonetexture-orchestration
//!
//! Asynchronous launch of external texture filters, result aggregation,
//! and the runtimes that execute the jobs.

pub mod filter_selection;
pub mod host_runtime;
pub mod interfaces;
pub mod orchestrator;
pub mod process_runtime;
pub mod return_params;

pub use filter_selection::parse_selection;
pub use host_runtime::HostDrivenRuntime;
pub use interfaces::{ExecutionRuntime, JobOutcome, JobSuccess, ResultConsumer, RuntimeError};
pub use orchestrator::{Completion, JobOrchestrator, LaunchError, LaunchTicket};
pub use process_runtime::ProcessRuntime;
