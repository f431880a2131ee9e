//! Error handling and exit codes.

use bonetexture_core::constants::exit_codes;
use bonetexture_core::features::UnknownFilterKind;
use bonetexture_core::params::ParamsError;
use bonetexture_core::suggestion::SuggestionError;
use bonetexture_core::validation::ValidationError;
use bonetexture_core::volume::VolumeError;
use bonetexture_orchestration::interfaces::RuntimeError;
use bonetexture_orchestration::orchestrator::LaunchError;

/// Map an application error to the process exit code.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(launch) = err.downcast_ref::<LaunchError>() {
        return launch_exit_code(launch);
    }
    let input_error = err.downcast_ref::<VolumeError>().is_some()
        || err.downcast_ref::<ParamsError>().is_some()
        || err.downcast_ref::<ValidationError>().is_some()
        || err.downcast_ref::<SuggestionError>().is_some()
        || err.downcast_ref::<UnknownFilterKind>().is_some();
    if input_error {
        exit_codes::ERROR_INPUT
    } else {
        exit_codes::ERROR_GENERIC
    }
}

fn launch_exit_code(err: &LaunchError) -> i32 {
    match err {
        LaunchError::Validation(_)
        | LaunchError::NoFeatureSelected
        | LaunchError::Runtime {
            source: RuntimeError::ExecutableNotFound { .. },
            ..
        } => exit_codes::ERROR_INPUT,
        LaunchError::AlreadyRunning(_) | LaunchError::Runtime { .. } => exit_codes::ERROR_GENERIC,
    }
}
