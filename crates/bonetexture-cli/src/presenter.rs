//! CLI result consumer.

use std::path::Path;
use std::sync::Arc;

use bonetexture_core::features::{FeatureResultSet, FilterKind};
use bonetexture_core::job::JobError;
use bonetexture_orchestration::interfaces::ResultConsumer;
use bonetexture_orchestration::orchestrator::Completion;

use crate::output::{format_family, format_feature_table, format_summary};
use crate::progress::JobSpinners;
use crate::ui::{print_error, print_header, print_success};

/// Prints job results to the terminal as they arrive.
pub struct CliResultConsumer {
    verbose: bool,
    quiet: bool,
    spinners: Arc<JobSpinners>,
}

impl CliResultConsumer {
    #[must_use]
    pub fn new(verbose: bool, quiet: bool, spinners: Arc<JobSpinners>) -> Self {
        Self {
            verbose,
            quiet,
            spinners,
        }
    }

    /// Print the complete feature table.
    pub fn present_results(&self, results: &FeatureResultSet) {
        if !self.quiet {
            print_header("Texture features");
        }
        println!("{}", format_feature_table(results));
    }

    /// Print one line per launched job, plus the jobs still pending.
    pub fn present_summary(&self, completion: &Completion) {
        if self.quiet {
            return;
        }

        print!("\n{}", format_summary(completion));
        if completion.all_succeeded() {
            print_success(&format!("{} job(s) completed", completion.outcomes.len()));
        }
    }
}

impl ResultConsumer for CliResultConsumer {
    fn on_results_updated(&self, kind: FilterKind, results: &FeatureResultSet) {
        self.spinners.finish(kind, "done");
        if self.verbose && !self.quiet {
            self.spinners.println(&format_family(results, kind));
        }
    }

    fn on_feature_map_ready(&self, kind: FilterKind, path: &Path) {
        self.spinners.finish(kind, "done");
        if !self.quiet {
            self.spinners
                .println(&format!("{kind} feature map written to {}", path.display()));
        }
    }

    fn on_job_failed(&self, error: &JobError) {
        self.spinners.finish(error.kind(), "failed");
        print_error(&error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonetexture_core::features::FeatureVector;

    fn consumer(verbose: bool, quiet: bool) -> (Arc<JobSpinners>, CliResultConsumer) {
        let spinners = Arc::new(JobSpinners::new(false));
        let consumer = CliResultConsumer::new(verbose, quiet, Arc::clone(&spinners));
        (spinners, consumer)
    }

    #[test]
    fn results_stop_spinner() {
        let (spinners, consumer) = consumer(true, false);
        spinners.start(FilterKind::Morphometry, "running");
        let mut results = FeatureResultSet::new();
        results.store(FeatureVector::new(FilterKind::Morphometry, vec![1.0; 5]).unwrap());
        consumer.on_results_updated(FilterKind::Morphometry, &results);
        assert_eq!(spinners.active(), 0);
    }

    #[test]
    fn failure_stops_spinner() {
        let (spinners, consumer) = consumer(false, true);
        spinners.start(FilterKind::RunLength, "running");
        consumer.on_job_failed(&JobError::Failed {
            kind: FilterKind::RunLength,
            status: "Failed".into(),
        });
        assert_eq!(spinners.active(), 0);
    }

    #[test]
    fn feature_map_stops_spinner() {
        let (spinners, consumer) = consumer(false, false);
        spinners.start(FilterKind::Cooccurrence, "running");
        consumer.on_feature_map_ready(FilterKind::Cooccurrence, Path::new("/out/GLCM.nrrd"));
        assert_eq!(spinners.active(), 0);
    }
}
