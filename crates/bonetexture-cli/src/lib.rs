//! # bonetexture-cli
//!
//! CLI output, job spinners, CSV export, and shell completion.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod progress;
pub mod ui;

pub use presenter::CliResultConsumer;
pub use progress::JobSpinners;
