//! BoneTexture-rs library: application logic for the `bonetexture` binary.

pub mod app;
pub mod config;
pub mod errors;
