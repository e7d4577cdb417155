//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod features;
pub mod info;
pub mod lpc;
pub mod onset;
pub mod pitch;
pub mod profiles;
pub mod resample;
