//! Contains the types and functions for the high level pipeline API.

mod config;
mod pipeline;

pub use config::{PipelineConfig, Resolution, MAX_RESOLUTION_INDEX};
pub use pipeline::*;
