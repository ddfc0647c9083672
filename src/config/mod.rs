// Configuration module for tabq
// Learner parameters, training settings and the file/env loader

#[allow(clippy::module_inception)]
pub mod config;
pub mod config_loader;

// Re-export main types for easier access
pub use config::{LearnerConfig, TabqConfig, TrainingConfig};
pub use config_loader::ConfigLoader;
