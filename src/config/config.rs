use crate::error::{LearnerError, LearnerResult};
use serde::{Deserialize, Serialize};

/// Policy parameters of the Q-learner
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LearnerConfig {
    /// Learning rate (α), in (0, 1]
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Discount factor (γ), in [0, 1]
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,

    /// Exploration rate (ε), in [0, 1]
    #[serde(default = "default_exploration_rate")]
    pub exploration_rate: f64,
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_discount_factor() -> f64 {
    0.9
}

fn default_exploration_rate() -> f64 {
    0.1
}

impl LearnerConfig {
    /// Create a new config and validate it
    pub fn new(
        learning_rate: f64,
        discount_factor: f64,
        exploration_rate: f64,
    ) -> LearnerResult<Self> {
        let config = Self {
            learning_rate,
            discount_factor,
            exploration_rate,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter against its valid range
    pub fn validate(&self) -> LearnerResult<()> {
        validate_learning_rate(self.learning_rate)?;
        validate_discount_factor(self.discount_factor)?;
        validate_exploration_rate(self.exploration_rate)
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            exploration_rate: default_exploration_rate(),
        }
    }
}

pub(crate) fn validate_learning_rate(value: f64) -> LearnerResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(LearnerError::invalid_configuration(format!(
            "learning rate must be in (0, 1], got {}",
            value
        )))
    }
}

pub(crate) fn validate_discount_factor(value: f64) -> LearnerResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LearnerError::invalid_configuration(format!(
            "discount factor must be in [0, 1], got {}",
            value
        )))
    }
}

pub(crate) fn validate_exploration_rate(value: f64) -> LearnerResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LearnerError::invalid_configuration(format!(
            "exploration rate must be in [0, 1], got {}",
            value
        )))
    }
}

/// Settings for the built-in training loop
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrainingConfig {
    /// Number of episodes to run
    #[serde(default = "default_episodes")]
    pub episodes: usize,

    /// Step limit per episode
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Number of cells in the corridor environment
    #[serde(default = "default_corridor_length")]
    pub corridor_length: usize,

    /// Seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_episodes() -> usize {
    200
}

fn default_max_steps() -> usize {
    100
}

fn default_corridor_length() -> usize {
    6
}

impl TrainingConfig {
    pub fn validate(&self) -> LearnerResult<()> {
        if self.max_steps == 0 {
            return Err(LearnerError::invalid_configuration(
                "max_steps must be at least 1",
            ));
        }
        if self.corridor_length < 2 {
            return Err(LearnerError::invalid_configuration(
                "corridor_length must be at least 2",
            ));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: default_episodes(),
            max_steps: default_max_steps(),
            corridor_length: default_corridor_length(),
            seed: None,
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TabqConfig {
    #[serde(default)]
    pub learner: LearnerConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

impl TabqConfig {
    pub fn validate(&self) -> LearnerResult<()> {
        self.learner.validate()?;
        self.training.validate()
    }
}
