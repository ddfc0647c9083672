// tabq - tabular Q-learning for caller-driven agents
// One action-value learner with epsilon-greedy selection, plus config, sharing and episode tooling

pub mod config;
pub mod error;
pub mod logging;
pub mod reinforcement;

pub use config::{ConfigLoader, LearnerConfig, TabqConfig, TrainingConfig};
pub use error::{LearnerError, LearnerResult};
pub use reinforcement::{
    Environment, EpisodeRunner, LearningAgent, QLearner, RandomSource, SharedLearner, Task,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
