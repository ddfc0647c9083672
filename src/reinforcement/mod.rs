// Main module for the reinforcement learning components
// A single tabular Q-learner plus the pieces that drive and share it

pub mod agent;
pub mod episode;
pub mod q_learning;
pub mod random;
pub mod shared;
pub mod snapshot;

// Re-export main components for easier access
pub use agent::{LearningAgent, Task, TaskOutcome};
pub use episode::{
    Corridor, Environment, EpisodeRunner, EpisodeSummary, Move, TrainingReport, Transition,
};
pub use q_learning::QLearner;
pub use random::{FixedSequence, RandomSource, SeededRandom, ThreadRandom};
pub use shared::SharedLearner;
pub use snapshot::{QTableSnapshot, SnapshotEntry};
