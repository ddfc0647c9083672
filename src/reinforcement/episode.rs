// Episode driver: runs the observe → choose → act → update loop against an environment

use crate::error::{LearnerError, LearnerResult};
use crate::reinforcement::q_learning::QLearner;
use crate::reinforcement::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, info};

/// Outcome of applying one action to an environment
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub reward: f64,
    pub next_state: S,
    /// Whether `next_state` ends the episode
    pub done: bool,
}

/// An environment the learner can act in
pub trait Environment {
    type State;
    type Action;

    /// Start a new episode and return its initial state
    fn reset(&mut self) -> Self::State;

    /// Apply an action to the current state
    fn step(&mut self, action: &Self::Action) -> LearnerResult<Transition<Self::State>>;
}

/// Result of a single episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub steps: usize,
    pub total_reward: f64,
    /// Whether the episode ended in a terminal state rather than the step limit
    pub terminated: bool,
}

/// Per-episode results of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeSummary>,
}

impl TrainingReport {
    /// Reward series, one value per episode
    pub fn rewards(&self) -> Vec<f64> {
        self.episodes.iter().map(|e| e.total_reward).collect()
    }

    /// Mean total reward over the last `window` episodes
    pub fn mean_reward(&self, window: usize) -> Option<f64> {
        let window = window.min(self.episodes.len());
        if window == 0 {
            return None;
        }
        let tail = &self.episodes[self.episodes.len() - window..];
        Some(tail.iter().map(|e| e.total_reward).sum::<f64>() / window as f64)
    }

    /// Fraction of episodes that reached a terminal state
    pub fn success_rate(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        let reached = self.episodes.iter().filter(|e| e.terminated).count();
        reached as f64 / self.episodes.len() as f64
    }
}

/// Drives a learner through episodes of an environment
#[derive(Debug, Clone, Copy)]
pub struct EpisodeRunner {
    max_steps: usize,
}

impl EpisodeRunner {
    pub fn new(max_steps: usize) -> LearnerResult<Self> {
        if max_steps == 0 {
            return Err(LearnerError::invalid_configuration(
                "max_steps must be at least 1",
            ));
        }
        Ok(Self { max_steps })
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one episode, updating the learner after every step
    pub fn run_episode<E, R>(
        &self,
        learner: &mut QLearner<E::State, E::Action, R>,
        env: &mut E,
    ) -> LearnerResult<EpisodeSummary>
    where
        E: Environment,
        E::State: Eq + Hash + Clone + Debug,
        E::Action: Eq + Hash + Clone + Debug,
        R: RandomSource,
    {
        let mut state = env.reset();
        let mut total_reward = 0.0;

        for step in 1..=self.max_steps {
            let action = learner.choose_action(&state)?;
            let transition = env.step(&action)?;
            learner.update(&state, &action, transition.reward, &transition.next_state)?;
            total_reward += transition.reward;

            if transition.done {
                debug!("Episode terminated after {} steps", step);
                return Ok(EpisodeSummary {
                    steps: step,
                    total_reward,
                    terminated: true,
                });
            }
            state = transition.next_state;
        }

        Ok(EpisodeSummary {
            steps: self.max_steps,
            total_reward,
            terminated: false,
        })
    }

    /// Run `episodes` episodes back to back
    pub fn train<E, R>(
        &self,
        learner: &mut QLearner<E::State, E::Action, R>,
        env: &mut E,
        episodes: usize,
    ) -> LearnerResult<TrainingReport>
    where
        E: Environment,
        E::State: Eq + Hash + Clone + Debug,
        E::Action: Eq + Hash + Clone + Debug,
        R: RandomSource,
    {
        let mut report = TrainingReport {
            episodes: Vec::with_capacity(episodes),
        };
        let progress_every = (episodes / 10).max(1);

        for episode in 1..=episodes {
            let summary = self.run_episode(learner, env)?;
            report.episodes.push(summary);

            if episode % progress_every == 0 || episode == episodes {
                info!(
                    "Episode {}/{}: mean reward {:.3} over last {}, {} table entries",
                    episode,
                    episodes,
                    report.mean_reward(progress_every).unwrap_or(0.0),
                    progress_every,
                    learner.len()
                );
            }
        }

        Ok(report)
    }
}

/// Moves available in the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Move {
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 2] = [Move::Left, Move::Right];
}

/// One-dimensional corridor with the goal at the right end
///
/// Positions run from 0 to `length - 1`; every episode starts at 0.
/// Reaching the last cell pays 1.0 and ends the episode, any other step
/// pays `step_penalty`. Moving left at position 0 stays in place.
#[derive(Debug, Clone)]
pub struct Corridor {
    length: usize,
    position: usize,
    step_penalty: f64,
}

impl Corridor {
    pub fn new(length: usize) -> LearnerResult<Self> {
        if length < 2 {
            return Err(LearnerError::invalid_configuration(
                "corridor length must be at least 2",
            ));
        }
        Ok(Self {
            length,
            position: 0,
            step_penalty: 0.0,
        })
    }

    pub fn with_step_penalty(mut self, penalty: f64) -> Self {
        self.step_penalty = penalty;
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn goal(&self) -> usize {
        self.length - 1
    }
}

impl Environment for Corridor {
    type State = usize;
    type Action = Move;

    fn reset(&mut self) -> usize {
        self.position = 0;
        self.position
    }

    fn step(&mut self, action: &Move) -> LearnerResult<Transition<usize>> {
        if self.position == self.goal() {
            return Err(LearnerError::invalid_state(
                "episode already finished, call reset first",
            ));
        }

        self.position = match action {
            Move::Left => self.position.saturating_sub(1),
            Move::Right => self.position + 1,
        };

        let done = self.position == self.goal();
        Ok(Transition {
            reward: if done { 1.0 } else { self.step_penalty },
            next_state: self.position,
            done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerConfig;
    use crate::reinforcement::random::SeededRandom;

    fn corridor_learner(epsilon: f64, seed: u64) -> QLearner<usize, Move, SeededRandom> {
        let config = LearnerConfig::new(0.5, 0.9, epsilon).unwrap();
        QLearner::with_random(Move::ALL.to_vec(), config, SeededRandom::new(seed)).unwrap()
    }

    #[test]
    fn test_corridor_dynamics() {
        let mut env = Corridor::new(3).unwrap();
        assert_eq!(env.reset(), 0);

        let stay = env.step(&Move::Left).unwrap();
        assert_eq!(stay.next_state, 0);
        assert!(!stay.done);

        env.step(&Move::Right).unwrap();
        let goal = env.step(&Move::Right).unwrap();
        assert_eq!(goal.next_state, 2);
        assert!(goal.done);
        assert_eq!(goal.reward, 1.0);

        assert!(env.step(&Move::Right).is_err());
        assert_eq!(env.reset(), 0);
    }

    #[test]
    fn test_corridor_too_short() {
        assert!(Corridor::new(1).is_err());
    }

    #[test]
    fn test_step_limit() {
        let runner = EpisodeRunner::new(3).unwrap();
        let mut env = Corridor::new(10).unwrap().with_step_penalty(-0.5);
        let mut learner = corridor_learner(0.0, 1);

        let summary = runner.run_episode(&mut learner, &mut env).unwrap();
        assert_eq!(summary.steps, 3);
        assert!(!summary.terminated);
        assert_eq!(summary.total_reward, -1.5);
        assert_eq!(learner.updates(), 3);
    }

    #[test]
    fn test_training_learns_to_move_right() {
        let runner = EpisodeRunner::new(50).unwrap();
        let mut env = Corridor::new(5).unwrap().with_step_penalty(-0.01);
        let mut learner = corridor_learner(0.2, 42);

        let report = runner.train(&mut learner, &mut env, 300).unwrap();
        assert_eq!(report.episodes.len(), 300);
        assert!(report.success_rate() > 0.9);

        for position in 0..env.goal() {
            assert_eq!(learner.greedy_actions(&position), vec![&Move::Right]);
        }

        // a fully greedy run walks straight to the goal
        learner.set_exploration_rate(0.0).unwrap();
        let summary = runner.run_episode(&mut learner, &mut env).unwrap();
        assert!(summary.terminated);
        assert_eq!(summary.steps, env.goal());
    }

    #[test]
    fn test_report_statistics() {
        let report = TrainingReport {
            episodes: vec![
                EpisodeSummary {
                    steps: 5,
                    total_reward: 0.0,
                    terminated: false,
                },
                EpisodeSummary {
                    steps: 3,
                    total_reward: 1.0,
                    terminated: true,
                },
                EpisodeSummary {
                    steps: 2,
                    total_reward: 2.0,
                    terminated: true,
                },
            ],
        };

        assert_eq!(report.rewards(), vec![0.0, 1.0, 2.0]);
        assert_eq!(report.mean_reward(2), Some(1.5));
        assert_eq!(report.mean_reward(10), Some(1.0));
        assert_eq!(TrainingReport::default().mean_reward(3), None);
        assert!((report.success_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_step_runner_rejected() {
        assert!(EpisodeRunner::new(0).is_err());
    }
}
