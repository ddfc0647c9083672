// A named learning agent built by composition around a Q-learner
// Tasks carry a state plus an optional reward and next state reported by the caller

use crate::error::LearnerResult;
use crate::reinforcement::q_learning::QLearner;
use crate::reinforcement::random::{RandomSource, ThreadRandom};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;
use tracing::{debug, info};
use uuid::Uuid;

/// A unit of work for the agent
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Task<S> {
    /// State to act in
    pub state: S,
    /// Reward observed for the chosen action, 0.0 when absent
    #[serde(default)]
    pub reward: Option<f64>,
    /// State reached after the action, `state` when absent
    #[serde(default)]
    pub next_state: Option<S>,
}

impl<S> Task<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            reward: None,
            next_state: None,
        }
    }

    pub fn with_reward(mut self, reward: f64) -> Self {
        self.reward = Some(reward);
        self
    }

    pub fn with_next_state(mut self, next_state: S) -> Self {
        self.next_state = Some(next_state);
        self
    }
}

/// What the agent did for a task
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskOutcome<A> {
    pub action: A,
    pub reward: f64,
}

/// An identified agent that chooses actions and learns from task feedback
#[derive(Debug)]
pub struct LearningAgent<S, A, R = ThreadRandom> {
    id: Uuid,
    name: String,
    role: String,
    learner: QLearner<S, A, R>,
    running: bool,
}

impl<S, A, R> LearningAgent<S, A, R>
where
    S: Eq + Hash + Clone + Debug,
    A: Eq + Hash + Clone + Debug,
    R: RandomSource,
{
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        learner: QLearner<S, A, R>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role: role.into(),
            learner,
            running: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn learner(&self) -> &QLearner<S, A, R> {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut QLearner<S, A, R> {
        &mut self.learner
    }

    pub fn start(&mut self) {
        self.running = true;
        info!("Agent {} ({}) started", self.name, self.id);
    }

    pub fn stop(&mut self) {
        self.running = false;
        info!("Agent {} ({}) stopped", self.name, self.id);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Choose an action for the task's state and learn from the reported outcome
    pub fn execute_task(&mut self, task: Task<S>) -> LearnerResult<TaskOutcome<A>> {
        let action = self.learner.choose_action(&task.state)?;
        let reward = task.reward.unwrap_or(0.0);
        let next_state = task.next_state.as_ref().unwrap_or(&task.state);

        self.learner.update(&task.state, &action, reward, next_state)?;

        debug!(
            "Agent {} acted {:?} in {:?} for reward {}",
            self.name, action, task.state, reward
        );
        Ok(TaskOutcome { action, reward })
    }

    /// Hand back the learner, consuming the agent
    pub fn into_learner(self) -> QLearner<S, A, R> {
        self.learner
    }
}

impl<S, A, R> fmt::Display for LearningAgent<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LearningAgent(id={}, name='{}', role='{}')",
            self.id, self.name, self.role
        )
    }
}
