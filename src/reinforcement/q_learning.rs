// Q-Learning implementation for the tabular action-value learner
// This implements epsilon-greedy action selection and the one-step Q-learning update

use crate::config::config::{
    validate_discount_factor, validate_exploration_rate, validate_learning_rate,
};
use crate::config::LearnerConfig;
use crate::error::{LearnerError, LearnerResult};
use crate::reinforcement::random::{RandomSource, ThreadRandom};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, warn};

/// Tabular Q-learner over a fixed action set
#[derive(Debug, Clone)]
pub struct QLearner<S, A, R = ThreadRandom> {
    /// Q-table mapping state-action pairs to expected future rewards
    q_table: HashMap<(S, A), f64>,
    /// Fixed, ordered action set
    actions: Vec<A>,
    /// Learning rate, discount factor and exploration rate
    config: LearnerConfig,
    /// Source of exploration and tie-break draws
    rng: R,
    /// Number of updates applied
    updates: u64,
}

impl<S, A> QLearner<S, A, ThreadRandom>
where
    S: Eq + Hash + Clone + Debug,
    A: Eq + Hash + Clone + Debug,
{
    /// Create a learner backed by the thread-local random generator
    pub fn new(actions: Vec<A>, config: LearnerConfig) -> LearnerResult<Self> {
        Self::with_random(actions, config, ThreadRandom)
    }
}

impl<S, A, R> QLearner<S, A, R>
where
    S: Eq + Hash + Clone + Debug,
    A: Eq + Hash + Clone + Debug,
    R: RandomSource,
{
    /// Create a learner with an injected random source
    pub fn with_random(actions: Vec<A>, config: LearnerConfig, rng: R) -> LearnerResult<Self> {
        config.validate()?;
        validate_actions(&actions)?;

        debug!(
            "Created Q-learner with {} actions (α={}, γ={}, ε={})",
            actions.len(),
            config.learning_rate,
            config.discount_factor,
            config.exploration_rate
        );

        Ok(Self {
            q_table: HashMap::new(),
            actions,
            config,
            rng,
            updates: 0,
        })
    }

    /// Get the Q-value for a state-action pair, 0.0 when never written
    pub fn get_value(&self, state: &S, action: &A) -> f64 {
        self.q_table
            .get(&(state.clone(), action.clone()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Maximum Q-value over the action set at `state`
    pub fn max_value(&self, state: &S) -> f64 {
        self.actions
            .iter()
            .map(|a| self.get_value(state, a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// All actions achieving the maximum Q-value at `state`, in action-set order
    pub fn greedy_actions(&self, state: &S) -> Vec<&A> {
        self.greedy_indices(state)
            .into_iter()
            .map(|i| &self.actions[i])
            .collect()
    }

    fn greedy_indices(&self, state: &S) -> Vec<usize> {
        let values: Vec<f64> = self
            .actions
            .iter()
            .map(|a| self.get_value(state, a))
            .collect();
        let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        values
            .iter()
            .enumerate()
            .filter(|(_, q)| **q == best)
            .map(|(i, _)| i)
            .collect()
    }

    /// Select an action with the epsilon-greedy policy
    ///
    /// Ties between greedy actions are broken uniformly at random.
    pub fn choose_action(&mut self, state: &S) -> LearnerResult<A> {
        if self.actions.is_empty() {
            return Err(LearnerError::invalid_state(
                "cannot choose an action from an empty action set",
            ));
        }

        // Exploration: with probability ε, choose a random action
        if self.rng.uniform() < self.config.exploration_rate {
            let index = self.rng.index(self.actions.len());
            let action = self.actions[index].clone();
            debug!("Exploring at {:?}: {:?}", state, action);
            return Ok(action);
        }

        // Exploitation: one of the best actions
        let candidates = self.greedy_indices(state);
        let index = match candidates.len() {
            // no comparable maximum, fall back to the whole action set
            0 => self.rng.index(self.actions.len()),
            1 => candidates[0],
            n => candidates[self.rng.index(n)],
        };
        let action = self.actions[index].clone();
        debug!(
            "Exploiting at {:?}: {:?} ({} tied)",
            state,
            action,
            candidates.len()
        );
        Ok(action)
    }

    /// Probability that `choose_action` returns `action` at `state`
    pub fn action_probability(&self, state: &S, action: &A) -> f64 {
        if !self.actions.contains(action) {
            return 0.0;
        }

        let epsilon = self.config.exploration_rate;
        let explore = epsilon / self.actions.len() as f64;
        let mut greedy = self.greedy_actions(state);
        if greedy.is_empty() {
            greedy = self.actions.iter().collect();
        }

        if greedy.contains(&action) {
            explore + (1.0 - epsilon) / greedy.len() as f64
        } else {
            explore
        }
    }

    /// Update the Q-value for a state-action pair from an observed transition
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ·max_a' Q(s',a') - Q(s,a)]
    ///
    /// Returns the new value. Unknown actions, non-finite rewards and updates
    /// whose result overflows to a non-finite value are rejected and leave
    /// the table untouched.
    pub fn update(
        &mut self,
        state: &S,
        action: &A,
        reward: f64,
        next_state: &S,
    ) -> LearnerResult<f64> {
        if !self.actions.contains(action) {
            warn!("Rejected update for unknown action {:?}", action);
            return Err(LearnerError::invalid_state(format!(
                "action {:?} is not in the configured action set",
                action
            )));
        }
        if !reward.is_finite() {
            warn!("Rejected non-finite reward {} for {:?}", reward, action);
            return Err(LearnerError::invalid_state(format!(
                "reward must be finite, got {}",
                reward
            )));
        }

        let current_q = self.get_value(state, action);
        let max_next_q = self.max_value(next_state);

        let temporal_difference = reward + self.config.discount_factor * max_next_q - current_q;
        let new_q = current_q + self.config.learning_rate * temporal_difference;
        if !new_q.is_finite() {
            warn!(
                "Rejected update of Q({:?}, {:?}): result {} is not finite",
                state, action, new_q
            );
            return Err(LearnerError::invalid_state(format!(
                "update of {:?}/{:?} produced non-finite value {}",
                state, action, new_q
            )));
        }

        self.q_table.insert((state.clone(), action.clone()), new_q);
        self.updates += 1;

        debug!(
            "Q({:?}, {:?}): {} -> {} (reward {}, next max {})",
            state, action, current_q, new_q, reward, max_next_q
        );
        Ok(new_q)
    }

    /// Set the learning rate (α), in (0, 1]
    pub fn set_learning_rate(&mut self, value: f64) -> LearnerResult<()> {
        validate_learning_rate(value)?;
        self.config.learning_rate = value;
        Ok(())
    }

    /// Set the discount factor (γ), in [0, 1]
    pub fn set_discount_factor(&mut self, value: f64) -> LearnerResult<()> {
        validate_discount_factor(value)?;
        self.config.discount_factor = value;
        Ok(())
    }

    /// Set the exploration rate (ε), in [0, 1]
    pub fn set_exploration_rate(&mut self, value: f64) -> LearnerResult<()> {
        validate_exploration_rate(value)?;
        self.config.exploration_rate = value;
        Ok(())
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Number of stored state-action entries
    pub fn len(&self) -> usize {
        self.q_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_table.is_empty()
    }

    /// Number of updates applied since creation or the last `clear`
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Iterate over stored entries as (state, action, value)
    pub fn iter(&self) -> impl Iterator<Item = (&S, &A, f64)> + '_ {
        self.q_table.iter().map(|((s, a), q)| (s, a, *q))
    }

    /// Drop every stored value and reset the update counter
    pub fn clear(&mut self) {
        self.q_table.clear();
        self.updates = 0;
    }

    /// Write a value directly, used when restoring snapshots
    /// Store a value directly, returning the one it replaced
    pub(crate) fn insert_value(&mut self, state: S, action: A, value: f64) -> Option<f64> {
        self.q_table.insert((state, action), value)
    }

    pub(crate) fn set_updates(&mut self, updates: u64) {
        self.updates = updates;
    }
}

/// Reject empty or duplicated action sets
pub(crate) fn validate_actions<A: Eq + Hash + Debug>(actions: &[A]) -> LearnerResult<()> {
    if actions.is_empty() {
        return Err(LearnerError::invalid_configuration(
            "action set must not be empty",
        ));
    }

    let mut seen = HashSet::with_capacity(actions.len());
    for action in actions {
        if !seen.insert(action) {
            return Err(LearnerError::invalid_configuration(format!(
                "duplicate action {:?} in action set",
                action
            )));
        }
    }

    Ok(())
}
