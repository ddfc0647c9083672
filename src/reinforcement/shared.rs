// Thread-safe handle around a single learner
// Each operation holds the table lock for its whole read-modify-write

use crate::error::{LearnerError, LearnerResult};
use crate::reinforcement::q_learning::QLearner;
use crate::reinforcement::random::{RandomSource, ThreadRandom};
use crate::reinforcement::snapshot::QTableSnapshot;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable, lock-protected learner shared between callers
#[derive(Debug)]
pub struct SharedLearner<S, A, R = ThreadRandom> {
    inner: Arc<Mutex<QLearner<S, A, R>>>,
}

impl<S, A, R> Clone for SharedLearner<S, A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, R> SharedLearner<S, A, R>
where
    S: Eq + Hash + Clone + Debug,
    A: Eq + Hash + Clone + Debug,
    R: RandomSource,
{
    /// Wrap an existing learner
    pub fn new(learner: QLearner<S, A, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(learner)),
        }
    }

    fn lock(&self) -> LearnerResult<MutexGuard<'_, QLearner<S, A, R>>> {
        self.inner
            .lock()
            .map_err(|e| LearnerError::lock_error(format!("Q-table lock poisoned: {}", e)))
    }

    pub fn get_value(&self, state: &S, action: &A) -> LearnerResult<f64> {
        Ok(self.lock()?.get_value(state, action))
    }

    pub fn choose_action(&self, state: &S) -> LearnerResult<A> {
        self.lock()?.choose_action(state)
    }

    pub fn update(
        &self,
        state: &S,
        action: &A,
        reward: f64,
        next_state: &S,
    ) -> LearnerResult<f64> {
        self.lock()?.update(state, action, reward, next_state)
    }

    /// Run a compound operation under a single lock acquisition
    pub fn with_learner<T>(
        &self,
        f: impl FnOnce(&mut QLearner<S, A, R>) -> LearnerResult<T>,
    ) -> LearnerResult<T> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    pub fn snapshot(&self) -> LearnerResult<QTableSnapshot<S, A>> {
        Ok(self.lock()?.snapshot())
    }

    /// Unwrap the learner when this is the last handle
    pub fn try_into_inner(self) -> Result<QLearner<S, A, R>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().map_err(|e| Self::new(e.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerConfig;
    use crate::reinforcement::random::SeededRandom;
    use std::thread;

    fn shared(alpha: f64) -> SharedLearner<u32, u8, SeededRandom> {
        let config = LearnerConfig::new(alpha, 0.0, 0.0).unwrap();
        let learner = QLearner::with_random(vec![0, 1], config, SeededRandom::new(1)).unwrap();
        SharedLearner::new(learner)
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        // α = 1, γ = 0 makes each update Q ← reward, so use an accumulating
        // compound operation to detect lost read-modify-writes instead
        let learner = shared(1.0);
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let learner = learner.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        learner
                            .with_learner(|l| {
                                let current = l.get_value(&0, &1);
                                l.update(&0, &1, current + 1.0, &99)
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            learner.get_value(&0, &1).unwrap(),
            (threads * per_thread) as f64
        );
        assert_eq!(
            learner.with_learner(|l| Ok(l.updates())).unwrap(),
            (threads * per_thread) as u64
        );
    }

    #[test]
    fn test_same_key_updates_across_threads() {
        let learner = shared(1.0);
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let learner = learner.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        learner.update(&0, &1, 1.0, &99).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(learner.get_value(&0, &1).unwrap(), 1.0);
        assert_eq!(
            learner.with_learner(|l| Ok(l.updates())).unwrap(),
            (threads * per_thread) as u64
        );
        assert_eq!(learner.snapshot().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_update_counts_across_threads() {
        let learner = shared(0.5);
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let learner = learner.clone();
                thread::spawn(move || {
                    for i in 0..100u32 {
                        learner.update(&(t * 1000 + i), &0, 1.0, &0).unwrap();
                        learner.choose_action(&(t * 1000 + i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let learner = learner.try_into_inner().unwrap();
        assert_eq!(learner.len(), 400);
        assert_eq!(learner.updates(), 400);
    }

    #[test]
    fn test_errors_pass_through() {
        let learner = shared(0.5);
        let err = learner.update(&1, &7, 1.0, &2).unwrap_err();
        assert!(matches!(err, LearnerError::InvalidState { .. }));
        assert!(learner.snapshot().unwrap().entries.is_empty());
    }

    #[test]
    fn test_try_into_inner_with_other_handles() {
        let learner = shared(0.5);
        let other = learner.clone();
        let learner = learner.try_into_inner().unwrap_err();
        drop(other);
        assert!(learner.try_into_inner().is_ok());
    }
}
