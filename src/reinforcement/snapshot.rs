// Serializable snapshots of a learner's value table

use crate::config::LearnerConfig;
use crate::error::{map_io_err, LearnerError, LearnerResult};
use crate::reinforcement::q_learning::QLearner;
use crate::reinforcement::random::RandomSource;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::path::Path;
use tracing::info;

/// One stored value
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SnapshotEntry<S, A> {
    pub state: S,
    pub action: A,
    pub value: f64,
}

/// Point-in-time copy of a learner's parameters and table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QTableSnapshot<S, A> {
    pub config: LearnerConfig,
    pub actions: Vec<A>,
    pub entries: Vec<SnapshotEntry<S, A>>,
    #[serde(default)]
    pub updates: u64,
    pub saved_at: DateTime<Utc>,
}

impl<S, A> QTableSnapshot<S, A>
where
    S: Serialize + DeserializeOwned,
    A: Serialize + DeserializeOwned,
{
    /// Write the snapshot as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> LearnerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(map_io_err(parent))?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(map_io_err(path))?;
        info!(
            "Saved {} Q-table entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a snapshot written by `save_json`
    pub fn load_json(path: impl AsRef<Path>) -> LearnerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(map_io_err(path))?;
        let snapshot: Self = serde_json::from_str(&content).map_err(|e| {
            LearnerError::parse_error(format!("failed to parse {}: {}", path.display(), e))
        })?;
        info!(
            "Loaded {} Q-table entries from {}",
            snapshot.entries.len(),
            path.display()
        );
        Ok(snapshot)
    }
}

impl<S, A, R> QLearner<S, A, R>
where
    S: Eq + Hash + Clone + Debug,
    A: Eq + Hash + Clone + Debug,
    R: RandomSource,
{
    /// Copy the parameters and every stored entry
    ///
    /// Entries are unordered.
    pub fn snapshot(&self) -> QTableSnapshot<S, A> {
        QTableSnapshot {
            config: *self.config(),
            actions: self.actions().to_vec(),
            entries: self
                .iter()
                .map(|(state, action, value)| SnapshotEntry {
                    state: state.clone(),
                    action: action.clone(),
                    value,
                })
                .collect(),
            updates: self.updates(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild a learner from a snapshot
    ///
    /// The config and action set are validated again. Entries naming an
    /// action outside the set, holding a non-finite value, or repeating a
    /// state-action pair are rejected.
    pub fn from_snapshot(snapshot: QTableSnapshot<S, A>, rng: R) -> LearnerResult<Self> {
        let mut learner = Self::with_random(snapshot.actions, snapshot.config, rng)?;

        for entry in snapshot.entries {
            if !learner.actions().contains(&entry.action) {
                return Err(LearnerError::invalid_state(format!(
                    "snapshot entry uses action {:?} outside the action set",
                    entry.action
                )));
            }
            if !entry.value.is_finite() {
                return Err(LearnerError::invalid_state(format!(
                    "snapshot entry for {:?}/{:?} has non-finite value",
                    entry.state, entry.action
                )));
            }
            let (state, action) = (entry.state.clone(), entry.action.clone());
            if learner.insert_value(entry.state, entry.action, entry.value).is_some() {
                return Err(LearnerError::invalid_state(format!(
                    "snapshot holds more than one entry for {:?}/{:?}",
                    state, action
                )));
            }
        }

        learner.set_updates(snapshot.updates);
        Ok(learner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reinforcement::random::SeededRandom;
    use tempfile::tempdir;

    fn trained() -> QLearner<String, String, SeededRandom> {
        let actions = vec!["up".to_string(), "down".to_string()];
        let config = LearnerConfig::new(0.5, 0.9, 0.0).unwrap();
        let mut learner = QLearner::with_random(actions, config, SeededRandom::new(1)).unwrap();
        learner
            .update(&"s0".to_string(), &"up".to_string(), 1.0, &"s1".to_string())
            .unwrap();
        learner
            .update(&"s1".to_string(), &"down".to_string(), -1.0, &"s0".to_string())
            .unwrap();
        learner
    }

    #[test]
    fn test_snapshot_restores_values() {
        let learner = trained();
        let snapshot = learner.snapshot();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.updates, 2);

        let restored = QLearner::from_snapshot(snapshot, SeededRandom::new(2)).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.updates(), 2);
        for (state, action, value) in learner.iter() {
            assert_eq!(restored.get_value(state, action), value);
        }
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tables").join("q.json");

        let learner = trained();
        learner.snapshot().save_json(&path).unwrap();

        let loaded: QTableSnapshot<String, String> = QTableSnapshot::load_json(&path).unwrap();
        let restored = QLearner::from_snapshot(loaded, SeededRandom::new(3)).unwrap();
        assert_eq!(
            restored.get_value(&"s0".to_string(), &"up".to_string()),
            0.5
        );
        assert_eq!(restored.config().learning_rate, 0.5);
    }

    #[test]
    fn test_foreign_action_rejected() {
        let mut snapshot = trained().snapshot();
        snapshot.entries.push(SnapshotEntry {
            state: "s0".to_string(),
            action: "jump".to_string(),
            value: 1.0,
        });

        let err = QLearner::from_snapshot(snapshot, SeededRandom::new(4)).unwrap_err();
        assert!(matches!(err, LearnerError::InvalidState { .. }));
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut snapshot = trained().snapshot();
        snapshot.entries.push(SnapshotEntry {
            state: "s0".to_string(),
            action: "up".to_string(),
            value: 7.0,
        });

        let err = QLearner::from_snapshot(snapshot, SeededRandom::new(7)).unwrap_err();
        assert!(matches!(err, LearnerError::InvalidState { .. }));
    }

    #[test]
    fn test_invalid_snapshot_config_rejected() {
        let mut snapshot = trained().snapshot();
        snapshot.config.exploration_rate = 2.0;
        let err = QLearner::from_snapshot(snapshot, SeededRandom::new(5)).unwrap_err();
        assert!(matches!(err, LearnerError::InvalidConfiguration { .. }));

        let mut empty = trained().snapshot();
        empty.actions.clear();
        assert!(QLearner::from_snapshot(empty, SeededRandom::new(6)).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = QTableSnapshot::<String, String>::load_json(dir.path().join("none.json"))
            .unwrap_err();
        assert!(matches!(err, LearnerError::Io { .. }));
    }
}
