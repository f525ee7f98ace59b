//! Pending allocation state
//!
//! Edits are staged locally before being applied: `fetch` seeds this file
//! from the backend, `set`/`total` mutate it through the pool's guards, and
//! `apply` submits the whole pool as one batch update. The file is plain
//! TOML next to the project so it can be inspected and versioned.

use crate::allocation::ResourcePool;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationState {
    pub pool: ResourcePool,
    /// When the pool was last seeded from the backend, if ever.
    pub fetched_at: Option<DateTime<Utc>>,
    /// When the pool was last applied to the backend, if ever.
    pub applied_at: Option<DateTime<Utc>>,
}

impl Default for AllocationState {
    fn default() -> Self {
        Self {
            pool: ResourcePool::default(),
            fetched_at: None,
            applied_at: None,
        }
    }
}

impl AllocationState {
    /// Load the state file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: AllocationState = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize allocation state")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;
        Ok(())
    }

    /// Replace the pool with freshly fetched backend values.
    pub fn seed(&mut self, pool: ResourcePool) {
        self.pool = pool;
        self.fetched_at = Some(Utc::now());
    }

    pub fn mark_applied(&mut self) {
        self.applied_at = Some(Utc::now());
    }

    /// Back to the shipped defaults with dedicated resources off, as after a
    /// successful disable.
    pub fn reset_disabled(&mut self) {
        self.pool = ResourcePool::disabled();
        self.applied_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Service;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let state = AllocationState::load(&temp_dir.path().join("none.toml")).unwrap();
        assert!(state.pool.enabled);
        assert!(state.fetched_at.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.toml");

        let mut state = AllocationState::default();
        state.pool.set_vcpu(Service::Database, 750).unwrap();
        state.seed(state.pool.clone());
        state.save(&path).unwrap();

        let loaded = AllocationState::load(&path).unwrap();
        assert_eq!(loaded.pool.database.vcpu, 750);
        assert!(loaded.fetched_at.is_some());
    }

    #[test]
    fn test_reset_disabled() {
        let mut state = AllocationState::default();
        state.pool.set_vcpu(Service::Database, 750).unwrap();
        state.reset_disabled();
        assert!(!state.pool.enabled);
        assert_eq!(state.pool.database.vcpu, 1000);
        assert!(state.applied_at.is_some());
    }
}
