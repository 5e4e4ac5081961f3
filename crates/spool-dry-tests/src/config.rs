// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use spool_app_core::config::{ConfigError, ConfigStore, PLANNER_CONFIG_KEY};
use spool_plan::PlannerConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share storage, so a test can keep one handle for assertions while
/// a `ConfigService` owns another. Load/save attempts are counted.
///
/// # Example
///
/// ```
/// use spool_dry_tests::InMemoryConfigStore;
/// use spool_app_core::config::ConfigService;
/// use spool_plan::PlannerConfig;
///
/// let store = InMemoryConfigStore::with_planner_config(PlannerConfig {
///     sink_signature_cache: true,
/// });
/// let service = ConfigService::new(store.clone());
/// let loaded: Option<PlannerConfig> = service.load("planner").unwrap();
/// assert!(loaded.unwrap().sink_signature_cache);
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<InMemoryConfigStoreInner>>,
}

#[derive(Default)]
struct InMemoryConfigStoreInner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `config` under the planner key.
    pub fn with_planner_config(config: PlannerConfig) -> Self {
        let store = Self::new();
        // Serializing a struct with a single bool field cannot fail.
        let bytes = serde_json::to_vec(&config).unwrap_or_default();
        store.insert_raw(PLANNER_CONFIG_KEY, &bytes);
        store
    }

    /// Put raw bytes under `key` without counting a save.
    pub fn insert_raw(&self, key: &str, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.data.insert(key.to_string(), data.to_vec());
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_on_load = fail;
    }

    /// Number of `load_raw` attempts, including failed ones.
    pub fn load_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_count
    }

    /// Number of `save_raw` calls.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_count
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .contains_key(key)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }

        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_count += 1;
        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}
