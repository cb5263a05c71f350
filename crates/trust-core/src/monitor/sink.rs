//! Verdict propagation to the host
//!
//! The host reads a boolean parameter per dashboard to decide whether to show
//! content or a blocking notice. [`ParameterStore`] is the in-process copy of
//! those parameters; [`ParameterSink`] writes one monitor's flag into it.

use super::VerdictSink;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Current value of one host parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub value: bool,
    pub updated_at: DateTime<Utc>,
}

/// Concurrent map of host parameters
#[derive(Debug, Default)]
pub struct ParameterStore {
    parameters: DashMap<String, ParameterValue>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, value: bool) {
        self.parameters.insert(
            name.to_string(),
            ParameterValue {
                value,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).map(|entry| *entry.value())
    }

    /// Sorted copy of every parameter
    pub fn snapshot(&self) -> BTreeMap<String, ParameterValue> {
        self.parameters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

/// Writes a monitor's `is_safe` into a named parameter
#[derive(Debug, Clone)]
pub struct ParameterSink {
    store: Arc<ParameterStore>,
    parameter: String,
}

impl ParameterSink {
    pub fn new(store: Arc<ParameterStore>, parameter: impl Into<String>) -> Self {
        Self {
            store,
            parameter: parameter.into(),
        }
    }
}

#[async_trait]
impl VerdictSink for ParameterSink {
    async fn publish(&self, _metric: &str, is_safe: bool) -> Result<()> {
        self.store.set(&self.parameter, is_safe);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_writes_named_parameter() {
        let store = Arc::new(ParameterStore::new());
        let sink = ParameterSink::new(store.clone(), "margin_is_safe");

        sink.publish("margin", false).await.unwrap();
        assert!(!store.get("margin_is_safe").unwrap().value);

        sink.publish("margin", true).await.unwrap();
        assert!(store.get("margin_is_safe").unwrap().value);
        assert!(store.get("other").is_none());
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let store = ParameterStore::new();
        store.set("b", true);
        store.set("a", false);
        let keys: Vec<String> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
