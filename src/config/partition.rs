//! Runtime partitions
//!
//! A runtime partition is a named configuration scope nodes are assigned
//! to by index. Composite nodes whose failure policy is
//! `InheritFromPartition` read their continuation defaults from here.

use serde::{Deserialize, Serialize};

/// Failure-handling defaults of a runtime partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueOnFailureSettings {
    /// Absorb failures of nodes in this partition
    #[serde(default)]
    pub continue_on_failure: bool,

    /// Export the inputs of absorbed failures
    #[serde(default = "default_true")]
    pub export_failed_inputs: bool,

    /// Never absorb failures while the run populates the cache
    #[serde(default = "default_true")]
    pub disable_on_cache_update: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ContinueOnFailureSettings {
    fn default() -> Self {
        Self {
            continue_on_failure: false,
            export_failed_inputs: true,
            disable_on_cache_update: true,
        }
    }
}

/// A named runtime partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimePartition {
    pub name: String,

    #[serde(default)]
    pub continue_on_failure: ContinueOnFailureSettings,
}

impl RuntimePartition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            continue_on_failure: ContinueOnFailureSettings::default(),
        }
    }

    pub fn with_continue_on_failure(mut self, settings: ContinueOnFailureSettings) -> Self {
        self.continue_on_failure = settings;
        self
    }
}

/// Read access to partition settings by index.
pub trait PartitionLookup {
    /// Name of the partition at `index` (clamped).
    fn partition_name(&self, index: usize) -> String;

    /// Continuation settings of the partition at `index` (clamped).
    fn continue_on_failure_settings(&self, index: usize) -> ContinueOnFailureSettings;
}

/// Ordered list of partitions. Never empty: index 0 is the default partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RuntimePartition>", into = "Vec<RuntimePartition>")]
pub struct RuntimePartitionRegistry {
    partitions: Vec<RuntimePartition>,
}

impl Default for RuntimePartitionRegistry {
    fn default() -> Self {
        Self {
            partitions: vec![RuntimePartition::new("Default")],
        }
    }
}

impl RuntimePartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a partition and return its index.
    pub fn add(&mut self, partition: RuntimePartition) -> usize {
        self.partitions.push(partition);
        self.partitions.len() - 1
    }

    /// Partition at `index`, clamped into the valid range.
    pub fn get(&self, index: usize) -> &RuntimePartition {
        let clamped = index.min(self.partitions.len() - 1);
        &self.partitions[clamped]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut RuntimePartition {
        let clamped = index.min(self.partitions.len() - 1);
        &mut self.partitions[clamped]
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuntimePartition> {
        self.partitions.iter()
    }
}

impl PartitionLookup for RuntimePartitionRegistry {
    fn partition_name(&self, index: usize) -> String {
        self.get(index).name.clone()
    }

    fn continue_on_failure_settings(&self, index: usize) -> ContinueOnFailureSettings {
        self.get(index).continue_on_failure
    }
}

impl From<Vec<RuntimePartition>> for RuntimePartitionRegistry {
    fn from(partitions: Vec<RuntimePartition>) -> Self {
        if partitions.is_empty() {
            Self::default()
        } else {
            Self { partitions }
        }
    }
}

impl From<RuntimePartitionRegistry> for Vec<RuntimePartition> {
    fn from(registry: RuntimePartitionRegistry) -> Self {
        registry.partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_one_partition() {
        let registry = RuntimePartitionRegistry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).name, "Default");
    }

    #[test]
    fn test_lookup_clamps_index() {
        let mut registry = RuntimePartitionRegistry::new();
        let idx = registry.add(RuntimePartition::new("GPU").with_continue_on_failure(
            ContinueOnFailureSettings {
                continue_on_failure: true,
                ..Default::default()
            },
        ));
        assert_eq!(idx, 1);
        assert_eq!(registry.get(99).name, "GPU");
        assert!(registry.continue_on_failure_settings(42).continue_on_failure);
        assert_eq!(registry.partition_name(0), "Default");
    }

    #[test]
    fn test_empty_list_deserializes_to_default() {
        let registry: RuntimePartitionRegistry = serde_json::from_str("[]").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_partition_defaults() {
        let p: RuntimePartition = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert!(!p.continue_on_failure.continue_on_failure);
        assert!(p.continue_on_failure.export_failed_inputs);
        assert!(p.continue_on_failure.disable_on_cache_update);
    }
}
