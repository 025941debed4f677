//! Extension point for merging inbound records into local state
//!
//! No merge semantics exist yet: the default merger accepts inbound batches
//! for known categories without touching local state.

use crate::error::Result;
use crate::records::Category;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of handing a batch to a merger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Records were accepted but not applied to local state
    Deferred { records: usize },
    /// Records were applied to local state
    Applied { records: usize },
}

/// Per-category merge strategy for inbound records
pub trait RecordMerger: Send + Sync {
    fn merge(&self, category: Category, records: &[serde_json::Value]) -> Result<MergeOutcome>;
}

/// Accepts every batch without applying it
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredMerge;

impl RecordMerger for DeferredMerge {
    fn merge(&self, category: Category, records: &[serde_json::Value]) -> Result<MergeOutcome> {
        debug!(
            category = %category,
            records = records.len(),
            "Inbound records accepted, merge deferred"
        );
        Ok(MergeOutcome::Deferred {
            records: records.len(),
        })
    }
}

/// Routes inbound batches to the merger registered for their category
#[derive(Clone)]
pub struct MergeRegistry {
    mergers: HashMap<Category, Arc<dyn RecordMerger>>,
    fallback: Arc<dyn RecordMerger>,
}

impl Default for MergeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeRegistry {
    /// Registry where every category defers
    pub fn new() -> Self {
        Self {
            mergers: HashMap::new(),
            fallback: Arc::new(DeferredMerge),
        }
    }

    pub fn register(&mut self, category: Category, merger: Arc<dyn RecordMerger>) {
        self.mergers.insert(category, merger);
    }

    pub fn merge(&self, category: Category, records: &[serde_json::Value]) -> Result<MergeOutcome> {
        self.mergers
            .get(&category)
            .unwrap_or(&self.fallback)
            .merge(category, records)
    }
}
