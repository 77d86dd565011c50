//! In-memory analysis store
//!
//! Each per-modality analysis is kept under its own UUID so a later
//! "complete" request can fuse results produced by separate uploads.
//! The store holds at most `capacity` records; inserting past that evicts
//! the oldest record first.

use chrono::{DateTime, Utc};
use mmfd_common::{Modality, ModalityResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Capacity of [`AnalysisStore::new`]
pub const DEFAULT_CAPACITY: usize = 10_000;

/// One stored per-modality analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub modality: Modality,
    pub created_at: DateTime<Utc>,
    pub result: ModalityResult,
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, AnalysisRecord>,
    /// IDs oldest first
    order: VecDeque<Uuid>,
}

#[derive(Debug, Clone)]
pub struct AnalysisStore {
    records: Arc<RwLock<Records>>,
    capacity: usize,
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bounded to `capacity` records (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Records::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store a result under a fresh ID and return the record
    pub async fn insert(&self, modality: Modality, result: ModalityResult) -> AnalysisRecord {
        let mut records = self.records.write().await;

        while records.by_id.len() >= self.capacity {
            let Some(oldest) = records.order.pop_front() else {
                break;
            };
            if let Some(evicted) = records.by_id.remove(&oldest) {
                debug!(
                    "Evicted {} analysis {} (created {})",
                    evicted.modality, evicted.id, evicted.created_at
                );
            }
        }

        // Timestamp taken under the write lock so `order` follows `created_at`
        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            modality,
            created_at: Utc::now(),
            result,
        };
        records.order.push_back(record.id);
        records.by_id.insert(record.id, record.clone());
        record
    }

    pub async fn get(&self, id: Uuid) -> Option<AnalysisRecord> {
        self.records.read().await.by_id.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.by_id.is_empty()
    }
}
