//! Bounded per-entity audit trail of successful mutations.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub seq: u64,
    pub action: AuditAction,
    pub entity_id: u64,
    /// Field names applied by an update; empty for create and delete.
    pub changes: Vec<String>,
    pub at: DateTime<Utc>,
}

/// Ring buffer: once `capacity` is reached the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
    next_seq: u64,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity.min(1024)), capacity, next_seq: 1 }
    }

    pub fn record(&mut self, action: AuditAction, entity_id: u64, changes: Vec<String>, at: DateTime<Utc>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(AuditEntry { seq: self.next_seq, action, entity_id, changes, at });
        self.next_seq += 1;
    }

    /// Newest first, at most `limit` entries.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
