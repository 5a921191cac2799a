//! Reply-correlation store: outbound message id -> pending continuation.
//!
//! Entries are registered only after the platform confirmed a send and are consumed by the first
//! reply that references them. The store is bounded (least recently registered entries are
//! evicted first) and entries older than the TTL are never resolved.

use crate::command::CommandDefinition;
use lru::LruCache;
use mbot_core::{IncomingMessage, UserRecord, WebhookEvent};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Invocation state frozen at registration time.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    pub args: Vec<String>,
    pub sender_id: String,
    pub thread_id: String,
    pub message: Option<IncomingMessage>,
    pub event: WebhookEvent,
    pub user: Option<UserRecord>,
    pub prefix: String,
    /// Command-supplied state for the continuation.
    pub captured: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct CorrelationEntry {
    pub command: Arc<CommandDefinition>,
    pub snapshot: ContextSnapshot,
}

struct Slot {
    registered_at: Instant,
    entry: CorrelationEntry,
}

pub struct CorrelationStore {
    entries: Mutex<LruCache<String, Slot>>,
    ttl: Duration,
}

impl CorrelationStore {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn register(&self, message_id: impl Into<String>, entry: CorrelationEntry) {
        self.register_at(message_id, entry, Instant::now());
    }

    pub fn register_at(&self, message_id: impl Into<String>, entry: CorrelationEntry, now: Instant) {
        let message_id = message_id.into();
        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(
            message_id.clone(),
            Slot {
                registered_at: now,
                entry,
            },
        ) {
            if evicted != message_id {
                debug!(message_id = %evicted, "Correlation evicted at capacity");
            }
        }
    }

    /// Removes and returns the entry for `message_id`. Expired entries are dropped unresolved.
    pub fn resolve(&self, message_id: &str) -> Option<CorrelationEntry> {
        self.resolve_at(message_id, Instant::now())
    }

    pub fn resolve_at(&self, message_id: &str, now: Instant) -> Option<CorrelationEntry> {
        let slot = self.entries.lock().pop(message_id)?;
        if now.saturating_duration_since(slot.registered_at) > self.ttl {
            debug!(message_id = %message_id, "Correlation expired");
            return None;
        }
        Some(slot.entry)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
