//! Engagement intent schema shared between the feed client and its sync layer
//!
//! Every optimistic like/bookmark toggle applied by the interaction store is
//! published as a versioned envelope so the backend-sync collaborator can
//! persist it, and later request a compensating toggle if persistence fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for all intents
pub const SCHEMA_VERSION: u32 = 1;

/// Source name stamped on envelopes produced by the feed client
pub const CLIENT_SOURCE: &str = "feed-client";

/// Base envelope for all published intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique event ID for idempotency and tracing
    pub event_id: Uuid,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Schema version for compatibility checking
    pub schema_version: u32,
    /// Component that generated the event
    pub source: String,
    /// Event ID of the intent this one compensates, if any
    pub correlation_id: Option<Uuid>,
    /// Actual event payload
    pub data: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(source: impl Into<String>, data: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION,
            source: source.into(),
            correlation_id: None,
            data,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Returns true if this envelope can be decoded by the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version <= SCHEMA_VERSION
    }
}

// ============================================================================
// INTERACTION INTENTS
// ============================================================================

/// Who caused a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentOrigin {
    /// A user clicked a control
    User,
    /// The sync layer rolled back a toggle the backend rejected
    Compensation,
}

/// The new state produced by one toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngagementChange {
    Like { is_liked: bool, like_count: u64 },
    Bookmark { is_bookmarked: bool },
}

impl EngagementChange {
    /// The flag value the toggle produced.
    pub fn flag(&self) -> bool {
        match self {
            EngagementChange::Like { is_liked, .. } => *is_liked,
            EngagementChange::Bookmark { is_bookmarked } => *is_bookmarked,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            EngagementChange::Like { .. } => "like",
            EngagementChange::Bookmark { .. } => "bookmark",
        }
    }
}

/// Intent record emitted for every applied toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionIntent {
    pub post_id: Uuid,
    /// Store-wide, strictly increasing dispatch order
    pub sequence: u64,
    pub origin: IntentOrigin,
    pub change: EngagementChange,
}

impl InteractionIntent {
    pub fn is_compensation(&self) -> bool {
        self.origin == IntentOrigin::Compensation
    }

    /// Wrap the intent in an envelope stamped with the client source.
    pub fn into_envelope(self) -> EventEnvelope<InteractionIntent> {
        EventEnvelope::new(CLIENT_SOURCE, self)
    }
}
