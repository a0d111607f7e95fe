//! Seam between the interaction store and whatever persists engagement.
//!
//! The store publishes an intent for every toggle; a [`worker::SyncWorker`]
//! consumes them, hands each to an [`EngagementBackend`], and asks the store
//! to roll the toggle back when the backend keeps rejecting it.

pub mod worker;

use crate::error::ClientResult;
use async_trait::async_trait;
use engagement_events::InteractionIntent;

pub use worker::{SyncStats, SyncWorker};

/// Persists the new engagement state carried by an intent
///
/// Implementations should treat an intent as "set the flag to this value"
/// so that repeating it is harmless.
#[async_trait]
pub trait EngagementBackend: Send + Sync {
    async fn persist(&self, intent: &InteractionIntent) -> ClientResult<()>;
}

/// Backend that accepts everything. Used until a real transport is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

#[async_trait]
impl EngagementBackend for NoopBackend {
    async fn persist(&self, _intent: &InteractionIntent) -> ClientResult<()> {
        Ok(())
    }
}
