use super::EngagementBackend;
use crate::config::SyncConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::{IntentEnvelope, IntentReceiver, InteractionStore};
use engagement_events::InteractionIntent;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counters reported when the worker stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Intents the backend accepted
    pub persisted: u64,
    /// Rejected intents rolled back in the store
    pub reverted: u64,
    /// Rejected intents that needed no rollback
    pub failed: u64,
    /// Compensations, incompatible envelopes and intents left over after
    /// the store was dropped, none of them sent to the backend
    pub skipped: u64,
}

/// Drains the store's intent channel into an [`EngagementBackend`].
///
/// Holds only a weak reference to the store: once the session drops its
/// store the channel closes, the intents still queued are discarded and
/// [`SyncWorker::run`] returns. Every backend call is bounded by
/// `timeout_ms`, so a hung backend cannot hold the worker open.
pub struct SyncWorker<B: ?Sized> {
    store: Weak<InteractionStore>,
    backend: Arc<B>,
    config: SyncConfig,
    stats: SyncStats,
}

impl<B> SyncWorker<B>
where
    B: EngagementBackend + ?Sized + 'static,
{
    pub fn new(store: &Arc<InteractionStore>, backend: Arc<B>, config: SyncConfig) -> Self {
        Self {
            store: Arc::downgrade(store),
            backend,
            config,
            stats: SyncStats::default(),
        }
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Process intents until the channel closes.
    pub async fn run(mut self, mut rx: IntentReceiver) -> SyncStats {
        info!(
            max_attempts = self.config.max_attempts,
            retry_backoff_ms = self.config.retry_backoff_ms,
            max_backoff_ms = self.config.max_backoff_ms,
            timeout_ms = self.config.timeout_ms,
            "Starting engagement sync worker"
        );

        while let Some(envelope) = rx.recv().await {
            self.process(&envelope).await;
        }

        info!(
            persisted = self.stats.persisted,
            reverted = self.stats.reverted,
            failed = self.stats.failed,
            skipped = self.stats.skipped,
            "Engagement sync worker stopped"
        );
        self.stats
    }

    pub fn spawn(self, rx: IntentReceiver) -> JoinHandle<SyncStats> {
        tokio::spawn(self.run(rx))
    }

    /// Persist one intent, rolling it back in the store if the backend
    /// rejects it after all attempts.
    pub async fn process(&mut self, envelope: &IntentEnvelope) {
        let intent = &envelope.data;

        if !envelope.is_compatible() {
            warn!(
                event_id = %envelope.event_id,
                schema_version = envelope.schema_version,
                "Skipping intent with unsupported schema"
            );
            self.stats.skipped += 1;
            return;
        }

        // Nothing left to confirm or roll back once the session is gone.
        if self.store.strong_count() == 0 {
            debug!(
                post_id = %intent.post_id,
                sequence = intent.sequence,
                "Store dropped, discarding intent"
            );
            self.stats.skipped += 1;
            return;
        }

        // Compensations restore what the backend already holds.
        if intent.is_compensation() {
            debug!(post_id = %intent.post_id, sequence = intent.sequence, "Skipping compensation");
            self.stats.skipped += 1;
            return;
        }

        match self.persist_with_retry(intent).await {
            Ok(()) => {
                if let Some(store) = self.store.upgrade() {
                    store.confirm(intent);
                }
                self.stats.persisted += 1;
            }
            Err(e) => {
                warn!(
                    post_id = %intent.post_id,
                    sequence = intent.sequence,
                    kind = intent.change.kind_str(),
                    error = %e,
                    "Backend rejected intent"
                );
                let reverted = self
                    .store
                    .upgrade()
                    .and_then(|store| store.revert(envelope))
                    .is_some();
                if reverted {
                    self.stats.reverted += 1;
                } else {
                    self.stats.failed += 1;
                }
            }
        }
    }

    async fn persist_with_retry(&self, intent: &InteractionIntent) -> ClientResult<()> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.persist_once(intent).await {
                Ok(()) => return Ok(()),
                Err(e)
                    if e.is_retryable()
                        && attempt < self.config.max_attempts
                        && self.store.strong_count() > 0 =>
                {
                    let delay = backoff_delay(&self.config, attempt);
                    debug!(
                        post_id = %intent.post_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying intent"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn persist_once(&self, intent: &InteractionIntent) -> ClientResult<()> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        tokio::time::timeout(timeout, self.backend.persist(intent))
            .await
            .map_err(|_| ClientError::Timeout(self.config.timeout_ms))?
    }
}

/// Linear backoff, capped at `max_backoff_ms`.
fn backoff_delay(config: &SyncConfig, attempt: u32) -> Duration {
    let ms = config
        .retry_backoff_ms
        .saturating_mul(u64::from(attempt))
        .min(config.max_backoff_ms);
    Duration::from_millis(ms)
}
