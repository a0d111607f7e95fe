/// End-to-end tests: store -> intent channel -> sync worker -> store
mod common;

use async_trait::async_trait;
use common::post_with;
use engagement_events::{EngagementChange, IntentOrigin, InteractionIntent};
use feed_client::config::SyncConfig;
use feed_client::sync::{EngagementBackend, SyncWorker};
use feed_client::{ClientError, ClientResult, Control, InteractionStore, PostCard};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Rejects every intent for the listed posts and reports each call.
struct RejectingBackend {
    reject: HashSet<Uuid>,
    seen: mpsc::UnboundedSender<InteractionIntent>,
}

#[async_trait]
impl EngagementBackend for RejectingBackend {
    async fn persist(&self, intent: &InteractionIntent) -> ClientResult<()> {
        let _ = self.seen.send(*intent);
        if self.reject.contains(&intent.post_id) {
            Err(ClientError::InvalidInput("post is locked".to_string()))
        } else {
            Ok(())
        }
    }
}

fn config() -> SyncConfig {
    SyncConfig {
        enabled: true,
        max_attempts: 3,
        retry_backoff_ms: 0,
        max_backoff_ms: 0,
        timeout_ms: 1_000,
    }
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_rejected_like_is_rolled_back_accepted_one_stays() {
    let (store, rx) = InteractionStore::with_intent_channel();
    let store = Arc::new(store);

    let locked = post_with(10, false, false);
    let open = post_with(20, false, false);
    let (locked_id, open_id) = (locked.id, open.id);
    store.load_feed(vec![locked, open]);

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(RejectingBackend {
        reject: HashSet::from([locked_id]),
        seen: seen_tx,
    });
    let worker = SyncWorker::new(&store, backend, config()).spawn(rx);

    // Optimistic: visible before the backend sees anything.
    store.like_post(locked_id).unwrap();
    store.like_post(open_id).unwrap();
    assert!(store.get_post(locked_id).unwrap().is_liked);

    // Non-retryable rejection: exactly one call per intent.
    let first = seen_rx.recv().await.unwrap();
    let second = seen_rx.recv().await.unwrap();
    assert_eq!(first.post_id, locked_id);
    assert_eq!(second.post_id, open_id);
    settle().await;

    let locked_after = store.get_post(locked_id).unwrap();
    assert_eq!((locked_after.is_liked, locked_after.likes), (false, 10));
    let open_after = store.get_post(open_id).unwrap();
    assert_eq!((open_after.is_liked, open_after.likes), (true, 21));

    drop(store);
    let stats = worker.await.unwrap();
    assert_eq!(stats.persisted, 1);
    assert_eq!(stats.reverted, 1);
    // the compensation for the locked post was not sent to the backend
    assert_eq!(stats.skipped, 1);
    assert!(seen_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_card_clicks_publish_intents_in_order() {
    let (store, mut rx) = InteractionStore::with_intent_channel();
    let store = Arc::new(store);
    let post = post_with(5, false, false);
    let id = post.id;
    store.load_feed(vec![post]);

    let card = PostCard::mount(store.clone(), id, Default::default());
    card.click(Control::Like);
    card.click(Control::Like);
    card.click(Control::Bookmark);

    let mut received = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        assert_eq!(envelope.data.origin, IntentOrigin::User);
        received.push(envelope.data);
    }

    let sequences: Vec<u64> = received.iter().map(|i| i.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(
        received[0].change,
        EngagementChange::Like {
            is_liked: true,
            like_count: 6
        }
    );
    assert_eq!(
        received[1].change,
        EngagementChange::Like {
            is_liked: false,
            like_count: 5
        }
    );
    assert_eq!(
        received[2].change,
        EngagementChange::Bookmark {
            is_bookmarked: true
        }
    );
}

#[tokio::test]
async fn test_rapid_toggle_with_failures_converges_to_backend_state() {
    let (store, rx) = InteractionStore::with_intent_channel();
    let store = Arc::new(store);
    let post = post_with(10, false, false);
    let id = post.id;
    store.load_feed(vec![post]);

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(RejectingBackend {
        reject: HashSet::from([id]),
        seen: seen_tx,
    });
    let worker = SyncWorker::new(&store, backend, config()).spawn(rx);

    // like + unlike before the worker runs; both get rejected
    store.like_post(id).unwrap();
    store.like_post(id).unwrap();

    seen_rx.recv().await.unwrap();
    seen_rx.recv().await.unwrap();
    settle().await;

    // the backend never changed, and neither does the visible state
    let p = store.get_post(id).unwrap();
    assert_eq!((p.is_liked, p.likes), (false, 10));

    drop(store);
    let stats = worker.await.unwrap();
    assert_eq!(stats.reverted, 0);
    assert_eq!(stats.failed, 2);
}
