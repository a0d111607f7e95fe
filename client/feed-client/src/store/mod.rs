//! Session-scoped interaction store
//!
//! Holds every post the feed loader has delivered and applies like and
//! bookmark toggles in place. A toggle is applied under the post's map entry
//! lock, so the read of the current flag, the write of the new state, the
//! sequence stamp and the publish of the intent happen as one step per post.

use crate::config::SyncConfig;
use crate::domain::models::Post;
use crate::error::{ClientError, ClientResult};
use dashmap::DashMap;
use engagement_events::{EngagementChange, EventEnvelope, IntentOrigin, InteractionIntent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

pub type IntentEnvelope = EventEnvelope<InteractionIntent>;
pub type IntentSender = mpsc::UnboundedSender<IntentEnvelope>;
pub type IntentReceiver = mpsc::UnboundedReceiver<IntentEnvelope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Like,
    Bookmark,
}

impl Toggle {
    fn of(change: &EngagementChange) -> Self {
        match change {
            EngagementChange::Like { .. } => Toggle::Like,
            EngagementChange::Bookmark { .. } => Toggle::Bookmark,
        }
    }
}

/// Sync bookkeeping for one flag of one post
#[derive(Debug, Clone, Copy)]
struct Track {
    /// Sequence of the latest toggle applied locally (0 = none)
    last_sequence: u64,
    /// Flag value the backend is known to hold
    confirmed: bool,
    confirmed_sequence: u64,
}

impl Track {
    fn loaded(flag: bool) -> Self {
        Self {
            last_sequence: 0,
            confirmed: flag,
            confirmed_sequence: 0,
        }
    }
}

struct Slot {
    post: Post,
    like: Track,
    bookmark: Track,
}

impl Slot {
    fn new(post: Post) -> Self {
        Self {
            like: Track::loaded(post.is_liked),
            bookmark: Track::loaded(post.is_bookmarked),
            post,
        }
    }

    fn track_mut(&mut self, toggle: Toggle) -> &mut Track {
        match toggle {
            Toggle::Like => &mut self.like,
            Toggle::Bookmark => &mut self.bookmark,
        }
    }

    fn flag(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Like => self.post.is_liked,
            Toggle::Bookmark => self.post.is_bookmarked,
        }
    }
}

/// Authoritative in-memory copy of the loaded feed for one session
///
/// Construct one per session, share it behind an `Arc` with every view, and
/// call [`InteractionStore::clear`] (or drop it) when the session ends.
pub struct InteractionStore {
    posts: DashMap<Uuid, Slot>,
    /// Feed order as delivered by the loader
    order: RwLock<Vec<Uuid>>,
    sequence: AtomicU64,
    intents: Option<IntentSender>,
}

impl Default for InteractionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionStore {
    /// Store that only returns intents to the caller.
    pub fn new() -> Self {
        Self {
            posts: DashMap::new(),
            order: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            intents: None,
        }
    }

    /// Store that also publishes every intent for a sync consumer.
    pub fn with_intent_channel() -> (Self, IntentReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            intents: Some(tx),
            ..Self::new()
        };
        (store, rx)
    }

    /// Build a store according to the sync settings.
    pub fn from_config(sync: &SyncConfig) -> (Self, Option<IntentReceiver>) {
        if sync.enabled {
            let (store, rx) = Self::with_intent_channel();
            (store, Some(rx))
        } else {
            (Self::new(), None)
        }
    }

    // ========== Feed Loading ==========

    /// Replace the whole feed with a freshly loaded batch.
    pub fn load_feed(&self, posts: Vec<Post>) {
        let mut order = self.order.write();
        order.clear();
        self.posts.clear();
        let count = posts.len();
        self.insert_all(&mut order, posts);
        debug!(count, "Loaded feed");
    }

    /// Append the next page. A post that is already loaded keeps its place
    /// and takes the new snapshot.
    pub fn append_page(&self, posts: Vec<Post>) {
        let mut order = self.order.write();
        let count = posts.len();
        self.insert_all(&mut order, posts);
        debug!(count, total = order.len(), "Appended feed page");
    }

    fn insert_all(&self, order: &mut Vec<Uuid>, posts: Vec<Post>) {
        for post in posts {
            let id = post.id;
            if self.posts.insert(id, Slot::new(post)).is_none() {
                order.push(id);
            }
        }
    }

    /// Drop posts the loader discarded. Unknown ids are ignored.
    pub fn evict(&self, post_ids: &[Uuid]) -> usize {
        let mut order = self.order.write();
        let mut removed = 0;
        for id in post_ids {
            if self.posts.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            order.retain(|id| self.posts.contains_key(id));
        }
        debug!(requested = post_ids.len(), removed, "Evicted posts");
        removed
    }

    /// Forget every post (session teardown).
    pub fn clear(&self) {
        let mut order = self.order.write();
        order.clear();
        self.posts.clear();
    }

    // ========== Reads ==========

    /// Current snapshot of one post.
    pub fn get_post(&self, post_id: Uuid) -> Option<Post> {
        self.posts.get(&post_id).map(|slot| slot.post.clone())
    }

    pub fn require_post(&self, post_id: Uuid) -> ClientResult<Post> {
        self.get_post(post_id).ok_or(ClientError::NotFound(post_id))
    }

    /// Snapshots of every loaded post in feed order.
    pub fn posts(&self) -> Vec<Post> {
        let order = self.order.read();
        order
            .iter()
            .filter_map(|id| self.posts.get(id).map(|slot| slot.post.clone()))
            .collect()
    }

    pub fn contains(&self, post_id: Uuid) -> bool {
        self.posts.contains_key(&post_id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    // ========== Toggles ==========

    /// Toggle the viewer's like on a post.
    ///
    /// Liking sets the flag and adds one to `likes`; unliking clears it and
    /// takes one away, never going below zero. Returns `None` and changes
    /// nothing if the post is not loaded.
    pub fn like_post(&self, post_id: Uuid) -> Option<InteractionIntent> {
        self.apply(post_id, Toggle::Like, IntentOrigin::User, None)
    }

    /// Toggle the viewer's bookmark on a post. No counter moves.
    pub fn bookmark_post(&self, post_id: Uuid) -> Option<InteractionIntent> {
        self.apply(post_id, Toggle::Bookmark, IntentOrigin::User, None)
    }

    fn apply(
        &self,
        post_id: Uuid,
        toggle: Toggle,
        origin: IntentOrigin,
        correlation_id: Option<Uuid>,
    ) -> Option<InteractionIntent> {
        let Some(mut slot) = self.posts.get_mut(&post_id) else {
            debug!(post_id = %post_id, ?toggle, "Toggle on unknown post ignored");
            return None;
        };
        Some(self.apply_to(&mut slot, toggle, origin, correlation_id))
    }

    /// Caller holds the entry lock for `slot`.
    fn apply_to(
        &self,
        slot: &mut Slot,
        toggle: Toggle,
        origin: IntentOrigin,
        correlation_id: Option<Uuid>,
    ) -> InteractionIntent {
        let post_id = slot.post.id;
        let change = match toggle {
            Toggle::Like => {
                if slot.post.toggle_like() {
                    warn!(post_id = %post_id, "Like count already zero on unlike, clamped");
                }
                EngagementChange::Like {
                    is_liked: slot.post.is_liked,
                    like_count: slot.post.likes,
                }
            }
            Toggle::Bookmark => {
                slot.post.toggle_bookmark();
                EngagementChange::Bookmark {
                    is_bookmarked: slot.post.is_bookmarked,
                }
            }
        };

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        slot.track_mut(toggle).last_sequence = sequence;

        let intent = InteractionIntent {
            post_id,
            sequence,
            origin,
            change,
        };

        debug!(
            post_id = %post_id,
            kind = change.kind_str(),
            flag = change.flag(),
            sequence,
            ?origin,
            "Applied toggle"
        );

        // Published while the entry lock is held so intents for one post
        // reach the channel in the order they were applied.
        self.publish(intent, correlation_id);

        intent
    }

    fn publish(&self, intent: InteractionIntent, correlation_id: Option<Uuid>) {
        let Some(tx) = &self.intents else {
            return;
        };

        let mut envelope = intent.into_envelope();
        if let Some(id) = correlation_id {
            envelope = envelope.with_correlation_id(id);
        }

        if tx.send(envelope).is_err() {
            warn!(
                post_id = %intent.post_id,
                sequence = intent.sequence,
                "Intent channel closed, intent dropped"
            );
        }
    }

    // ========== Sync Seam ==========

    /// Record that the backend accepted an intent.
    pub fn confirm(&self, intent: &InteractionIntent) {
        let Some(mut slot) = self.posts.get_mut(&intent.post_id) else {
            return;
        };
        let track = slot.track_mut(Toggle::of(&intent.change));
        if intent.sequence > track.confirmed_sequence {
            track.confirmed = intent.change.flag();
            track.confirmed_sequence = intent.sequence;
        }
    }

    /// Roll back an intent the backend rejected.
    ///
    /// Applies the same toggle again, but only when the rejected intent is
    /// still the latest change to that flag and the flag differs from what
    /// the backend is known to hold. A later toggle carries its own intent
    /// and supersedes this one. Returns the compensating intent, if any.
    pub fn revert(&self, failed: &IntentEnvelope) -> Option<InteractionIntent> {
        let intent = &failed.data;
        let toggle = Toggle::of(&intent.change);

        let Some(mut slot) = self.posts.get_mut(&intent.post_id) else {
            debug!(post_id = %intent.post_id, "Revert for unloaded post ignored");
            return None;
        };
        let flag = slot.flag(toggle);
        let track = slot.track_mut(toggle);

        if track.last_sequence != intent.sequence {
            debug!(
                post_id = %intent.post_id,
                sequence = intent.sequence,
                latest = track.last_sequence,
                "Rejected intent superseded, no revert"
            );
            return None;
        }
        if flag == track.confirmed {
            // Already matches the backend; mark the rejection handled.
            track.last_sequence = 0;
            return None;
        }

        Some(self.apply_to(
            &mut slot,
            toggle,
            IntentOrigin::Compensation,
            Some(failed.event_id),
        ))
    }
}
