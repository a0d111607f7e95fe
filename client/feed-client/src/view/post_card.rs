use crate::config::DisplayConfig;
use crate::domain::models::Post;
use crate::formatting::{compact_count, relative_time_at};
use crate::store::InteractionStore;
use chrono::{DateTime, SecondsFormat, Utc};
use engagement_events::InteractionIntent;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Image references that failed to load in one mounted card
#[derive(Debug, Default, Clone)]
pub struct ImageErrorSet {
    failed: HashSet<String>,
}

impl ImageErrorSet {
    pub fn mark_failed(&mut self, image: &str) -> bool {
        self.failed.insert(image.to_string())
    }

    pub fn has_failed(&self, image: &str) -> bool {
        self.failed.contains(image)
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Clickable controls on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Like,
    Bookmark,
    Comment,
    Share,
}

/// What a click produced, for the host to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    /// The store applied a toggle
    Engagement(InteractionIntent),
    /// Comments are owned by another component
    OpenComments(Uuid),
    /// Sharing is owned by another component
    Share(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub display_name: String,
    pub handle: String,
    pub profile_path: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageTile {
    pub src: String,
    pub alt: String,
    /// Spans two grid rows
    pub tall: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageGrid {
    pub columns: u8,
    pub tiles: Vec<ImageTile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleControl {
    pub active: bool,
    pub label: String,
}

/// Everything a renderer needs to draw one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCardView {
    pub post_id: Uuid,
    pub author: AuthorView,
    pub time_ago: String,
    /// RFC3339 timestamp for machine-readable markup
    pub published_at: String,
    pub location: Option<String>,
    pub content: String,
    pub tags: Vec<TagLink>,
    pub images: Option<ImageGrid>,
    pub like: ToggleControl,
    pub comments: String,
    pub shares: String,
    pub bookmarked: bool,
}

/// One mounted post card
///
/// Reads its post from the shared store on every render and sends likes
/// and bookmarks back to it. The only state it owns is the set of images
/// that failed to load, which lives exactly as long as the card.
pub struct PostCard {
    store: Arc<InteractionStore>,
    post_id: Uuid,
    display: DisplayConfig,
    image_errors: ImageErrorSet,
}

impl PostCard {
    pub fn mount(store: Arc<InteractionStore>, post_id: Uuid, display: DisplayConfig) -> Self {
        Self {
            store,
            post_id,
            display,
            image_errors: ImageErrorSet::default(),
        }
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    pub fn image_errors(&self) -> &ImageErrorSet {
        &self.image_errors
    }

    /// Hide `image` for the rest of this card's life.
    pub fn image_failed(&mut self, image: &str) {
        if self.image_errors.mark_failed(image) {
            tracing::debug!(post_id = %self.post_id, image, "Image failed to load, hidden");
        }
    }

    pub fn click(&self, control: Control) -> Option<CardEvent> {
        match control {
            Control::Like => self.store.like_post(self.post_id).map(CardEvent::Engagement),
            Control::Bookmark => self
                .store
                .bookmark_post(self.post_id)
                .map(CardEvent::Engagement),
            Control::Comment => Some(CardEvent::OpenComments(self.post_id)),
            Control::Share => Some(CardEvent::Share(self.post_id)),
        }
    }

    /// `None` once the post has left the store.
    pub fn render(&self) -> Option<PostCardView> {
        self.render_at(Utc::now())
    }

    pub fn render_at(&self, now: DateTime<Utc>) -> Option<PostCardView> {
        let post = self.store.get_post(self.post_id)?;
        Some(self.view_of(post, now))
    }

    fn view_of(&self, post: Post, now: DateTime<Utc>) -> PostCardView {
        let author = AuthorView {
            display_name: post.author.display_name(),
            handle: post.author.handle(),
            profile_path: post.author.profile_path(),
            avatar: post.author.avatar.clone(),
            is_verified: post.author.is_verified,
        };

        let tags = post
            .tags
            .iter()
            .map(|tag| TagLink {
                label: format!("#{}", tag),
                href: format!("/search?q=%23{}", tag),
            })
            .collect();

        PostCardView {
            post_id: post.id,
            author,
            time_ago: relative_time_at(post.created_at, now, &self.display),
            published_at: post.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            location: post.location.map(|l| l.name),
            tags,
            images: self.image_grid(&post.images),
            like: ToggleControl {
                active: post.is_liked,
                label: compact_count(post.likes),
            },
            comments: compact_count(post.comments),
            shares: compact_count(post.shares),
            bookmarked: post.is_bookmarked,
            content: post.content,
        }
    }

    /// Layout follows the full image list; failed images leave the grid.
    fn image_grid(&self, images: &[String]) -> Option<ImageGrid> {
        if images.is_empty() {
            return None;
        }

        let columns = if images.len() == 1 { 1 } else { 2 };
        let tiles = images
            .iter()
            .enumerate()
            .filter(|(_, src)| !self.image_errors.has_failed(src))
            .map(|(index, src)| ImageTile {
                src: src.clone(),
                alt: format!("Post image {}", index + 1),
                tall: images.len() == 3 && index == 0,
            })
            .collect();

        Some(ImageGrid { columns, tiles })
    }
}
