//! Client-side post interaction core for the Nova feed.
//!
//! The [`store::InteractionStore`] owns every loaded post for one session and
//! applies likes and bookmarks optimistically. Each applied toggle is published
//! as an [`engagement_events::InteractionIntent`] for the [`sync`] layer, which
//! persists it and, on failure, asks the store to roll it back.

pub mod config;
pub mod domain;
pub mod error;
pub mod formatting;
pub mod logging;
pub mod store;
pub mod sync;
pub mod view;

pub use config::Config;
pub use domain::models::{Author, BookmarkState, LikeState, Location, Post};
pub use error::{ClientError, ClientResult};
pub use store::InteractionStore;
pub use view::post_card::{CardEvent, Control, PostCard, PostCardView};
