use crate::error::ClientResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author profile attached to a post (read-only for this client)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl Author {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn handle(&self) -> String {
        format!("@{}", self.username)
    }

    pub fn profile_path(&self) -> String {
        format!("/users/{}", self.username)
    }
}

/// Named place a post was published from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
}

/// Post entity with the viewer's engagement state
///
/// `likes`, `comments` and `shares` are public tallies; `is_liked` and
/// `is_bookmarked` are the viewer's personal flags. Only the interaction
/// store changes `likes`, `is_liked` and `is_bookmarked`.
///
/// `==` compares whole snapshots, field by field. Two snapshots of the same
/// post with different counts are not equal; use [`Post::same_post`] for
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author: Author,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub is_liked: bool,
    pub is_bookmarked: bool,
}

/// Like half of the per-post state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

/// Bookmark half of the per-post state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkState {
    Bookmarked,
    Unbookmarked,
}

impl LikeState {
    pub fn toggled(self) -> Self {
        match self {
            LikeState::Liked => LikeState::Unliked,
            LikeState::Unliked => LikeState::Liked,
        }
    }
}

impl BookmarkState {
    pub fn toggled(self) -> Self {
        match self {
            BookmarkState::Bookmarked => BookmarkState::Unbookmarked,
            BookmarkState::Unbookmarked => BookmarkState::Bookmarked,
        }
    }
}

impl Post {
    /// Decode one page of posts as delivered by the feed API.
    pub fn parse_page(json: &str) -> ClientResult<Vec<Post>> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn like_state(&self) -> LikeState {
        if self.is_liked {
            LikeState::Liked
        } else {
            LikeState::Unliked
        }
    }

    pub fn bookmark_state(&self) -> BookmarkState {
        if self.is_bookmarked {
            BookmarkState::Bookmarked
        } else {
            BookmarkState::Unbookmarked
        }
    }

    /// Identity comparison; snapshots of the same post compare equal here
    /// even when their engagement state differs.
    pub fn same_post(&self, other: &Post) -> bool {
        self.id == other.id
    }

    /// Flip the like flag and move the counter by one.
    ///
    /// Returns true when an unlike found the counter already at zero and it
    /// was held there instead of underflowing.
    pub(crate) fn toggle_like(&mut self) -> bool {
        match self.like_state().toggled() {
            LikeState::Liked => {
                self.is_liked = true;
                self.likes = self.likes.saturating_add(1);
                false
            }
            LikeState::Unliked => {
                self.is_liked = false;
                let clamped = self.likes == 0;
                self.likes = self.likes.saturating_sub(1);
                clamped
            }
        }
    }

    pub(crate) fn toggle_bookmark(&mut self) {
        self.is_bookmarked = self.bookmark_state().toggled() == BookmarkState::Bookmarked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(likes: u64, is_liked: bool) -> Post {
        Post {
            id: Uuid::new_v4(),
            author: Author {
                id: Uuid::new_v4(),
                username: "ada".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                avatar: None,
                is_verified: true,
            },
            content: "hello".to_string(),
            tags: vec![],
            images: vec![],
            location: None,
            created_at: Utc::now(),
            likes,
            comments: 2,
            shares: 1,
            is_liked,
            is_bookmarked: false,
        }
    }

    #[test]
    fn test_like_toggle_moves_counter_by_one() {
        let mut p = post(10, false);

        assert!(!p.toggle_like());
        assert_eq!((p.is_liked, p.likes), (true, 11));

        assert!(!p.toggle_like());
        assert_eq!((p.is_liked, p.likes), (false, 10));
    }

    #[test]
    fn test_unlike_at_zero_is_clamped() {
        // Inconsistent feed data: liked by the viewer but nobody counted.
        let mut p = post(0, true);

        assert!(p.toggle_like());
        assert_eq!((p.is_liked, p.likes), (false, 0));
    }

    #[test]
    fn test_bookmark_toggle_leaves_counters() {
        let mut p = post(5, true);
        p.toggle_bookmark();

        assert!(p.is_bookmarked);
        assert_eq!((p.likes, p.comments, p.shares), (5, 2, 1));
        assert_eq!(p.bookmark_state(), BookmarkState::Bookmarked);

        p.toggle_bookmark();
        assert_eq!(p.bookmark_state(), BookmarkState::Unbookmarked);
    }

    #[test]
    fn test_same_post_ignores_engagement() {
        let a = post(1, false);
        let mut b = a.clone();
        b.toggle_like();

        assert!(a.same_post(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_author_display_helpers() {
        let p = post(0, false);
        assert_eq!(p.author.display_name(), "Ada Lovelace");
        assert_eq!(p.author.handle(), "@ada");
        assert_eq!(p.author.profile_path(), "/users/ada");
    }

    #[test]
    fn test_parse_page_rejects_malformed_json() {
        assert!(matches!(
            Post::parse_page("[{\"id\": 1}]"),
            Err(crate::error::ClientError::Serialization(_))
        ));
        assert!(Post::parse_page("[]").unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_web_payload() {
        let payload = json!({
            "id": "6f1c2f2e-4b4a-4a53-9d51-0f0f8a1f5a11",
            "author": {
                "id": "0b7d4f1e-8a3b-4a43-8d2a-2d3f4c5b6a79",
                "username": "grace",
                "firstName": "Grace",
                "lastName": "Hopper",
                "isVerified": false
            },
            "content": "Compilers!",
            "createdAt": "2024-03-01T12:00:00Z",
            "likes": 42,
            "comments": 3,
            "shares": 0,
            "isLiked": true,
            "isBookmarked": false,
            "location": { "name": "Arlington" }
        });

        let post: Post = serde_json::from_value(payload).unwrap();
        assert_eq!(post.author.username, "grace");
        assert!(post.author.avatar.is_none());
        assert!(post.tags.is_empty());
        assert!(post.images.is_empty());
        assert_eq!(post.location.as_ref().map(|l| l.name.as_str()), Some("Arlington"));
        assert_eq!(post.like_state(), LikeState::Liked);
        assert_eq!(post.likes, 42);
    }
}
