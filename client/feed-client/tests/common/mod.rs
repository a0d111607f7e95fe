#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use feed_client::{Author, Post};
use uuid::Uuid;

pub fn author(username: &str) -> Author {
    Author {
        id: Uuid::new_v4(),
        username: username.to_string(),
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
        avatar: None,
        is_verified: false,
    }
}

pub fn post_with(likes: u64, is_liked: bool, is_bookmarked: bool) -> Post {
    Post {
        id: Uuid::new_v4(),
        author: author("feeder"),
        content: "fixture".to_string(),
        tags: vec!["fixture".to_string()],
        images: vec![],
        location: None,
        created_at: hours_ago(2),
        likes,
        comments: 7,
        shares: 3,
        is_liked,
        is_bookmarked,
    }
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}
