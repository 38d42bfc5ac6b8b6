use crate::shape;
use serde_json::Value;

/// Prefix marking a locally-generated comment id awaiting server confirmation.
pub const TEMP_COMMENT_PREFIX: &str = "tmp-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    /// True until an authoritative refresh replaces or drops this comment.
    pub pending: bool,
}

/// A feed post normalized out of whatever shape the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Opaque server id. Empty when no id field could be resolved; such a
    /// post is displayed but rejects every interaction.
    pub id: String,
    pub author: String,
    pub body: String,
    pub like_count: u32,
    pub liked_by_me: bool,
    pub comments: Vec<Comment>,
}

/// Normalize one raw post record. `me` is the signed-in profile, used to
/// attribute the user's own posts when the record only carries an owner id.
pub fn normalize_post(raw: &Value, me: Option<&Value>) -> Post {
    let comments = shape::read_comments(raw)
        .iter()
        .enumerate()
        .map(|(i, c)| normalize_comment(c, i))
        .collect();

    Post {
        id: shape::resolve_post_id(raw).unwrap_or_default(),
        author: shape::resolve_author(raw, me),
        body: shape::first_string(raw, &shape::BODY_KEYS)
            .unwrap_or_default()
            .to_string(),
        like_count: shape::read_like_count(raw),
        liked_by_me: shape::read_liked_flag(raw),
        comments,
    }
}

fn normalize_comment(raw: &Value, index: usize) -> Comment {
    let id = ["id", "_id", "commentId"]
        .iter()
        .find_map(|k| match raw.get(k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| index.to_string());

    Comment {
        id,
        author: shape::resolve_comment_author(raw),
        body: shape::first_string(raw, &["text", "content", "message"])
            .unwrap_or_default()
            .to_string(),
        pending: false,
    }
}

/// The pure like-toggle transition: flip to `next_liked`, moving the count by
/// one only when the flag actually changes, never below zero.
pub fn apply_like_toggle(post: &Post, next_liked: bool) -> Post {
    let mut next = post.clone();
    if next_liked && !post.liked_by_me {
        next.like_count = post.like_count.saturating_add(1);
    }
    if !next_liked && post.liked_by_me {
        next.like_count = post.like_count.saturating_sub(1);
    }
    next.liked_by_me = next_liked;
    next
}
