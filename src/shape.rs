//! Best-effort probing of loosely-structured API responses.
//!
//! The upstream service is unversioned and renames fields between
//! deployments, so nothing here fails: every probe degrades to an empty
//! list, a sentinel, or `None`.

use serde_json::Value;

/// Shown when no author field can be resolved from a post.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Shown when no author field can be resolved from a comment.
pub const ANON_AUTHOR: &str = "anon";

/// Keys that may hold a post's comment list, tried in order.
pub const COMMENT_KEYS: [&str; 5] = ["comments", "comment", "commentList", "replies", "replyList"];

/// Keys that may hold a post or comment body, tried in order.
pub const BODY_KEYS: [&str; 4] = ["text", "content", "message", "status"];

const LIST_KEYS: [&str; 10] = [
    "data", "items", "result", "rows", "records", "list", "class", "classes", "members", "students",
];

const NAME_KEYS: [&str; 10] = [
    "name",
    "fullName",
    "fullname",
    "displayName",
    "authorName",
    "ownerName",
    "username",
    "nickName",
    "email",
    "mail",
];

const NAME_PATTERNS: [&str; 7] = ["name", "full", "display", "author", "owner", "user", "email"];

const MAX_SCAN_DEPTH: usize = 8;

/// Some deployments nest the useful object one level down under `data`.
pub fn unwrap_data(value: &Value) -> &Value {
    match value.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}

/// Render a string or number value as an opaque id.
fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Probe the id a post must be keyed by for any interaction.
pub fn resolve_post_id(post: &Value) -> Option<String> {
    for key in ["statusId", "id", "_id"] {
        if let Some(id) = post.get(key).and_then(value_as_id) {
            return Some(id);
        }
    }
    let status = post.get("status")?;
    for key in ["id", "_id"] {
        if let Some(id) = status.get(key).and_then(value_as_id) {
            return Some(id);
        }
    }
    None
}

fn non_blank(value: &Value) -> Option<&str> {
    let s = value.as_str()?;
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// First non-blank string under any of `keys`, in order.
pub fn first_string<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| record.get(k).and_then(non_blank))
}

/// Recursive scan for a name-like string field: exact preferred keys first
/// (case-insensitive), then any key matching a name-ish pattern, then one
/// level deeper. Depth-capped; serde_json values are acyclic.
pub fn deep_find_name(value: &Value) -> Option<String> {
    deep_find_name_at(value, 0)
}

fn deep_find_name_at(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_SCAN_DEPTH {
        return None;
    }
    let obj = value.as_object()?;

    for preferred in NAME_KEYS {
        for (key, v) in obj {
            if key.eq_ignore_ascii_case(preferred) {
                if let Some(s) = non_blank(v) {
                    return Some(s.to_string());
                }
            }
        }
    }

    for (key, v) in obj {
        let lower = key.to_ascii_lowercase();
        if NAME_PATTERNS.iter().any(|p| lower.contains(p)) {
            if let Some(s) = non_blank(v) {
                return Some(s.to_string());
            }
        }
    }

    for v in obj.values() {
        if v.is_object() {
            if let Some(found) = deep_find_name_at(v, depth + 1) {
                return Some(found);
            }
        }
    }
    None
}

fn id_of(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| record.get(k).and_then(value_as_id))
}

/// Resolve a post's author display name: direct probes, then "this is my own
/// post" via the signed-in profile, then the deep scan, then the sentinel.
pub fn resolve_author(post: &Value, me: Option<&Value>) -> String {
    let nested = ["author", "owner", "user", "createdBy"]
        .iter()
        .find_map(|k| post.get(k).and_then(|v| v.get("name")).and_then(non_blank));
    if let Some(name) = nested {
        return name.to_string();
    }
    if let Some(name) = first_string(
        post,
        &["authorName", "ownerName", "username", "displayName", "email"],
    ) {
        return name.to_string();
    }

    if let Some(me) = me {
        let me_id = id_of(me, &["id", "_id", "userId"]);
        let owner_id = id_of(post, &["userId", "ownerId", "authorId", "createdById"]).or_else(|| {
            ["user", "owner", "author"]
                .iter()
                .find_map(|k| post.get(k).and_then(|v| v.get("id")).and_then(value_as_id))
        });
        if let (Some(mine), Some(owner)) = (me_id, owner_id) {
            if mine == owner {
                return first_string(me, &["name", "fullname", "displayName", "email"])
                    .unwrap_or("me")
                    .to_string();
            }
        }
    }

    deep_find_name(post).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

/// Probe a comment's author: direct keys first, then the deep scan.
pub fn resolve_comment_author(comment: &Value) -> String {
    let nested = ["author", "user"]
        .iter()
        .find_map(|k| comment.get(k).and_then(|v| v.get("name")).and_then(non_blank));
    if let Some(name) = nested {
        return name.to_string();
    }
    if let Some(name) = first_string(comment, &["username"]) {
        return name.to_string();
    }
    deep_find_name(comment).unwrap_or_else(|| ANON_AUTHOR.to_string())
}

/// First comment array found under the known alternate keys.
pub fn read_comments(post: &Value) -> &[Value] {
    for key in COMMENT_KEYS {
        if let Some(Value::Array(list)) = post.get(key) {
            return list;
        }
    }
    &[]
}

/// Like count: `likes` as an array counts its elements, as a number it is the
/// count itself; then the spelled-out variants. Negative numbers clamp to 0.
pub fn read_like_count(post: &Value) -> u32 {
    match post.get("likes") {
        Some(Value::Array(list)) => return list.len() as u32,
        Some(Value::Number(n)) => return n.as_i64().unwrap_or(0).max(0) as u32,
        _ => {}
    }
    for key in ["likeCount", "like_count", "likesCount"] {
        if let Some(n) = post.get(key).and_then(Value::as_i64) {
            return n.max(0) as u32;
        }
    }
    0
}

pub fn read_liked_flag(post: &Value) -> bool {
    ["liked", "likedByMe", "isLiked"]
        .iter()
        .find_map(|k| post.get(k).and_then(Value::as_bool))
        .unwrap_or(false)
}

/// Pull the record list out of whatever envelope the server wrapped it in.
///
/// Order: a bare array; the fixed candidate keys; the same candidates one
/// level down under `data`; finally a shallow scan that picks the array with
/// the most object elements. Anything else yields an empty list.
pub fn extract_list(data: &Value) -> Vec<Value> {
    if let Value::Array(list) = data {
        return list.clone();
    }
    let Some(obj) = data.as_object() else {
        return Vec::new();
    };

    for key in LIST_KEYS {
        if let Some(Value::Array(list)) = obj.get(key) {
            return list.clone();
        }
    }

    if let Some(deep) = obj.get("data") {
        if let Value::Array(list) = deep {
            return list.clone();
        }
        if let Some(deep_obj) = deep.as_object() {
            for key in ["items", "result", "rows", "records", "list"] {
                if let Some(Value::Array(list)) = deep_obj.get(key) {
                    return list.clone();
                }
            }
        }
    }

    let mut arrays: Vec<&Vec<Value>> = Vec::new();
    collect_arrays(data, 0, &mut arrays);
    arrays.sort_by_key(|a| std::cmp::Reverse(a.iter().filter(|v| v.is_object()).count()));
    arrays.first().map(|a| (*a).clone()).unwrap_or_default()
}

fn collect_arrays<'a>(value: &'a Value, depth: usize, out: &mut Vec<&'a Vec<Value>>) {
    if depth > 2 {
        return;
    }
    if let Some(obj) = value.as_object() {
        for v in obj.values() {
            match v {
                Value::Array(list) => out.push(list),
                Value::Object(_) => collect_arrays(v, depth + 1, out),
                _ => {}
            }
        }
    }
}
