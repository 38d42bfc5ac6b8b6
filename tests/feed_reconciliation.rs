//! Scenario tests for the feed reconciliation engine: optimistic apply,
//! exact rollback, overlay floors, and pending-comment confirmation, driven
//! against a scripted in-memory classroom API.

use async_trait::async_trait;
use classfeed::classroom::error::ApiError;
use classfeed::classroom::ClassroomApi;
use classfeed::engine::feed::{FeedEngine, FeedError};
use classfeed::storage::{FileStore, MemoryStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeApi {
    feed: Mutex<Value>,
    fail_feed: AtomicBool,
    fail_like: AtomicBool,
    fail_unlike: AtomicBool,
    fail_comment: AtomicBool,
    fail_status: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn with_feed(feed: Value) -> Arc<Self> {
        Arc::new(Self {
            feed: Mutex::new(feed),
            ..Default::default()
        })
    }

    fn set_feed(&self, feed: Value) {
        *self.feed.lock().unwrap() = feed;
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn server_error() -> ApiError {
        ApiError::Http {
            status: 500,
            body: "boom".to_string(),
        }
    }
}

#[async_trait]
impl ClassroomApi for FakeApi {
    async fn fetch_feed(&self) -> Result<Value, ApiError> {
        self.record("fetch_feed");
        if self.fail_feed.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn fetch_profile(&self) -> Result<Value, ApiError> {
        self.record("fetch_profile");
        Ok(json!({"id": "me-1", "name": "Me"}))
    }

    async fn post_status(&self, text: &str) -> Result<(), ApiError> {
        self.record("post_status");
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        let mut feed = self.feed.lock().unwrap();
        if let Some(list) = feed.as_array_mut() {
            list.push(json!({
                "id": format!("p{}", list.len() + 1),
                "text": text,
                "author": {"name": "Me"},
                "likes": 0,
            }));
        }
        Ok(())
    }

    async fn post_comment(&self, post_id: &str, text: &str) -> Result<(), ApiError> {
        self.record("post_comment");
        if self.fail_comment.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        let mut feed = self.feed.lock().unwrap();
        if let Some(list) = feed.as_array_mut() {
            for post in list.iter_mut() {
                if post.get("id").and_then(Value::as_str) == Some(post_id) {
                    let comments = post
                        .as_object_mut()
                        .unwrap()
                        .entry("comments")
                        .or_insert_with(|| json!([]));
                    if let Some(arr) = comments.as_array_mut() {
                        arr.push(json!({
                            "id": format!("srv-{}", arr.len() + 1),
                            "text": text,
                            "author": {"name": "Me"},
                        }));
                    }
                }
            }
        }
        Ok(())
    }

    async fn like(&self, _post_id: &str) -> Result<(), ApiError> {
        self.record("like");
        if self.fail_like.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn unlike(&self, _post_id: &str) -> Result<(), ApiError> {
        self.record("unlike");
        if self.fail_unlike.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn fetch_members(&self, _year: Option<u16>) -> Result<Vec<Value>, ApiError> {
        self.record("fetch_members");
        Ok(Vec::new())
    }
}

fn single_post_feed() -> Value {
    json!([{"id": "42", "text": "hello world", "likes": 3, "liked": false}])
}

fn engine_for(api: Arc<FakeApi>) -> FeedEngine {
    // zero reconcile delay keeps tests instant
    FeedEngine::new(api, Box::new(MemoryStore::new()), Duration::ZERO)
}

#[tokio::test]
async fn test_overlay_floor_survives_stale_reload() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();

    engine.toggle_like("42").await.unwrap();
    let post = &engine.items()[0];
    assert!(post.liked_by_me);
    assert_eq!(post.like_count, 4);
    assert!(engine.overlay().is_liked("42"));
    assert_eq!(engine.overlay().min_count("42"), Some(4));

    // the server is eventually consistent and reports a lower count
    api.set_feed(json!([{"id": "42", "text": "hello world", "likes": 1, "liked": false}]));
    engine.load_feed().await.unwrap();

    let post = &engine.items()[0];
    assert!(post.liked_by_me, "local like must not regress");
    assert_eq!(post.like_count, 4, "count must not drop below the floor");
}

#[tokio::test]
async fn test_double_toggle_restores_original_state() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();
    let original = engine.items()[0].clone();

    engine.toggle_like("42").await.unwrap();
    engine.toggle_like("42").await.unwrap();

    assert_eq!(engine.items()[0], original);
    assert!(!engine.overlay().is_liked("42"));
    assert_eq!(engine.overlay().min_count("42"), None);

    let calls = api.calls();
    assert!(calls.contains(&"like".to_string()));
    assert!(calls.contains(&"unlike".to_string()));
}

#[tokio::test]
async fn test_failed_like_rolls_back_exactly() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();

    let items_before = engine.items().to_vec();
    let overlay_before = engine.overlay().clone();

    api.fail_like.store(true, Ordering::SeqCst);
    let err = engine.toggle_like("42").await.unwrap_err();
    assert!(matches!(err, FeedError::Remote(_)));

    assert_eq!(engine.items(), items_before.as_slice());
    assert_eq!(engine.overlay(), &overlay_before);
}

#[tokio::test]
async fn test_failed_unlike_rolls_back_to_liked_state() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();
    engine.toggle_like("42").await.unwrap();

    let items_before = engine.items().to_vec();
    let overlay_before = engine.overlay().clone();
    assert!(items_before[0].liked_by_me);

    api.fail_unlike.store(true, Ordering::SeqCst);
    engine.toggle_like("42").await.unwrap_err();

    assert_eq!(engine.items(), items_before.as_slice());
    assert_eq!(engine.overlay(), &overlay_before);
}

#[tokio::test]
async fn test_toggle_rejects_unresolvable_ids() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();
    let calls_before = api.calls().len();

    let err = engine.toggle_like("no-such-post").await.unwrap_err();
    assert!(matches!(err, FeedError::MissingPostId));
    let err = engine.toggle_like("").await.unwrap_err();
    assert!(matches!(err, FeedError::MissingPostId));

    assert_eq!(api.calls().len(), calls_before, "no remote call was made");
    assert_eq!(engine.items()[0].like_count, 3);
}

#[tokio::test]
async fn test_blank_comment_rejected_before_any_call() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();
    let calls_before = api.calls().len();
    let items_before = engine.items().to_vec();

    for text in ["", "   ", "\t\n"] {
        let err = engine.add_comment("42", text).await.unwrap_err();
        assert!(matches!(err, FeedError::EmptyText));
    }

    assert_eq!(api.calls().len(), calls_before);
    assert_eq!(engine.items(), items_before.as_slice());
}

#[tokio::test]
async fn test_confirmed_comment_appears_exactly_once() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();

    engine.add_comment("42", "hello").await.unwrap();

    let post = &engine.items()[0];
    let matching: Vec<_> = post.comments.iter().filter(|c| c.body == "hello").collect();
    assert_eq!(matching.len(), 1, "optimistic copy must not survive the refresh");
    assert!(!matching[0].pending);
    assert!(!matching[0].id.starts_with("tmp-"));
}

#[tokio::test]
async fn test_pending_comment_visible_until_a_refresh_succeeds() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();

    // the comment lands but the reconciling refresh fails
    api.fail_feed.store(true, Ordering::SeqCst);
    engine.add_comment("42", "hello").await.unwrap();

    let comment = engine.items()[0].comments.last().unwrap().clone();
    assert!(comment.pending);
    assert!(comment.id.starts_with("tmp-"));
    assert_eq!(comment.body, "hello");
    assert!(engine.last_sync_error().is_some());

    // the next successful refresh swaps in the server's copy
    api.fail_feed.store(false, Ordering::SeqCst);
    engine.load_feed().await.unwrap();
    let post = &engine.items()[0];
    let matching: Vec<_> = post.comments.iter().filter(|c| c.body == "hello").collect();
    assert_eq!(matching.len(), 1);
    assert!(!matching[0].pending);
    assert!(engine.last_sync_error().is_none());
}

#[tokio::test]
async fn test_failed_comment_is_dropped_by_refresh() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();

    api.fail_comment.store(true, Ordering::SeqCst);
    let err = engine.add_comment("42", "lost").await.unwrap_err();
    assert!(matches!(err, FeedError::Remote(_)));

    // the refresh already ran and the server never saw the comment
    assert!(engine.items()[0].comments.is_empty());
}

#[tokio::test]
async fn test_load_failure_leaves_items_untouched() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();
    let items_before = engine.items().to_vec();

    api.fail_feed.store(true, Ordering::SeqCst);
    let err = engine.load_feed().await.unwrap_err();
    assert!(matches!(err, FeedError::Remote(_)));
    assert_eq!(engine.items(), items_before.as_slice());
    assert!(engine.last_sync_error().is_some());

    api.fail_feed.store(false, Ordering::SeqCst);
    engine.load_feed().await.unwrap();
    assert!(engine.last_sync_error().is_none());
}

#[tokio::test]
async fn test_load_feed_is_idempotent() {
    let api = FakeApi::with_feed(json!([
        {"id": "42", "text": "a", "likes": 3},
        {"id": "43", "message": "b", "likeCount": 1, "replies": [{"text": "r"}]},
    ]));
    let mut engine = engine_for(api.clone());

    engine.load_feed().await.unwrap();
    let first = engine.items().to_vec();
    engine.load_feed().await.unwrap();
    assert_eq!(engine.items(), first.as_slice());
}

#[tokio::test]
async fn test_post_status_refreshes_feed() {
    let api = FakeApi::with_feed(single_post_feed());
    let mut engine = engine_for(api.clone());
    engine.load_feed().await.unwrap();

    let err = engine.post_status("  ").await.unwrap_err();
    assert!(matches!(err, FeedError::EmptyText));

    engine.post_status("a new day").await.unwrap();
    assert!(engine.items().iter().any(|p| p.body == "a new day"));

    api.fail_status.store(true, Ordering::SeqCst);
    let err = engine.post_status("never lands").await.unwrap_err();
    assert!(matches!(err, FeedError::Remote(_)));
    assert!(!engine.items().iter().any(|p| p.body == "never lands"));
}

#[tokio::test]
async fn test_overlay_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let api = FakeApi::with_feed(single_post_feed());

    {
        let store = Box::new(FileStore::open(&path));
        let mut engine = FeedEngine::new(api.clone(), store, Duration::ZERO);
        engine.load_feed().await.unwrap();
        engine.toggle_like("42").await.unwrap();
    }

    // a fresh engine over the same file sees the like immediately
    let store = Box::new(FileStore::open(&path));
    let mut engine = FeedEngine::new(api, store, Duration::ZERO);
    engine.load_feed().await.unwrap();
    let post = &engine.items()[0];
    assert!(post.liked_by_me);
    assert_eq!(post.like_count, 4);
}
