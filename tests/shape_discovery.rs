//! End-to-end shape tolerance: feeds and rosters in every envelope and
//! field-spelling the upstream has been seen to produce still normalize into
//! usable views.

use async_trait::async_trait;
use classfeed::classroom::error::ApiError;
use classfeed::classroom::ClassroomApi;
use classfeed::engine::feed::FeedEngine;
use classfeed::members::MemberDirectory;
use classfeed::shape;
use classfeed::storage::MemoryStore;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves a fixed response body for every feed fetch.
struct ShapeApi {
    feed: Mutex<Value>,
}

impl ShapeApi {
    fn new(feed: Value) -> Arc<Self> {
        Arc::new(Self {
            feed: Mutex::new(feed),
        })
    }
}

#[async_trait]
impl ClassroomApi for ShapeApi {
    async fn fetch_feed(&self) -> Result<Value, ApiError> {
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn fetch_profile(&self) -> Result<Value, ApiError> {
        Ok(json!({"data": {"id": 9, "name": "Me"}}))
    }

    async fn post_status(&self, _text: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn post_comment(&self, _post_id: &str, _text: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn like(&self, _post_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn unlike(&self, _post_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn fetch_members(&self, _year: Option<u16>) -> Result<Vec<Value>, ApiError> {
        Ok(Vec::new())
    }
}

fn engine_for(api: Arc<ShapeApi>) -> FeedEngine {
    FeedEngine::new(api, Box::new(MemoryStore::new()), Duration::ZERO)
}

#[tokio::test]
async fn test_feed_in_nested_envelope_with_renamed_fields() {
    let api = ShapeApi::new(json!({
        "data": {
            "items": [
                {
                    "_id": "a1",
                    "message": "renamed everything",
                    "likeCount": 2,
                    "replies": [{"content": "first!", "user": {"name": "Grace"}}],
                    "createdBy": {"name": "Ada"}
                },
                {
                    "status": {"_id": "a2"},
                    "content": "id hides under status",
                    "likes": [1, 2, 3, 4]
                }
            ]
        }
    }));
    let mut engine = engine_for(api);
    engine.load_feed().await.unwrap();

    let items = engine.items();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].id, "a1");
    assert_eq!(items[0].author, "Ada");
    assert_eq!(items[0].body, "renamed everything");
    assert_eq!(items[0].like_count, 2);
    assert_eq!(items[0].comments.len(), 1);
    assert_eq!(items[0].comments[0].author, "Grace");

    assert_eq!(items[1].id, "a2");
    assert_eq!(items[1].like_count, 4);

    // the deeply-resolved id is usable for interactions
    engine.toggle_like("a2").await.unwrap();
    assert!(engine.items()[1].liked_by_me);
}

#[tokio::test]
async fn test_own_posts_attributed_via_profile_id() {
    let api = ShapeApi::new(json!([
        {"id": "p1", "text": "mine", "userId": "9"},
        {"id": "p2", "text": "theirs", "userId": "12", "authorName": "Somchai"}
    ]));
    let mut engine = engine_for(api.clone());
    let profile = api.fetch_profile().await.unwrap();
    engine.set_profile(profile);
    engine.load_feed().await.unwrap();

    assert_eq!(engine.items()[0].author, "Me");
    assert_eq!(engine.items()[1].author, "Somchai");
}

#[tokio::test]
async fn test_unrecognizable_feed_degrades_to_empty() {
    let api = ShapeApi::new(json!({"message": "maintenance window"}));
    let mut engine = engine_for(api);
    engine.load_feed().await.unwrap();
    assert!(engine.items().is_empty());
}

#[test]
fn test_roster_with_mixed_year_spellings() {
    let records = vec![
        json!({"name": "Ada", "studentId": "640001", "year": 2023}),
        json!({"fullname": "Grace", "stdId": "630002", "year": "2022"}),
        json!({"displayName": "Lin", "sid": "640003", "profile": {"year": 2023}}),
        json!({"username": "noyear", "id": 77}),
    ];
    let directory = MemberDirectory::from_records(records);

    assert_eq!(directory.year_key(), Some("year"));
    assert!(directory
        .candidates()
        .contains(&"profile.year".to_string()));

    let class_2023 = directory.filtered(2023);
    assert_eq!(class_2023.len(), 1);
    assert_eq!(class_2023[0].name, "Ada");
    assert_eq!(class_2023[0].student_id, "640001");

    assert_eq!(directory.existing_years(), vec![2023, 2022]);
}

#[test]
fn test_roster_without_years_shows_everyone() {
    let records = vec![
        json!({"name": "A", "id": 1}),
        json!({"name": "B", "id": 2}),
        json!({"name": "C", "id": 3}),
    ];
    let directory = MemberDirectory::from_records(records);
    assert_eq!(directory.year_key(), None);
    assert_eq!(directory.filtered(2023).len(), 3);
}

#[test]
fn test_extract_list_handles_roster_envelopes() {
    for key in ["class", "classes", "members", "students"] {
        let data = json!({ key: [{"name": "A"}] });
        assert_eq!(shape::extract_list(&data).len(), 1, "envelope {key}");
    }
}
