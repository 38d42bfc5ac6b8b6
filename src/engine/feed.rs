use crate::classroom::error::ApiError;
use crate::classroom::ClassroomApi;
use crate::engine::overlay::LikeOverlay;
use crate::engine::post::{apply_like_toggle, normalize_post, Comment, Post, TEMP_COMMENT_PREFIX};
use crate::shape;
use crate::storage::KeyValueStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by feed operations. The two validation variants reject
/// before any mutation or network call.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("this post has no resolvable id")]
    MissingPostId,

    #[error("text is empty")]
    EmptyText,

    #[error(transparent)]
    Remote(#[from] ApiError),
}

/// Owns the rendered post list and reconciles it against the server.
///
/// Every user-triggered operation follows the same order: optimistic apply
/// (synchronous, before any await), remote attempt, then a delayed
/// reconciling refresh so eventually-consistent counters can catch up. The
/// durable overlay is re-applied on every load, which is what keeps the
/// user's own actions from visibly regressing.
pub struct FeedEngine {
    api: Arc<dyn ClassroomApi>,
    store: Box<dyn KeyValueStore>,
    overlay: LikeOverlay,
    items: Vec<Post>,
    me: Option<Value>,
    sync_delay: Duration,
    last_sync_error: Option<String>,
}

impl FeedEngine {
    pub fn new(
        api: Arc<dyn ClassroomApi>,
        store: Box<dyn KeyValueStore>,
        sync_delay: Duration,
    ) -> Self {
        let overlay = LikeOverlay::load(&*store);
        Self {
            api,
            store,
            overlay,
            items: Vec::new(),
            me: None,
            sync_delay,
            last_sync_error: None,
        }
    }

    /// The signed-in profile, used to attribute the user's own posts and
    /// optimistic comments. Accepts the raw profile response.
    pub fn set_profile(&mut self, profile: Value) {
        self.me = Some(shape::unwrap_data(&profile).clone());
    }

    pub fn items(&self) -> &[Post] {
        &self.items
    }

    pub fn overlay(&self) -> &LikeOverlay {
        &self.overlay
    }

    /// Error from the most recent reconciling refresh, if it failed. Cleared
    /// by the next successful load.
    pub fn last_sync_error(&self) -> Option<&str> {
        self.last_sync_error.as_deref()
    }

    pub fn me_display_name(&self) -> String {
        self.me
            .as_ref()
            .and_then(|me| shape::first_string(me, &["name", "fullname", "displayName", "email"]))
            .unwrap_or("me")
            .to_string()
    }

    /// Replace the rendered list with authoritative data patched by the
    /// overlay. Failure leaves the current list untouched.
    pub async fn load_feed(&mut self) -> Result<(), FeedError> {
        let raw = match self.api.fetch_feed().await {
            Ok(raw) => raw,
            Err(err) => {
                self.last_sync_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        let mut posts: Vec<Post> = shape::extract_list(&raw)
            .iter()
            .map(|record| normalize_post(record, self.me.as_ref()))
            .collect();
        for post in &mut posts {
            self.overlay.apply(post);
        }
        self.items = posts;
        self.last_sync_error = None;
        Ok(())
    }

    /// Flip the like state of one post: optimistic apply and overlay write
    /// first, then the remote call, with an exact rollback on failure. A
    /// reconciling refresh runs either way.
    pub async fn toggle_like(&mut self, post_id: &str) -> Result<(), FeedError> {
        let idx = self.find_post(post_id)?;
        let prev_post = self.items[idx].clone();
        let prev_entry = self.overlay.snapshot(post_id);

        let next_liked = !prev_post.liked_by_me;
        let next_post = apply_like_toggle(&prev_post, next_liked);
        let shown_count = next_post.like_count;
        self.items[idx] = next_post;

        if next_liked {
            self.overlay.mark_liked(post_id, shown_count);
        } else {
            self.overlay.clear(post_id);
        }
        self.persist_overlay();

        let result = if next_liked {
            self.api.like(post_id).await
        } else {
            self.api.unlike(post_id).await
        };

        if let Err(err) = result {
            if let Some(post) = self.items.iter_mut().find(|p| p.id == post_id) {
                *post = prev_post;
            }
            self.overlay.restore(post_id, prev_entry);
            self.persist_overlay();
            self.sync().await;
            return Err(err.into());
        }

        self.sync().await;
        Ok(())
    }

    /// Append an optimistic pending comment, send it, and let the refresh
    /// replace it with the server's copy (or drop it on failure). The
    /// temporary comment is never persisted durably.
    pub async fn add_comment(&mut self, post_id: &str, text: &str) -> Result<(), FeedError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FeedError::EmptyText);
        }
        let idx = self.find_post(post_id)?;

        let author = self.me_display_name();
        self.items[idx].comments.push(Comment {
            id: format!("{}{:08x}", TEMP_COMMENT_PREFIX, rand::random::<u32>()),
            author,
            body: text.to_string(),
            pending: true,
        });

        let result = self.api.post_comment(post_id, text).await;
        self.sync().await;
        result.map_err(FeedError::from)
    }

    /// Publish a new status. The front end keeps its compose buffer when
    /// this fails; on success the refresh brings the new post in.
    pub async fn post_status(&mut self, text: &str) -> Result<(), FeedError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FeedError::EmptyText);
        }
        self.api.post_status(text).await?;
        self.sync().await;
        Ok(())
    }

    fn find_post(&self, post_id: &str) -> Result<usize, FeedError> {
        if post_id.is_empty() {
            return Err(FeedError::MissingPostId);
        }
        self.items
            .iter()
            .position(|p| p.id == post_id)
            .ok_or(FeedError::MissingPostId)
    }

    fn persist_overlay(&mut self) {
        if let Err(err) = self.overlay.save(self.store.as_mut()) {
            tracing::warn!(%err, "failed to persist like overlay");
        }
    }

    /// Reconciling refresh: wait out the server's eventual consistency, then
    /// reload. A failure here never fails the operation that scheduled it;
    /// it is held in `last_sync_error` for the front end to surface.
    async fn sync(&mut self) {
        tokio::time::sleep(self.sync_delay).await;
        if let Err(err) = self.load_feed().await {
            tracing::warn!(%err, "reconciling refresh failed");
        }
    }
}
