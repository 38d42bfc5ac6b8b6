use crate::engine::post::Post;
use crate::storage::KeyValueStore;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Storage key for the set of post ids the user has locally marked liked.
pub const LIKED_IDS_KEY: &str = "liked_status_ids";

/// Storage key for the per-post display floor on like counts.
pub const LIKE_OVERRIDES_KEY: &str = "like_count_overrides";

/// Durable patch applied on top of authoritative feed data so a user's own
/// like never visibly regresses while server counters catch up.
///
/// Entries are written before each like/unlike call resolves and are never
/// expired; the set only grows with distinct posts ever liked on this device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeOverlay {
    liked: BTreeSet<String>,
    min_shown: BTreeMap<String, u32>,
}

/// Saved per-id state, used to roll a failed toggle back exactly.
pub type OverlayEntry = (bool, Option<u32>);

impl LikeOverlay {
    /// Read both blobs from the store. Corrupt or missing values read as
    /// empty, and floors for ids not in the liked set are discarded.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let liked: BTreeSet<String> = store
            .get(LIKED_IDS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        let mut min_shown: BTreeMap<String, u32> = store
            .get(LIKE_OVERRIDES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        min_shown.retain(|id, _| liked.contains(id));
        Self { liked, min_shown }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        let liked: Vec<&String> = self.liked.iter().collect();
        store.set(LIKED_IDS_KEY, &serde_json::to_string(&liked)?)?;
        store.set(LIKE_OVERRIDES_KEY, &serde_json::to_string(&self.min_shown)?)?;
        Ok(())
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }

    pub fn min_count(&self, id: &str) -> Option<u32> {
        if self.liked.contains(id) {
            self.min_shown.get(id).copied()
        } else {
            None
        }
    }

    /// Mark a post liked and raise its display floor to the count the user
    /// is currently being shown.
    pub fn mark_liked(&mut self, id: &str, shown_count: u32) {
        self.liked.insert(id.to_string());
        let floor = self.min_shown.entry(id.to_string()).or_insert(0);
        *floor = (*floor).max(shown_count);
    }

    /// Drop both entries for a post (the unlike path).
    pub fn clear(&mut self, id: &str) {
        self.liked.remove(id);
        self.min_shown.remove(id);
    }

    pub fn snapshot(&self, id: &str) -> OverlayEntry {
        (self.liked.contains(id), self.min_shown.get(id).copied())
    }

    pub fn restore(&mut self, id: &str, entry: OverlayEntry) {
        let (was_liked, floor) = entry;
        if was_liked {
            self.liked.insert(id.to_string());
        } else {
            self.liked.remove(id);
        }
        match floor {
            Some(v) => {
                self.min_shown.insert(id.to_string(), v);
            }
            None => {
                self.min_shown.remove(id);
            }
        }
    }

    /// Patch one freshly-normalized post: a locally-liked id is forced liked
    /// and its count never drops below the recorded floor.
    pub fn apply(&self, post: &mut Post) {
        if post.id.is_empty() || !self.liked.contains(&post.id) {
            return;
        }
        post.liked_by_me = true;
        if let Some(floor) = self.min_shown.get(&post.id) {
            post.like_count = post.like_count.max(*floor);
        }
    }
}
