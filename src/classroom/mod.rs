pub mod auth;
pub mod error;
pub mod rest;

use async_trait::async_trait;
use error::ApiError;
use serde_json::Value;

/// The remote operations the feed engine and member directory consume.
/// Responses stay loosely typed; field discovery happens in `shape`.
#[async_trait]
pub trait ClassroomApi: Send + Sync {
    async fn fetch_feed(&self) -> Result<Value, ApiError>;
    async fn fetch_profile(&self) -> Result<Value, ApiError>;
    async fn post_status(&self, text: &str) -> Result<(), ApiError>;
    async fn post_comment(&self, post_id: &str, text: &str) -> Result<(), ApiError>;
    async fn like(&self, post_id: &str) -> Result<(), ApiError>;
    async fn unlike(&self, post_id: &str) -> Result<(), ApiError>;
    async fn fetch_members(&self, year: Option<u16>) -> Result<Vec<Value>, ApiError>;
}
