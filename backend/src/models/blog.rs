//! Blog post and like models.

use serde::{Deserialize, Serialize};

/// A published blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub likes: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new blog post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// Response of `POST /api/blog/{id}/like`.
///
/// Exactly one of `added` / `removed` is set on success; `likes` is the
/// authoritative count after the toggle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeResponse {
    pub success: bool,
    #[serde(default)]
    pub likes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

impl LikeResponse {
    pub fn added(likes: i64) -> Self {
        Self {
            success: true,
            likes,
            added: Some(true),
            removed: None,
        }
    }

    pub fn removed(likes: i64) -> Self {
        Self {
            success: true,
            likes,
            added: None,
            removed: Some(true),
        }
    }
}
