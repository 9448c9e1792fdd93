//! Blog API endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{BlogPost, CreateBlogPostRequest, LikeResponse};
use crate::AppState;

/// GET /api/blog - List all posts.
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Vec<BlogPost>> {
    success(state.repo.list_posts().await?)
}

/// GET /api/blog/:id - Get a single post.
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BlogPost> {
    match state.repo.get_post(&id).await? {
        Some(post) => success(post),
        None => Err(AppError::NotFound(format!("Blog post {} not found", id))),
    }
}

/// POST /api/admin/blog - Create a new post.
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreateBlogPostRequest>,
) -> ApiResult<BlogPost> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }

    success(state.repo.create_post(&request).await?)
}

/// POST /api/blog/:id/like - Toggle the caller's like on a post.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<LikeResponse>, AppError> {
    let liker = liker_identity(&headers, peer);
    let toggle = state.repo.toggle_like(&id, &liker).await?;

    tracing::debug!(
        "Like on {} {} (now {})",
        id,
        if toggle.added { "added" } else { "removed" },
        toggle.likes
    );

    Ok(Json(if toggle.added {
        LikeResponse::added(toggle.likes)
    } else {
        LikeResponse::removed(toggle.likes)
    }))
}

/// Identify a visitor by the first `X-Forwarded-For` hop, else the peer IP.
fn liker_identity(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}
