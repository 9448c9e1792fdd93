//! Blog like button.
//!
//! A click flips the button and the counter at once, then the server's
//! answer settles both: its `likes` value replaces the local guess and
//! `added`/`removed` decides the button state. If the request fails the
//! pre-click pair is restored. The IDs of liked posts are remembered in
//! local storage under [`LIKED_POSTS_KEY`].

use std::collections::BTreeSet;

use thiserror::Error;
use tokio::sync::watch;

use super::{optimistic_update, ClientError, KeyValueStore, LikeClient};
use crate::models::LikeResponse;

/// Local storage key holding a JSON array of liked post IDs.
pub const LIKED_POSTS_KEY: &str = "likedPosts";

/// Post IDs this browser has liked.
pub struct LikedPostsCache<S> {
    store: S,
}

impl<S: KeyValueStore> LikedPostsCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<BTreeSet<String>, ClientError> {
        let Some(raw) = self.store.get(LIKED_POSTS_KEY)? else {
            return Ok(BTreeSet::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Resetting malformed {}: {}", LIKED_POSTS_KEY, e);
            BTreeSet::new()
        }))
    }

    fn save(&self, ids: &BTreeSet<String>) -> Result<(), ClientError> {
        let raw = serde_json::to_string(ids).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store.set(LIKED_POSTS_KEY, &raw)
    }

    pub fn contains(&self, post_id: &str) -> bool {
        match self.load() {
            Ok(ids) => ids.contains(post_id),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", LIKED_POSTS_KEY, e);
                false
            }
        }
    }

    pub fn set_liked(&self, post_id: &str, liked: bool) -> Result<(), ClientError> {
        let mut ids = self.load()?;
        let changed = if liked {
            ids.insert(post_id.to_string())
        } else {
            ids.remove(post_id)
        };
        if changed {
            self.save(&ids)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePhase {
    Idle,
    /// Optimistic state shown, request in flight.
    Liking,
    /// Server answered, local state being settled.
    Reconciling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeEvent {
    Click,
    Responded,
    Failed,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} while {from:?}")]
pub struct IllegalLikeTransition {
    pub from: LikePhase,
    pub event: LikeEvent,
}

pub fn like_transition(
    phase: LikePhase,
    event: LikeEvent,
) -> Result<LikePhase, IllegalLikeTransition> {
    match (phase, event) {
        (LikePhase::Idle, LikeEvent::Click) => Ok(LikePhase::Liking),
        (LikePhase::Liking, LikeEvent::Responded) => Ok(LikePhase::Reconciling),
        (LikePhase::Liking | LikePhase::Reconciling, LikeEvent::Failed) => Ok(LikePhase::Idle),
        (LikePhase::Reconciling, LikeEvent::Settled) => Ok(LikePhase::Idle),
        (from, event) => Err(IllegalLikeTransition { from, event }),
    }
}

/// Accessibility attributes of a rendered button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlAttrs {
    pub disabled: bool,
    pub aria_busy: bool,
    pub aria_pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeView {
    pub liked: bool,
    pub like_count: i64,
    pub phase: LikePhase,
}

impl LikeView {
    pub fn control(&self) -> ControlAttrs {
        let busy = self.phase != LikePhase::Idle;
        ControlAttrs {
            disabled: busy,
            aria_busy: busy,
            aria_pressed: self.liked,
        }
    }
}

/// Like button of one post.
pub struct LikeToggleController<C, S> {
    post_id: String,
    client: C,
    cache: LikedPostsCache<S>,
    view: watch::Sender<LikeView>,
}

impl<C, S> LikeToggleController<C, S>
where
    C: LikeClient,
    S: KeyValueStore,
{
    /// `like_count` is the count the page was rendered with; `liked` comes
    /// from the local cache.
    pub fn new(
        post_id: impl Into<String>,
        like_count: i64,
        client: C,
        cache: LikedPostsCache<S>,
    ) -> Self {
        let post_id = post_id.into();
        let liked = cache.contains(&post_id);
        let (view, _) = watch::channel(LikeView {
            liked,
            like_count,
            phase: LikePhase::Idle,
        });
        Self {
            post_id,
            client,
            cache,
            view,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn view(&self) -> LikeView {
        *self.view.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LikeView> {
        self.view.subscribe()
    }

    pub fn cache(&self) -> &LikedPostsCache<S> {
        &self.cache
    }

    fn step(&self, view: &mut LikeView, event: LikeEvent) {
        match like_transition(view.phase, event) {
            Ok(next) => view.phase = next,
            Err(e) => tracing::error!("Like button on {}: {}", self.post_id, e),
        }
    }

    /// Handle one click.
    pub async fn toggle(&self) -> Result<(), ClientError> {
        let mut prev = None;
        self.view.send_if_modified(|view| {
            match like_transition(view.phase, LikeEvent::Click) {
                Ok(next) => {
                    prev = Some((view.liked, view.like_count));
                    view.phase = next;
                    true
                }
                Err(_) => false,
            }
        });
        let Some((prev_liked, prev_count)) = prev else {
            return Err(ClientError::Busy);
        };

        let outcome = optimistic_update(
            || {
                self.view.send_modify(|view| {
                    view.liked = !prev_liked;
                    view.like_count = if view.liked {
                        prev_count + 1
                    } else {
                        (prev_count - 1).max(0)
                    };
                });
            },
            || {
                self.view.send_modify(|view| {
                    view.liked = prev_liked;
                    view.like_count = prev_count;
                });
            },
            || self.client.toggle_like(&self.post_id),
            |resp: LikeResponse| self.reconcile(resp),
        )
        .await;

        // Busy is cleared on every path.
        self.view.send_modify(|view| {
            let event = if outcome.is_ok() {
                LikeEvent::Settled
            } else {
                LikeEvent::Failed
            };
            self.step(view, event);
        });

        if let Err(e) = &outcome {
            tracing::warn!("Like on {} rolled back: {}", self.post_id, e);
        }
        outcome
    }

    fn reconcile(&self, resp: LikeResponse) -> Result<(), ClientError> {
        if !resp.success {
            return Err(ClientError::Server {
                status: 200,
                message: None,
            });
        }

        let optimistic = self.view.borrow().liked;
        let liked = match (resp.added, resp.removed) {
            (Some(true), _) => true,
            (_, Some(true)) => false,
            _ => optimistic,
        };
        self.cache.set_liked(&self.post_id, liked)?;

        self.view.send_modify(|view| {
            self.step(view, LikeEvent::Responded);
            view.liked = liked;
            view.like_count = resp.likes;
        });
        Ok(())
    }
}
