//! Donation form and like button flows.
//!
//! These model the site's browser-side behaviour: browser storage is a
//! [`KeyValueStore`], the card SDK is a [`CardConfirmer`], and the state a
//! page would render is published on `tokio::sync::watch` channels.

mod api;
mod config;
mod confirm;
mod donation_form;
mod error;
mod handoff;
mod likes;
mod mailbox;
mod optimistic;
mod storage;

pub use api::*;
pub use config::*;
pub use confirm::*;
pub use donation_form::*;
pub use error::*;
pub use handoff::*;
pub use likes::*;
pub use mailbox::*;
pub use optimistic::*;
pub use storage::*;
