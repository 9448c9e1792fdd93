//! Data models shared by the HTTP API and the client flows.
//!
//! Field names follow the JSON the site's front end exchanges with the API.

mod blog;
mod donation;

pub use blog::*;
pub use donation::*;
