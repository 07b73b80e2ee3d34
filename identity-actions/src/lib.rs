//! Webhook handlers for identity platform actions.
//!
//! Three actions are served:
//!
//! - `POST /passwordcheck` rejects password updates whose password appears in
//!   the Have I Been Pwned corpus, using [`pwned_range`]'s k-anonymity check.
//! - `POST /pre-issue-access-token` denies or shortens access tokens based on
//!   the caller's country and IP reputation.
//! - `POST /validate-user-profile-update` validates department changes and
//!   raises a security alert for sensitive attribute updates.
//!
//! Every endpoint answers with an [`response::ActionResponse`] whose
//! `actionStatus` is `SUCCESS`, `FAILED` or `ERROR`.

pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod profile;
pub mod reputation;
pub mod response;
pub mod server;
pub mod token;

pub use config::Args;
pub use error::Error;
pub use server::{AppState, create_router, serve, start_server};
