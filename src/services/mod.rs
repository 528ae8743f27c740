//! Typed wrappers over the backend endpoints, one module per domain. Each
//! module adds methods to [`crate::client::ApiClient`].

pub mod auth;
pub mod clubs;
pub mod courts;
pub mod invitations;
pub mod matches;
pub mod notifications;
pub mod players;
pub mod pregame_turns;
