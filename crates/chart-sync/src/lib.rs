//! chart-sync — maintenance tools for weekly playlist-chart snapshots.
//!
//! - `reconcile`: copy metadata between snapshots without overwriting present values.
//! - `enrich`: fill unresolved entries from a track metadata provider.
//! - `spotify`: provider implementations backed by the Spotify Web API.
//! - `audit`: report entries that still lack metadata.

pub mod audit;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod reconcile;
pub mod spotify;
pub mod store;
