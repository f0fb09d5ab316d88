//! spoty - a command-line client for a music catalog service
//!
//! Logs in with OAuth2 Authorization Code + PKCE, browses the catalog and the
//! saved-album library, and keeps a device-local library of custom albums.

pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod storage;
pub mod stores;
