//! Configuration module for spoty
//!
//! This module contains the user settings and path management.

mod paths;
mod user_config;

pub use paths::Paths;
pub use user_config::{UserConfig, ENV_PREFIX};
