//! Configuration Management Module
//!
//! Saved session profiles stored as JSON in the user's config directory.

pub mod storage;
pub mod types;

pub use storage::{config_dir, sessions_file, ConfigStorage, StorageError};
pub use types::{ConfigFile, SessionConfig, CONFIG_VERSION};
