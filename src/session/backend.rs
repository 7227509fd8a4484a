//! Backend selection
//!
//! Listing, navigation checks and file content operations all go through one
//! [`RemoteBackend`], chosen once when the session is created and kept for its
//! whole life. The SFTP variant is exact; the shell variant scrapes command
//! output and is the fallback when the SFTP subsystem is unavailable.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entry::Entry;
use super::error::SessionError;

/// Which backend services a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sftp,
    Shell,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sftp => write!(f, "sftp"),
            BackendKind::Shell => write!(f, "shell"),
        }
    }
}

/// Configured backend choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// SFTP when the server offers it, shell otherwise
    #[default]
    Auto,
    /// Always scrape shell output, even if SFTP would work
    Shell,
}

/// Operations that differ between the structured and the text backend.
///
/// All paths are absolute and already resolved by the caller.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Entries of `dir`, unordered, without `.` and `..`
    async fn list(&self, dir: &str) -> Result<Vec<Entry>, SessionError>;

    /// Confirm `path` is an accessible directory and return the path to commit
    async fn probe_dir(&self, path: &str) -> Result<String, SessionError>;

    async fn read_file(&self, path: &str) -> Result<String, SessionError>;

    /// Replace the whole content of `path`, creating it if needed
    async fn write_file(&self, path: &str, text: &str) -> Result<(), SessionError>;

    /// Remove a file, or an empty directory
    async fn delete(&self, path: &str) -> Result<(), SessionError>;
}
