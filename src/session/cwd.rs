//! Working directory state
//!
//! The single source of truth for "where am I" on the remote host. Resolution
//! is pure string work; [`DirectoryState::commit`] is only called after a
//! backend has confirmed the target is a real directory.

use tracing::debug;

use crate::sftp::path_utils::{is_absolute_remote_path, join_remote_path, normalize_remote_path};

#[derive(Debug, Clone)]
pub struct DirectoryState {
    current: String,
    /// Login directory, used for `~`
    home: String,
}

impl DirectoryState {
    /// Start at the login directory reported by the server
    pub fn new(home: &str) -> Self {
        let home = normalize_remote_path(home);
        Self {
            current: home.clone(),
            home,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    /// Resolve `target` against the current directory into a normalized absolute path
    pub fn resolve(&self, target: &str) -> String {
        let target = target.trim();
        if target.is_empty() {
            return self.current.clone();
        }

        if target == "~" {
            return self.home.clone();
        }
        if let Some(rest) = target.strip_prefix("~/") {
            return normalize_remote_path(&join_remote_path(&self.home, rest));
        }

        if is_absolute_remote_path(target) {
            normalize_remote_path(target)
        } else {
            normalize_remote_path(&join_remote_path(&self.current, target))
        }
    }

    /// Record a confirmed directory as the new working directory
    pub(crate) fn commit(&mut self, confirmed: &str) {
        debug_assert!(is_absolute_remote_path(confirmed));
        self.current = normalize_remote_path(confirmed);
        debug!("Working directory is now {}", self.current);
    }
}
