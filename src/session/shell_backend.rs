//! Text backend that drives plain shell commands over exec channels
//!
//! Used when the SFTP subsystem is unavailable or disabled. Every command is
//! self-contained (`cd <dir> && ...`) because exec channels share no state.
//!
//! Writes go through `printf '%s'` with the content single-quoted, which keeps
//! newlines and quotes intact but cannot carry NUL bytes or content larger than
//! the server's argument size limit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::backend::{BackendKind, RemoteBackend};
use super::entry::Entry;
use super::error::SessionError;
use super::ls_parser::{parse_listing, LIST_COMMAND};
use crate::sftp::path_utils::is_absolute_remote_path;
use crate::ssh::{in_directory, shell_escape, CommandResult, CommandRunner};

pub struct ShellBackend {
    runner: Arc<dyn CommandRunner>,
}

impl ShellBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run `command`, turning a non-zero exit into an error about `path`
    async fn run_checked(&self, command: &str, path: &str) -> Result<CommandResult, SessionError> {
        let result = self.runner.run(command).await?;
        if !result.ok() {
            debug!(
                "Shell command failed for {} (exit {:?})",
                path, result.exit_status
            );
            return Err(SessionError::from_shell_output(
                &result.output,
                path,
                result.exit_status,
            ));
        }
        Ok(result)
    }
}

#[async_trait]
impl RemoteBackend for ShellBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Shell
    }

    async fn list(&self, dir: &str) -> Result<Vec<Entry>, SessionError> {
        let result = self.run_checked(&in_directory(dir, LIST_COMMAND), dir).await?;
        parse_listing(&result.output)
    }

    async fn probe_dir(&self, path: &str) -> Result<String, SessionError> {
        let result = self
            .run_checked(&format!("cd {} && pwd", shell_escape(path)), path)
            .await?;

        let confirmed = result.output.lines().last().unwrap_or("").trim();
        if !is_absolute_remote_path(confirmed) {
            return Err(SessionError::parse(confirmed, "pwd did not print an absolute path"));
        }
        Ok(confirmed.to_string())
    }

    async fn read_file(&self, path: &str) -> Result<String, SessionError> {
        let result = self
            .run_checked(&format!("cat -- {}", shell_escape(path)), path)
            .await?;
        Ok(result.output)
    }

    async fn write_file(&self, path: &str, text: &str) -> Result<(), SessionError> {
        let command = format!(
            "printf '%s' {} > {}",
            shell_escape(text),
            shell_escape(path)
        );
        self.run_checked(&command, path).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), SessionError> {
        let p = shell_escape(path);
        // Symlinks to directories are removed as files
        let command = format!(
            "if [ -d {p} ] && [ ! -L {p} ]; then rmdir -- {p}; else rm -- {p}; fi",
            p = p
        );
        self.run_checked(&command, path).await?;
        Ok(())
    }
}
