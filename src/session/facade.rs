//! Session facade
//!
//! [`RemoteSession`] is the only type a front end talks to. It owns the
//! transport, the backend chosen at login, and the working directory, and it
//! publishes every directory change on a watch channel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::backend::{BackendKind, BackendPreference, RemoteBackend};
use super::cwd::DirectoryState;
use super::entry::{sort_entries, Entry};
use super::error::SessionError;
use super::sftp_backend::SftpBackend;
use super::shell_backend::ShellBackend;
use crate::sftp::path_utils::{is_absolute_remote_path, is_within};
use crate::sftp::SftpSession;
use crate::ssh::{in_directory, CommandResult, CommandRunner, SshClient, SshConfig, Transport};

/// An authenticated session on one remote host
///
/// Methods that move the working directory take `&mut self`; share a session
/// between tasks behind a `tokio::sync::Mutex`.
pub struct RemoteSession {
    runner: Arc<dyn CommandRunner>,
    backend: Box<dyn RemoteBackend>,
    cwd: DirectoryState,
    cwd_tx: watch::Sender<String>,
    transport: Option<Transport>,
    sftp: Option<Arc<SftpSession>>,
}

impl RemoteSession {
    /// Log in, seed the working directory with `pwd`, and pick the backend
    pub async fn connect(
        config: SshConfig,
        preference: BackendPreference,
    ) -> Result<Self, SessionError> {
        let transport = SshClient::new(config).connect().await?;

        let home = match seed_working_directory(&transport).await {
            Ok(home) => home,
            Err(e) => {
                warn!("Working directory probe failed on {}: {}", transport.label(), e);
                transport.disconnect().await;
                return Err(SessionError::Connection(format!(
                    "could not determine working directory: {}",
                    e
                )));
            }
        };

        let runner: Arc<dyn CommandRunner> = Arc::new(transport.clone());

        let sftp = match preference {
            BackendPreference::Shell => {
                info!("Shell backend forced by configuration");
                None
            }
            BackendPreference::Auto => match SftpSession::open(&transport).await {
                Ok(sftp) => Some(Arc::new(sftp)),
                Err(e) => {
                    warn!("SFTP unavailable on {}, falling back to shell: {}", transport.label(), e);
                    None
                }
            },
        };

        let backend: Box<dyn RemoteBackend> = match &sftp {
            Some(sftp) => Box::new(SftpBackend::new(sftp.clone())),
            None => Box::new(ShellBackend::new(runner.clone())),
        };

        info!(
            "Session ready on {} (backend: {}, cwd: {})",
            transport.label(),
            backend.kind(),
            home
        );

        let mut session = Self::from_parts(runner, backend, &home);
        session.transport = Some(transport);
        session.sftp = sftp;
        Ok(session)
    }

    /// Assemble a session from an already-connected runner and backend
    pub fn from_parts(
        runner: Arc<dyn CommandRunner>,
        backend: Box<dyn RemoteBackend>,
        home: &str,
    ) -> Self {
        let cwd = DirectoryState::new(home);
        let (cwd_tx, _) = watch::channel(cwd.current().to_string());
        Self {
            runner,
            backend,
            cwd,
            cwd_tx,
            transport: None,
            sftp: None,
        }
    }

    pub fn current_path(&self) -> &str {
        self.cwd.current()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Receive the new working directory after every successful navigation
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.cwd_tx.subscribe()
    }

    /// Entries of the working directory, directories first
    pub async fn list_current_directory(&self) -> Result<Vec<Entry>, SessionError> {
        let dir = self.cwd.current();
        debug!("Listing {} via {}", dir, self.backend.kind());

        let mut entries = self.backend.list(dir).await?;
        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Move to `target` (relative, absolute, or `~`).
    ///
    /// The working directory only changes once the backend has confirmed
    /// the target is a directory; on error it is left untouched.
    pub async fn navigate(&mut self, target: &str) -> Result<(), SessionError> {
        let resolved = self.cwd.resolve(target);
        let confirmed = self.backend.probe_dir(&resolved).await?;

        self.cwd.commit(&confirmed);
        info!("Changed directory to {}", self.cwd.current());
        self.cwd_tx.send_replace(self.cwd.current().to_string());
        Ok(())
    }

    pub async fn navigate_up(&mut self) -> Result<(), SessionError> {
        self.navigate("..").await
    }

    pub async fn read_file(&self, name: &str) -> Result<String, SessionError> {
        let path = self.resolve_target(name)?;
        debug!("Reading {}", path);
        self.backend.read_file(&path).await
    }

    /// Replace the whole file; concurrent edits elsewhere are overwritten
    pub async fn write_file(&self, name: &str, text: &str) -> Result<(), SessionError> {
        let path = self.resolve_target(name)?;
        self.backend.write_file(&path, text).await?;
        info!("Wrote {} bytes to {}", text.len(), path);
        Ok(())
    }

    /// Delete a file or an empty directory
    pub async fn delete_entry(&self, name: &str) -> Result<(), SessionError> {
        let path = self.resolve_target(name)?;

        // Removing the working directory (or above it) would strand the session
        if is_within(self.cwd.current(), &path) {
            return Err(SessionError::InvalidTarget(format!(
                "{} contains the working directory",
                path
            )));
        }

        self.backend.delete(&path).await?;
        info!("Deleted {}", path);
        Ok(())
    }

    /// Run `command` inside the working directory.
    ///
    /// A non-zero exit is `Ok` with `ok() == false`; only channel failures are
    /// errors. The working directory is never affected, even by `cd`.
    pub async fn run_command(&self, command: &str) -> Result<CommandResult, SessionError> {
        let full = in_directory(self.cwd.current(), command);
        let result = self.runner.run(&full).await?;
        debug!(
            "Command finished: exit={:?} output_len={}",
            result.exit_status,
            result.output.len()
        );
        Ok(result)
    }

    pub fn is_connected(&self) -> bool {
        self.transport
            .as_ref()
            .map(Transport::is_connected)
            .unwrap_or(true)
    }

    /// Close the SFTP channel (if any) and the connection
    pub async fn disconnect(self) {
        if let Some(sftp) = &self.sftp {
            if let Err(e) = sftp.close().await {
                debug!("SFTP close failed: {}", e);
            }
        }
        if let Some(transport) = &self.transport {
            transport.disconnect().await;
        }
    }

    fn resolve_target(&self, name: &str) -> Result<String, SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::InvalidTarget("empty name".to_string()));
        }
        Ok(self.cwd.resolve(name))
    }
}

/// `pwd` on a fresh channel; the login directory of the account
async fn seed_working_directory(runner: &dyn CommandRunner) -> Result<String, SessionError> {
    let result = runner.run("pwd").await?;
    if !result.ok() {
        return Err(SessionError::Remote(format!(
            "pwd exited with {:?}: {}",
            result.exit_status,
            result.output.trim()
        )));
    }

    let home = result.output.lines().last().unwrap_or("").trim();
    if !is_absolute_remote_path(home) {
        return Err(SessionError::parse(home, "pwd did not print an absolute path"));
    }
    Ok(home.to_string())
}
