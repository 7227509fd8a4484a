//! Structured backend over the SFTP subsystem

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::backend::{BackendKind, RemoteBackend};
use super::entry::Entry;
use super::error::SessionError;
use crate::sftp::{FileTransfer, SftpError};

pub struct SftpBackend {
    fs: Arc<dyn FileTransfer>,
}

impl SftpBackend {
    pub fn new(fs: Arc<dyn FileTransfer>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl RemoteBackend for SftpBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sftp
    }

    async fn list(&self, dir: &str) -> Result<Vec<Entry>, SessionError> {
        let entries = self.fs.read_dir(dir).await?;
        Ok(entries.into_iter().map(Entry::from_remote).collect())
    }

    async fn probe_dir(&self, path: &str) -> Result<String, SessionError> {
        let metadata = self.fs.metadata(path).await?;
        if !metadata.is_dir {
            return Err(SessionError::NotADirectory(path.to_string()));
        }
        Ok(path.to_string())
    }

    async fn read_file(&self, path: &str) -> Result<String, SessionError> {
        let content = self.fs.read(path).await?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    async fn write_file(&self, path: &str, text: &str) -> Result<(), SessionError> {
        self.fs.write(path, text.as_bytes()).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), SessionError> {
        // Whatever can be enumerated is a directory
        match self.fs.read_dir(path).await {
            Ok(_) => {
                debug!("Removing directory {}", path);
                self.fs.remove_dir(path).await?;
            }
            Err(SftpError::FileNotFound(p)) => return Err(SessionError::NotFound(p)),
            Err(_) => {
                debug!("Removing file {}", path);
                self.fs.remove_file(path).await?;
            }
        }
        Ok(())
    }
}
