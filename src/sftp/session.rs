//! SFTP Session management
//!
//! Provides SFTP file operations over an existing SSH connection.

use async_trait::async_trait;
use russh_sftp::client::error::Error as SftpErrorInner;
use russh_sftp::client::SftpSession as RusshSftpSession;
use russh_sftp::protocol::OpenFlags;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::error::SftpError;
use super::types::{RemoteDirEntry, RemoteMetadata};
use crate::ssh::Transport;

/// Structured file operations on absolute remote paths
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Entries of a directory, without `.` and `..`
    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteDirEntry>, SftpError>;

    /// Metadata of a path, following symlinks
    async fn metadata(&self, path: &str) -> Result<RemoteMetadata, SftpError>;

    /// Full file content
    async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError>;

    /// Create or truncate the file, then write `content`
    async fn write(&self, path: &str, content: &[u8]) -> Result<(), SftpError>;

    async fn remove_file(&self, path: &str) -> Result<(), SftpError>;

    /// Fails on a non-empty directory
    async fn remove_dir(&self, path: &str) -> Result<(), SftpError>;
}

/// SFTP Session wrapper
pub struct SftpSession {
    sftp: RusshSftpSession,
}

impl SftpSession {
    /// Open the SFTP subsystem on a new channel of `transport`
    pub async fn open(transport: &Transport) -> Result<Self, SftpError> {
        info!("Opening SFTP subsystem for {}", transport.label());

        let channel = transport
            .open_channel()
            .await
            .map_err(|e| SftpError::ChannelError(e.to_string()))?;

        channel.request_subsystem(true, "sftp").await.map_err(|e| {
            SftpError::SubsystemNotAvailable(format!("Failed to request SFTP subsystem: {}", e))
        })?;

        let sftp = RusshSftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SftpError::SubsystemNotAvailable(e.to_string()))?;

        info!("SFTP subsystem opened for {}", transport.label());
        Ok(Self { sftp })
    }

    pub async fn close(&self) -> Result<(), SftpError> {
        self.sftp
            .close()
            .await
            .map_err(|e| SftpError::ProtocolError(e.to_string()))
    }
}

#[async_trait]
impl FileTransfer for SftpSession {
    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteDirEntry>, SftpError> {
        debug!("Listing directory: {}", path);

        let read_dir = self
            .sftp
            .read_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        let entries: Vec<RemoteDirEntry> = read_dir
            .filter_map(|entry| {
                let name = entry.file_name();
                if name == "." || name == ".." {
                    return None;
                }
                Some(RemoteDirEntry {
                    metadata: RemoteMetadata::from(&entry.metadata()),
                    name,
                })
            })
            .collect();

        debug!("Listed {} entries in {}", entries.len(), path);
        Ok(entries)
    }

    async fn metadata(&self, path: &str) -> Result<RemoteMetadata, SftpError> {
        let attrs = self
            .sftp
            .metadata(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(RemoteMetadata::from(&attrs))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError> {
        debug!("Reading file: {}", path);
        self.sftp
            .read(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<(), SftpError> {
        debug!("Writing {} bytes to file: {}", content.len(), path);

        let mut file = self
            .sftp
            .open_with_flags(
                path,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        file.write_all(content)
            .await
            .map_err(|e| SftpError::WriteError(format!("Failed to write content: {}", e)))?;

        file.flush()
            .await
            .map_err(|e| SftpError::WriteError(format!("Failed to flush file: {}", e)))?;

        // Closes the remote handle
        file.shutdown()
            .await
            .map_err(|e| SftpError::WriteError(format!("Failed to close file: {}", e)))?;

        info!("Wrote {} bytes to {}", content.len(), path);
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        self.sftp
            .remove_file(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        self.sftp
            .remove_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }
}

/// Map SFTP errors to our error type
fn map_sftp_error(err: SftpErrorInner, path: &str) -> SftpError {
    classify_message(&err.to_string(), path)
}

fn classify_message(message: &str, path: &str) -> SftpError {
    let lower = message.to_lowercase();
    if lower.contains("no such file") || lower.contains("not found") {
        SftpError::FileNotFound(path.to_string())
    } else if lower.contains("permission denied") {
        SftpError::PermissionDenied(path.to_string())
    } else if lower.contains("not a directory") {
        SftpError::NotADirectory(path.to_string())
    } else {
        SftpError::ProtocolError(format!("{}: {}", path, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_message() {
        assert!(matches!(
            classify_message("No such file", "/x"),
            SftpError::FileNotFound(p) if p == "/x"
        ));
        assert!(matches!(
            classify_message("Permission denied", "/root"),
            SftpError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify_message("Not a directory", "/etc/passwd"),
            SftpError::NotADirectory(_)
        ));
        match classify_message("Failure", "/full") {
            SftpError::ProtocolError(msg) => assert_eq!(msg, "/full: Failure"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
