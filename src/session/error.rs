//! Session error taxonomy

use thiserror::Error;

use crate::sftp::SftpError;
use crate::ssh::SshError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Dial, authentication or host key failure; the session is gone
    #[error("Connection error: {0}")]
    Connection(String),

    /// One command or transfer channel failed; the session stays usable
    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Listing output that could not be decoded into entries
    #[error("Cannot parse listing line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    /// Refused before anything was sent to the server
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Rejected by the server for any other reason
    #[error("Remote error: {0}")]
    Remote(String),
}

/// Coarse grouping for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Could not reach the server
    Unreachable,
    /// The server (or the core on its behalf) rejected the operation
    Rejected,
    /// Output arrived but could not be understood locally
    LocalParse,
}

impl SessionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::Connection(_) | SessionError::Channel(_) => ErrorCategory::Unreachable,
            SessionError::Parse { .. } => ErrorCategory::LocalParse,
            SessionError::NotADirectory(_)
            | SessionError::NotFound(_)
            | SessionError::PermissionDenied(_)
            | SessionError::InvalidTarget(_)
            | SessionError::Remote(_) => ErrorCategory::Rejected,
        }
    }

    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        SessionError::Parse {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify the merged output of a failed shell command run against `path`
    pub(crate) fn from_shell_output(output: &str, path: &str, exit_status: Option<u32>) -> Self {
        let lower = output.to_lowercase();
        if lower.contains("no such file or directory") {
            SessionError::NotFound(path.to_string())
        } else if lower.contains("not a directory") {
            SessionError::NotADirectory(path.to_string())
        } else if lower.contains("permission denied") {
            SessionError::PermissionDenied(path.to_string())
        } else {
            let message = output.trim();
            if message.is_empty() {
                SessionError::Remote(format!("{}: exit status {:?}", path, exit_status))
            } else {
                SessionError::Remote(format!("{}: {}", path, message))
            }
        }
    }
}

impl From<SshError> for SessionError {
    fn from(err: SshError) -> Self {
        if err.is_fatal() {
            SessionError::Connection(err.to_string())
        } else {
            SessionError::Channel(err.to_string())
        }
    }
}

impl From<SftpError> for SessionError {
    fn from(err: SftpError) -> Self {
        match err {
            SftpError::FileNotFound(p) => SessionError::NotFound(p),
            SftpError::PermissionDenied(p) => SessionError::PermissionDenied(p),
            SftpError::NotADirectory(p) => SessionError::NotADirectory(p),
            SftpError::ChannelError(_)
            | SftpError::SubsystemNotAvailable(_)
            | SftpError::IoError(_) => SessionError::Channel(err.to_string()),
            SftpError::ProtocolError(_) | SftpError::WriteError(_) => {
                SessionError::Remote(err.to_string())
            }
        }
    }
}
