//! Remote session core
//!
//! Provides the state behind a remote file browser:
//! - Working directory tracking with confirm-before-commit navigation
//! - Directory listing through SFTP or scraped `ls -la` output
//! - Whole-file read, write and delete
//! - Arbitrary commands run inside the working directory

mod backend;
mod cwd;
mod entry;
mod error;
mod facade;
mod ls_parser;
mod sftp_backend;
mod shell_backend;

#[cfg(test)]
mod testing;

pub use backend::{BackendKind, BackendPreference, RemoteBackend};
pub use cwd::DirectoryState;
pub use entry::{sort_entries, Entry, EntryProperties};
pub use error::{ErrorCategory, SessionError};
pub use facade::RemoteSession;
pub use ls_parser::{parse_listing, LIST_COMMAND};
pub use sftp_backend::SftpBackend;
pub use shell_backend::ShellBackend;

pub use crate::ssh::CommandResult;
