//! SFTP module
//!
//! The structured file-transfer handle: typed directory listings, whole-file
//! reads and writes, and removal over the SFTP subsystem.

pub mod error;
pub mod path_utils;
pub mod session;
pub mod types;

pub use error::SftpError;
pub use session::{FileTransfer, SftpSession};
pub use types::{mode_string, RemoteDirEntry, RemoteMetadata};
