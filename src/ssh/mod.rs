//! SSH module - the transport layer
//!
//! Dials one connection with russh, authenticates with a password, checks the
//! host key against a known_hosts trust anchor (or explicitly skips the check),
//! and runs one-shot commands over fresh exec channels.

mod client;
mod config;
mod error;
pub mod exec;
mod handle_owner;
pub mod known_hosts;
mod transport;

pub use client::{ClientHandler, SshClient};
pub use config::{HostKeyPolicy, SshConfig};
pub use error::SshError;
pub use exec::{exec_command, in_directory, shell_escape, CommandResult, CommandRunner};
pub use handle_owner::{spawn_handle_owner_task, HandleCommand, HandleController};
pub use known_hosts::{HostKeyVerification, KnownHostsStore};
pub use transport::Transport;
