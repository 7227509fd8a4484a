//! Sash - remote session core
//!
//! Logs into an SSH host with a password and exposes the state a remote file
//! browser needs: a working directory, directory listings over SFTP or shell
//! output, whole-file edits, and commands run in place.

pub mod config;
pub mod session;
pub mod sftp;
pub mod ssh;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{ConfigStorage, SessionConfig};
pub use session::{
    BackendKind, BackendPreference, CommandResult, Entry, ErrorCategory, RemoteSession,
    SessionError,
};
pub use ssh::{HostKeyPolicy, SshConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` filter. Output goes to stderr so it
/// never mixes with listings and file contents on stdout.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
