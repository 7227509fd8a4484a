//! The authenticated connection shared by every operation of a session

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::Channel;
use tracing::info;

use super::client::ClientHandler;
use super::error::SshError;
use super::exec::{exec_command, CommandResult, CommandRunner};
use super::handle_owner::{spawn_handle_owner_task, HandleController};

/// One authenticated SSH connection
///
/// Command channels and the optional SFTP channel are all opened through
/// the same handle owner task.
#[derive(Clone)]
pub struct Transport {
    controller: HandleController,
    label: String,
}

impl Transport {
    pub fn new(handle: Handle<ClientHandler>, label: String) -> Self {
        let controller = spawn_handle_owner_task(handle, label.clone());
        Self { controller, label }
    }

    /// `user@host:port`, for logs and titles
    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn open_channel(&self) -> Result<Channel<Msg>, SshError> {
        self.controller.open_session_channel().await
    }

    pub fn is_connected(&self) -> bool {
        self.controller.is_connected()
    }

    pub async fn disconnect(&self) {
        info!("Closing connection {}", self.label);
        self.controller.disconnect().await;
    }
}

#[async_trait]
impl CommandRunner for Transport {
    async fn run(&self, command: &str) -> Result<CommandResult, SshError> {
        exec_command(&self.controller, command).await
    }
}
