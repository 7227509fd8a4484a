//! One-shot command execution over SSH exec channels
//!
//! Every call opens a fresh session channel, runs one command, and closes the
//! channel again. No shell state carries over between calls, so anything that
//! must happen in a directory is prefixed with [`in_directory`].

use async_trait::async_trait;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use serde::Serialize;
use tracing::debug;

use super::error::SshError;
use super::handle_owner::HandleController;

/// Output of one remote command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// stdout and stderr, interleaved in arrival order
    pub output: String,
    /// Exit status, if the server reported one
    pub exit_status: Option<u32>,
}

impl CommandResult {
    pub fn ok(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// Anything that can run a command on the remote host
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<CommandResult, SshError>;
}

/// Run `command` on a new channel from `controller`
pub async fn exec_command(
    controller: &HandleController,
    command: &str,
) -> Result<CommandResult, SshError> {
    let mut channel = controller.open_session_channel().await?;

    debug!("exec: {}", command);
    let result = run_on_channel(&mut channel, command).await;

    // Release the channel whether or not the command ran
    let _ = channel.close().await;

    if let Ok(ref r) = result {
        debug!(
            "exec completed: exit={:?} output_len={}",
            r.exit_status,
            r.output.len()
        );
    }
    result
}

async fn run_on_channel(
    channel: &mut Channel<Msg>,
    command: &str,
) -> Result<CommandResult, SshError> {
    channel
        .exec(true, command)
        .await
        .map_err(|e| SshError::ChannelError(format!("Failed to execute command: {}", e)))?;

    let mut output = Vec::new();
    let mut exit_status = None;

    // exit-status usually arrives after EOF, so only Close ends the loop
    loop {
        match channel.wait().await {
            Some(ChannelMsg::Data { data }) => output.extend_from_slice(&data),
            Some(ChannelMsg::ExtendedData { data, .. }) => output.extend_from_slice(&data),
            Some(ChannelMsg::ExitStatus { exit_status: status }) => exit_status = Some(status),
            Some(ChannelMsg::ExitSignal { signal_name, .. }) => {
                debug!("exec terminated by signal {:?}", signal_name);
            }
            Some(ChannelMsg::Failure) => {
                return Err(SshError::ChannelError(
                    "Server refused exec request".to_string(),
                ));
            }
            Some(ChannelMsg::Close) | None => break,
            Some(_) => {}
        }
    }

    Ok(CommandResult {
        output: String::from_utf8_lossy(&output).into_owned(),
        exit_status,
    })
}

/// Quote a string for a POSIX shell: wrap in single quotes, escape single quotes
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Prefix `command` so it runs inside `dir`
pub fn in_directory(dir: &str, command: &str) -> String {
    format!("cd {} && {}", shell_escape(dir), command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("plain"), "'plain'");
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
        assert_eq!(shell_escape("a b\nc"), "'a b\nc'");
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn test_in_directory() {
        assert_eq!(in_directory("/srv/my data", "ls"), "cd '/srv/my data' && ls");
    }

    #[test]
    fn test_ok_requires_zero_exit() {
        let mut result = CommandResult {
            output: String::new(),
            exit_status: Some(0),
        };
        assert!(result.ok());
        result.exit_status = Some(127);
        assert!(!result.ok());
        result.exit_status = None;
        assert!(!result.ok());
    }
}
