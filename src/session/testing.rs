//! In-memory stand-ins for the transport seams

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::sftp::path_utils::parent_remote_path;
use crate::sftp::{FileTransfer, RemoteDirEntry, RemoteMetadata, SftpError};
use crate::ssh::{CommandResult, CommandRunner, SshError};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// A tiny remote filesystem keyed by absolute path
#[derive(Default)]
pub struct MemoryFs {
    nodes: Mutex<BTreeMap<String, Node>>,
}

impl MemoryFs {
    pub fn new() -> Arc<Self> {
        let fs = Self::default();
        fs.nodes.lock().insert("/".to_string(), Node::Dir);
        Arc::new(fs)
    }

    pub fn mkdir(&self, path: &str) {
        self.nodes.lock().insert(path.to_string(), Node::Dir);
    }

    pub fn put(&self, path: &str, content: &str) {
        self.nodes
            .lock()
            .insert(path.to_string(), Node::File(content.as_bytes().to_vec()));
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.lock().contains_key(path)
    }

    fn children(nodes: &BTreeMap<String, Node>, dir: &str) -> Vec<String> {
        nodes
            .keys()
            .filter(|p| p.as_str() != "/" && parent_remote_path(p) == dir)
            .cloned()
            .collect()
    }

    fn metadata_of(node: &Node) -> RemoteMetadata {
        match node {
            Node::Dir => RemoteMetadata {
                is_dir: true,
                size: 4096,
                mtime: Some(1_704_067_200),
                permissions: Some(0o040755),
                ..Default::default()
            },
            Node::File(data) => RemoteMetadata {
                size: data.len() as u64,
                mtime: Some(1_704_067_200),
                permissions: Some(0o100644),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl FileTransfer for MemoryFs {
    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteDirEntry>, SftpError> {
        let nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Node::Dir) => Ok(Self::children(&nodes, path)
                .into_iter()
                .map(|child| RemoteDirEntry {
                    name: child.rsplit('/').next().unwrap_or_default().to_string(),
                    metadata: Self::metadata_of(&nodes[&child]),
                })
                .collect()),
            Some(Node::File(_)) => Err(SftpError::NotADirectory(path.to_string())),
            None => Err(SftpError::FileNotFound(path.to_string())),
        }
    }

    async fn metadata(&self, path: &str) -> Result<RemoteMetadata, SftpError> {
        self.nodes
            .lock()
            .get(path)
            .map(Self::metadata_of)
            .ok_or_else(|| SftpError::FileNotFound(path.to_string()))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError> {
        match self.nodes.lock().get(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(SftpError::ProtocolError(format!("{}: Failure", path))),
            None => Err(SftpError::FileNotFound(path.to_string())),
        }
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<(), SftpError> {
        let mut nodes = self.nodes.lock();
        match nodes.get(&parent_remote_path(path)) {
            Some(Node::Dir) => {}
            _ => return Err(SftpError::FileNotFound(path.to_string())),
        }
        if let Some(Node::Dir) = nodes.get(path) {
            return Err(SftpError::ProtocolError(format!("{}: Failure", path)));
        }
        nodes.insert(path.to_string(), Node::File(content.to_vec()));
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
        let mut nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(SftpError::ProtocolError(format!("{}: Failure", path))),
            None => Err(SftpError::FileNotFound(path.to_string())),
        }
    }

    async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
        let mut nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Node::Dir) if Self::children(&nodes, path).is_empty() => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(SftpError::ProtocolError(format!("{}: Failure", path))),
            Some(Node::File(_)) => Err(SftpError::NotADirectory(path.to_string())),
            None => Err(SftpError::FileNotFound(path.to_string())),
        }
    }
}

/// Answers commands from a script of (substring, result) pairs
#[derive(Default)]
pub struct ScriptedRunner {
    script: Mutex<Vec<(String, CommandResult)>>,
    pub commands: Mutex<Vec<String>>,
    fail_channel: Mutex<bool>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Any command containing `pattern` gets `output` with `exit_status`
    pub fn on(&self, pattern: &str, output: &str, exit_status: u32) {
        self.script.lock().push((
            pattern.to_string(),
            CommandResult {
                output: output.to_string(),
                exit_status: Some(exit_status),
            },
        ));
    }

    /// Make every following channel open fail
    pub fn break_channel(&self) {
        *self.fail_channel.lock() = true;
    }

    pub fn last_command(&self) -> Option<String> {
        self.commands.lock().last().cloned()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str) -> Result<CommandResult, SshError> {
        self.commands.lock().push(command.to_string());
        if *self.fail_channel.lock() {
            return Err(SshError::ChannelError("channel open refused".to_string()));
        }

        let script = self.script.lock();
        // Later rules win
        let hit = script.iter().rev().find(|(p, _)| command.contains(p.as_str()));
        Ok(match hit {
            Some((_, result)) => result.clone(),
            None => CommandResult {
                output: format!("sh: 1: {}: not found\n", command),
                exit_status: Some(127),
            },
        })
    }
}
