//! SSH Configuration

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the server's host key is checked during the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Accept any host key without verification.
    ///
    /// This is insecure: anyone able to intercept the connection can
    /// impersonate the server. It exists for lab hosts and first contact,
    /// and is logged at warn level on every connection.
    Insecure,

    /// Verify against `~/.ssh/known_hosts`
    #[default]
    DefaultKnownHosts,

    /// Verify against a specific known_hosts file
    KnownHosts { path: PathBuf },
}

impl HostKeyPolicy {
    /// Resolve the known_hosts file this policy checks against, if any
    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        match self {
            HostKeyPolicy::Insecure => None,
            HostKeyPolicy::DefaultKnownHosts => Some(
                dirs::home_dir()
                    .map(|h| h.join(".ssh").join("known_hosts"))
                    .unwrap_or_else(|| PathBuf::from("~/.ssh/known_hosts")),
            ),
            HostKeyPolicy::KnownHosts { path } => Some(path.clone()),
        }
    }
}

/// SSH connection parameters for a single login
#[derive(Clone)]
pub struct SshConfig {
    /// Remote host address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,

    /// Dial + handshake timeout in seconds
    pub timeout_secs: u64,

    /// Host key verification
    pub host_key: HostKeyPolicy,
}

impl SshConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Parse a `host:port` target; the port defaults to 22 when omitted.
    ///
    /// Bracketed IPv6 literals (`[::1]:2222`) are accepted.
    pub fn parse_target(target: &str) -> Option<(String, u16)> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }

        if let Some(rest) = target.strip_prefix('[') {
            let (host, tail) = rest.split_once(']')?;
            let port = match tail.strip_prefix(':') {
                Some(p) => p.parse().ok()?,
                None if tail.is_empty() => 22,
                None => return None,
            };
            return Some((host.to_string(), port));
        }

        match target.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => {
                if host.is_empty() {
                    return None;
                }
                Some((host.to_string(), port.parse().ok()?))
            }
            Some(_) => None,
            None => Some((target.to_string(), 22)),
        }
    }

    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// Keep the password out of debug output
impl fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("host_key", &self.host_key)
            .finish()
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
            host_key: HostKeyPolicy::default(),
        }
    }
}
