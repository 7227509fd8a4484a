//! Configuration Types
//!
//! Saved session profiles. Passwords are never part of a profile; they are
//! asked for at connect time.

use serde::{Deserialize, Serialize};

use crate::session::BackendPreference;
use crate::ssh::{HostKeyPolicy, SshConfig};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

fn default_port() -> u16 {
    22
}

fn default_timeout() -> u64 {
    30
}

/// One saved connection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Profile name used to pick it on the command line
    pub name: String,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    /// Dial + handshake timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub host_key: HostKeyPolicy,

    #[serde(default)]
    pub backend: BackendPreference,
}

impl SessionConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            username: username.into(),
            timeout_secs: default_timeout(),
            host_key: HostKeyPolicy::default(),
            backend: BackendPreference::default(),
        }
    }

    /// Combine with a password into transport parameters
    pub fn to_ssh_config(&self, password: impl Into<String>) -> SshConfig {
        SshConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: password.into(),
            timeout_secs: self.timeout_secs,
            host_key: self.host_key.clone(),
        }
    }
}

/// Root of `sessions.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: u32,

    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sessions: Vec::new(),
        }
    }
}

impl ConfigFile {
    pub fn find(&self, name: &str) -> Option<&SessionConfig> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// Insert or replace the profile with the same name
    pub fn upsert(&mut self, session: SessionConfig) {
        match self.sessions.iter_mut().find(|s| s.name == session.name) {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<SessionConfig> {
        let index = self.sessions.iter().position(|s| s.name == name)?;
        Some(self.sessions.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let json = r#"{"name":"lab","host":"10.0.0.5","username":"ops"}"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.port, 22);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.host_key, HostKeyPolicy::DefaultKnownHosts);
        assert_eq!(config.backend, BackendPreference::Auto);
    }

    #[test]
    fn test_policy_and_backend_serialization() {
        let mut config = SessionConfig::new("box", "box.local", "me");
        config.host_key = HostKeyPolicy::KnownHosts {
            path: PathBuf::from("/etc/ssh/ssh_known_hosts"),
        };
        config.backend = BackendPreference::Shell;

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["host_key"]["type"], "known_hosts");
        assert_eq!(json["host_key"]["path"], "/etc/ssh/ssh_known_hosts");
        assert_eq!(json["backend"], "shell");

        let back: SessionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_to_ssh_config() {
        let mut config = SessionConfig::new("box", "box.local", "me");
        config.port = 2222;
        let ssh = config.to_ssh_config("secret");
        assert_eq!(ssh.address(), "box.local:2222");
        assert_eq!(ssh.username, "me");
        assert_eq!(ssh.password, "secret");
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let mut file = ConfigFile::default();
        file.upsert(SessionConfig::new("a", "one", "u"));
        file.upsert(SessionConfig::new("b", "two", "u"));
        file.upsert(SessionConfig::new("a", "three", "u"));

        assert_eq!(file.sessions.len(), 2);
        assert_eq!(file.find("a").unwrap().host, "three");
        assert!(file.remove("b").is_some());
        assert!(file.find("b").is_none());
    }
}
