//! SSH Client implementation using russh

use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use russh::client;
use russh::keys::PublicKey;
use tracing::{debug, info, warn};

use super::config::SshConfig;
use super::error::SshError;
use super::known_hosts::{HostKeyVerification, KnownHostsStore};
use super::transport::Transport;

/// Dials and authenticates one SSH connection
pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Connect, verify the host key per policy, and authenticate with the password
    pub async fn connect(self) -> Result<Transport, SshError> {
        let addr = self.config.address();

        info!("Connecting to SSH server at {}", addr);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let handler = match self.config.host_key.known_hosts_path() {
            Some(path) => {
                let store = KnownHostsStore::load(&path).map_err(|e| {
                    SshError::ConnectionFailed(format!(
                        "Failed to read known_hosts {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                ClientHandler::verifying(self.config.host.clone(), self.config.port, store)
            }
            None => ClientHandler::insecure(self.config.host.clone(), self.config.port),
        };

        let ssh_config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };

        let mut handle = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            client::connect(Arc::new(ssh_config), socket_addr, handler),
        )
        .await
        .map_err(|_| SshError::Timeout("Connection timed out".to_string()))?
        .map_err(|e| match e {
            SshError::HostKeyRejected(_) => e,
            other => SshError::ConnectionFailed(other.to_string()),
        })?;

        debug!("SSH handshake completed");

        let authenticated = handle
            .authenticate_password(&self.config.username, &self.config.password)
            .await
            .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?;

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful for {}@{}", self.config.username, addr);

        Ok(Transport::new(
            handle,
            format!("{}@{}", self.config.username, addr),
        ))
    }
}

/// Client handler for russh callbacks
///
/// Makes the binary accept/reject decision on the server's host key.
pub struct ClientHandler {
    host: String,
    port: u16,
    /// `None` means verification is skipped
    known_hosts: Option<KnownHostsStore>,
}

impl ClientHandler {
    pub fn verifying(host: String, port: u16, known_hosts: KnownHostsStore) -> Self {
        Self {
            host,
            port,
            known_hosts: Some(known_hosts),
        }
    }

    pub fn insecure(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            known_hosts: None,
        }
    }

    fn decide(&self, verification: HostKeyVerification) -> Result<bool, SshError> {
        match verification {
            HostKeyVerification::Verified => {
                info!("Host key verified for {}:{}", self.host, self.port);
                Ok(true)
            }
            HostKeyVerification::Unknown { fingerprint } => {
                warn!(
                    "Unknown host key for {}:{} (fingerprint: {}), rejecting",
                    self.host, self.port, fingerprint
                );
                Err(SshError::HostKeyRejected(format!(
                    "unknown host {}:{}, fingerprint {}",
                    self.host, self.port, fingerprint
                )))
            }
            HostKeyVerification::Changed {
                expected_fingerprint,
                actual_fingerprint,
            } => {
                warn!(
                    "HOST KEY CHANGED for {}:{}! Expected {}, got {}",
                    self.host, self.port, expected_fingerprint, actual_fingerprint
                );
                Err(SshError::HostKeyRejected(format!(
                    "key for {}:{} has changed (expected {}, got {})",
                    self.host, self.port, expected_fingerprint, actual_fingerprint
                )))
            }
        }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.known_hosts {
            Some(store) => {
                let verification = store.verify(&self.host, self.port, server_public_key);
                self.decide(verification)
            }
            None => {
                warn!(
                    "Host key verification disabled, accepting {} for {}:{}",
                    KnownHostsStore::fingerprint(server_public_key),
                    self.host,
                    self.port
                );
                Ok(true)
            }
        }
    }
}
