//! Known hosts lookup for SSH host key verification
//!
//! A known_hosts file is the trust anchor for [`HostKeyPolicy::KnownHosts`].
//! The store only answers "does this key match"; it never writes new keys.
//!
//! [`HostKeyPolicy::KnownHosts`]: super::config::HostKeyPolicy

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use russh::keys::{PublicKey, PublicKeyBase64};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::error::SshError;

/// Result of host key verification
#[derive(Debug, Clone, PartialEq)]
pub enum HostKeyVerification {
    /// Key matches known_hosts entry
    Verified,
    /// Host (or this key type for the host) is not in known_hosts
    Unknown { fingerprint: String },
    /// Key changed from known_hosts entry (potential MITM)
    Changed {
        expected_fingerprint: String,
        actual_fingerprint: String,
    },
}

/// Entry in known_hosts: (key_type, base64_key)
#[derive(Clone, Debug)]
struct HostKeyEntry {
    key_type: String,
    key_data: String,
}

type HmacSha1 = Hmac<Sha1>;

/// A `|1|salt|hash` host pattern (`HashKnownHosts yes`)
#[derive(Clone, Debug)]
struct HashedHost {
    salt: Vec<u8>,
    hash: Vec<u8>,
    entry: HostKeyEntry,
}

impl HashedHost {
    fn parse(pattern: &str, entry: HostKeyEntry) -> Option<Self> {
        let mut parts = pattern.strip_prefix("|1|")?.split('|');
        let salt = BASE64.decode(parts.next()?).ok()?;
        let hash = BASE64.decode(parts.next()?).ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { salt, hash, entry })
    }

    /// HMAC-SHA1 of the lookup key, keyed with the salt
    fn matches(&self, lookup_key: &str) -> bool {
        let Ok(mut mac) = HmacSha1::new_from_slice(&self.salt) else {
            return false;
        };
        mac.update(lookup_key.as_bytes());
        mac.verify_slice(&self.hash).is_ok()
    }
}

/// Read-only view of one known_hosts file
pub struct KnownHostsStore {
    /// host lookup key -> keys (several key types per host are allowed)
    hosts: RwLock<HashMap<String, Vec<HostKeyEntry>>>,
    hashed: RwLock<Vec<HashedHost>>,
    path: PathBuf,
}

impl KnownHostsStore {
    /// Load the store from `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SshError> {
        let store = Self {
            hosts: RwLock::new(HashMap::new()),
            hashed: RwLock::new(Vec::new()),
            path: path.as_ref().to_path_buf(),
        };

        if !store.path.exists() {
            debug!("Known hosts file {} does not exist", store.path.display());
            return Ok(store);
        }

        let file = fs::File::open(&store.path).map_err(SshError::IoError)?;
        let count = store.parse(BufReader::new(file))?;

        info!(
            "Loaded {} known host entries from {}",
            count,
            store.path.display()
        );
        Ok(store)
    }

    fn parse(&self, reader: impl BufRead) -> Result<usize, SshError> {
        let mut hosts = self.hosts.write();
        let mut hashed = self.hashed.write();
        let mut entry_count = 0;

        for line in reader.lines() {
            let line = line.map_err(SshError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // hostname[,alias] keytype base64key [comment]
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                continue;
            }

            // @cert-authority / @revoked markers are not supported
            if parts[0].starts_with('@') {
                continue;
            }

            let entry = HostKeyEntry {
                key_type: parts[1].to_string(),
                key_data: parts[2].to_string(),
            };

            for hostname in parts[0].split(',') {
                if hostname.starts_with('|') {
                    match HashedHost::parse(hostname, entry.clone()) {
                        Some(host) => {
                            hashed.push(host);
                            entry_count += 1;
                        }
                        None => debug!("Skipping malformed hashed host {}", hostname),
                    }
                    continue;
                }
                hosts
                    .entry(hostname.to_lowercase())
                    .or_default()
                    .push(entry.clone());
                entry_count += 1;
            }
        }

        Ok(entry_count)
    }

    /// Lookup key in known_hosts notation: `host` for port 22, `[host]:port` otherwise
    fn make_key(host: &str, port: u16) -> String {
        let host = host.to_lowercase();
        if port == 22 {
            host
        } else {
            format!("[{}]:{}", host, port)
        }
    }

    /// Compute SHA256 fingerprint of raw public key bytes
    fn fingerprint_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = hasher.finalize();
        format!("SHA256:{}", BASE64.encode(hash).trim_end_matches('='))
    }

    /// Compute SHA256 fingerprint of public key
    pub fn fingerprint(key: &PublicKey) -> String {
        Self::fingerprint_bytes(&key.public_key_bytes())
    }

    fn fingerprint_from_b64(stored_b64: &str) -> String {
        match BASE64.decode(stored_b64) {
            Ok(bytes) => Self::fingerprint_bytes(&bytes),
            Err(_) => "unknown".to_string(),
        }
    }

    /// Verify a host's public key
    pub fn verify(&self, host: &str, port: u16, key: &PublicKey) -> HostKeyVerification {
        let key_b64 = BASE64.encode(key.public_key_bytes());
        self.verify_encoded(host, port, key.algorithm().as_str(), &key_b64)
    }

    /// Verify a key given as its known_hosts type name and base64 blob
    pub fn verify_encoded(
        &self,
        host: &str,
        port: u16,
        key_type: &str,
        key_b64: &str,
    ) -> HostKeyVerification {
        let lookup_key = Self::make_key(host, port);
        let fingerprint = Self::fingerprint_from_b64(key_b64);
        let hosts = self.hosts.read();
        let hashed = self.hashed.read();

        let entries: Vec<&HostKeyEntry> = hosts
            .get(&lookup_key)
            .into_iter()
            .flatten()
            .chain(
                hashed
                    .iter()
                    .filter(|h| h.matches(&lookup_key))
                    .map(|h| &h.entry),
            )
            .collect();

        if entries.is_empty() {
            debug!("Unknown host: {}", lookup_key);
            return HostKeyVerification::Unknown { fingerprint };
        }

        for entry in entries.iter().filter(|e| e.key_type == key_type) {
            if entry.key_data == key_b64 {
                debug!("Host key verified for {} (type: {})", lookup_key, key_type);
                return HostKeyVerification::Verified;
            }
        }

        // Same key type on file with different data means the key changed
        if let Some(entry) = entries.iter().find(|e| e.key_type == key_type) {
            let expected_fingerprint = Self::fingerprint_from_b64(&entry.key_data);
            warn!(
                "HOST KEY CHANGED for {} (type: {})! Expected {}, got {}",
                lookup_key, key_type, expected_fingerprint, fingerprint
            );
            return HostKeyVerification::Changed {
                expected_fingerprint,
                actual_fingerprint: fingerprint,
            };
        }

        debug!(
            "Host {} known but no {} key stored",
            lookup_key, key_type
        );
        HostKeyVerification::Unknown { fingerprint }
    }
}
