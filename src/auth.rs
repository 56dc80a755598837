//! Builds the SSH authentication shared by every connection of a run.

use crate::config::CONNECT_TIMEOUT;
use crate::Error;
use russh::keys::PrivateKey;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Who to log in as, with which key, and how long to wait for a connection.
///
/// Created once per run and passed by reference to each connection attempt. Host keys are never
/// verified: the machines being rebooted are assumed to be the operator's own.
#[derive(Clone)]
pub struct AuthConfig {
    pub user: String,
    pub key: Arc<PrivateKey>,
    pub connect_timeout: Duration,
}

impl AuthConfig {
    /// Reads and decodes the private key at `key_path`.
    ///
    /// `passphrase` decrypts the key if present. No connection is attempted.
    ///
    /// # Errors
    ///
    /// Returns [Error::ReadKey] if the file can't be read and [Error::ParseKey] if its contents
    /// are not a private key, or the passphrase is missing or wrong.
    pub fn from_key_file(
        key_path: impl AsRef<Path>,
        passphrase: Option<&str>,
        user: impl Into<String>,
    ) -> Result<Self, Error> {
        let key_path = key_path.as_ref();
        debug!(path = %key_path.display(), encrypted = passphrase.is_some(), "loading private key");

        let pem = fs::read_to_string(key_path).map_err(|source| Error::ReadKey {
            path: key_path.to_owned(),
            source,
        })?;
        let key =
            russh::keys::decode_secret_key(&pem, passphrase).map_err(|source| Error::ParseKey {
                path: key_path.to_owned(),
                source,
            })?;

        Ok(Self {
            user: user.into(),
            key: Arc::new(key),
            connect_timeout: CONNECT_TIMEOUT,
        })
    }
}

// Keep key material out of debug output.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user)
            .field("key", &self.key.algorithm())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
