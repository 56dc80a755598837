//! Provides an interface to run commands on hosts over SSH.
//!
//! The rest of the crate talks to hosts only through [ManageClient] and [ClientInterface], so
//! that tests can swap the SSH transport for fakes. The production implementations,
//! [SshConnector] and [SshClient], are built on [russh].

use crate::auth::AuthConfig;
use crate::Error;
use async_trait::async_trait;
use russh::client::{self, AuthResult, Handle};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey};
use russh::{ChannelMsg, Sig};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, trace};

/// Connects to hosts and returns values representing those connections.
#[async_trait]
pub trait ManageClient<CI: ClientInterface> {
    /// Connect to `host` on `port`, authenticating with `auth`, and on success return an
    /// interface to the host.
    async fn connect(&mut self, host: &str, port: u16, auth: &AuthConfig) -> Result<CI, Error>;
}

/// The interface used to talk to a connected host.
#[async_trait]
pub trait ClientInterface {
    /// Run a single command to completion and classify how it ended.
    ///
    /// Returns an [Err] only if the command could not be started, including when the server
    /// refuses it. Everything that happens after that, including the connection dropping, is a
    /// [CommandOutcome].
    async fn run(&mut self, command: &str) -> Result<CommandOutcome, Error>;
}

/// How a remote command ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command exited with status 0.
    Success,

    /// The channel closed, or the connection dropped, before any exit status arrived.
    ///
    /// This is the normal result of a reboot command, which takes the SSH server down with it.
    NoExitStatus,

    /// The command exited with a non-zero status.
    ExitStatus(u32),

    /// The command was killed by the named signal.
    Signal(String),
}

impl CommandOutcome {
    /// Folds one channel message into the outcome observed so far.
    ///
    /// Starts from [CommandOutcome::NoExitStatus]; only exit reports change it.
    fn observe(self, message: &ChannelMsg) -> Self {
        match message {
            ChannelMsg::ExitStatus { exit_status: 0 } => CommandOutcome::Success,
            ChannelMsg::ExitStatus { exit_status } => CommandOutcome::ExitStatus(*exit_status),
            ChannelMsg::ExitSignal { signal_name, .. } => {
                CommandOutcome::Signal(signal_to_string(signal_name))
            }
            _ => self,
        }
    }
}

/// The bare signal name, e.g. `KILL`, as the server sent it.
fn signal_to_string(signal: &Sig) -> String {
    match signal {
        Sig::Custom(name) => name.clone(),
        named => format!("{named:?}"),
    }
}

/// Production implementation of [ManageClient].
#[derive(Clone, Debug, Default)]
pub struct SshConnector;

#[async_trait]
impl ManageClient<SshClient> for SshConnector {
    async fn connect(
        &mut self,
        host: &str,
        port: u16,
        auth: &AuthConfig,
    ) -> Result<SshClient, Error> {
        debug!(host, port, user = %auth.user, "connecting");
        let handle = time::timeout(auth.connect_timeout, open_session(host, port, auth))
            .await
            .map_err(|_| Error::ConnectTimeout {
                host: host.to_owned(),
                timeout: auth.connect_timeout,
            })??;
        debug!(host, "connected");

        Ok(SshClient {
            handle,
            host: host.to_owned(),
        })
    }
}

/// Dials, handshakes and authenticates, without any time limit.
async fn open_session(
    host: &str,
    port: u16,
    auth: &AuthConfig,
) -> Result<Handle<AcceptAnyHostKey>, Error> {
    let connect_error = |source| Error::Connect {
        host: host.to_owned(),
        source,
    };

    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|err| connect_error(russh::Error::from(err)))?;

    let config = Arc::new(client::Config::default());
    let mut handle = client::connect_stream(config, stream, AcceptAnyHostKey)
        .await
        .map_err(connect_error)?;

    // Only matters for RSA keys, where the server may refuse the SHA-1 default.
    let hash_alg = handle
        .best_supported_rsa_hash()
        .await
        .map_err(connect_error)?
        .flatten();
    let key = PrivateKeyWithHashAlg::new(Arc::clone(&auth.key), hash_alg);

    match handle
        .authenticate_publickey(&auth.user, key)
        .await
        .map_err(connect_error)?
    {
        AuthResult::Success => Ok(handle),
        AuthResult::Failure { .. } => Err(Error::AuthRejected {
            host: host.to_owned(),
            user: auth.user.clone(),
        }),
    }
}

/// A [client::Handler] that trusts every server key.
#[derive(Debug)]
pub struct AcceptAnyHostKey;

impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        trace!(
            fingerprint = %server_public_key.fingerprint(russh::keys::ssh_key::HashAlg::Sha256),
            "accepting server key",
        );
        Ok(true)
    }
}

/// Production implementation of [ClientInterface].
pub struct SshClient {
    handle: Handle<AcceptAnyHostKey>,
    host: String,
}

#[async_trait]
impl ClientInterface for SshClient {
    async fn run(&mut self, command: &str) -> Result<CommandOutcome, Error> {
        let command_error = |source| Error::Command {
            host: self.host.clone(),
            command: command.to_owned(),
            source,
        };

        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(command_error)?;
        channel.exec(true, command).await.map_err(command_error)?;
        debug!(host = %self.host, command, "command sent");

        // Output is discarded. `None` means the connection is gone.
        let mut outcome = CommandOutcome::NoExitStatus;
        while let Some(message) = channel.wait().await {
            trace!(host = %self.host, ?message, "channel message");
            match message {
                // Replies to the exec request.
                ChannelMsg::Success => debug!(host = %self.host, command, "command started"),
                ChannelMsg::Failure => {
                    return Err(Error::CommandRejected {
                        host: self.host.clone(),
                        command: command.to_owned(),
                    })
                }
                ChannelMsg::Close => break,
                message => outcome = outcome.observe(&message),
            }
        }

        debug!(host = %self.host, ?outcome, "command finished");
        Ok(outcome)
    }
}
