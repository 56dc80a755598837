//! The error type shared by every stage of a reboot run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a reboot run.
///
/// Every variant is terminal. The run stops at the first one, and nothing after the failing host
/// is attempted.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller did not say which hosts to reboot.
    #[error("No hosts file passed")]
    MissingHosts,

    #[error("Can't read file {}: {source}", .path.display())]
    ReadHosts {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A non-blank line of the host list was neither `<host>` nor `<host> workload`.
    #[error("Can't parse host entry on line {line}: {entry}")]
    ParseHost { line: usize, entry: String },

    #[error("Can't read private key file {}: {source}", .path.display())]
    ReadKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The key file was readable but could not be decoded, e.g. because of a wrong passphrase.
    #[error("Can't parse private key file {}: {source}", .path.display())]
    ParseKey {
        path: PathBuf,
        #[source]
        source: russh::keys::Error,
    },

    #[error("Can't connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: russh::Error,
    },

    #[error("Timed out connecting to {host} after {:?}", .timeout)]
    ConnectTimeout {
        host: String,
        timeout: std::time::Duration,
    },

    #[error("{host} rejected public key authentication for user {user}")]
    AuthRejected { host: String, user: String },

    /// The command could not be delivered, e.g. the session channel failed to open.
    #[error("Can't run `{command}` on {host}: {source}")]
    Command {
        host: String,
        command: String,
        #[source]
        source: russh::Error,
    },

    /// The server refused to start the command.
    #[error("{host} refused to run `{command}`")]
    CommandRejected { host: String, command: String },

    #[error("`{command}` exited with exit code {code} on {host}")]
    CommandExited {
        host: String,
        command: String,
        code: u32,
    },

    #[error("`{command}` was killed by signal {signal} on {host}")]
    CommandSignaled {
        host: String,
        command: String,
        signal: String,
    },
}

impl Error {
    /// The process exit code for this error.
    ///
    /// A missing host list is a usage error and exits with 2, like any other bad invocation.
    /// Everything else exits with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::MissingHosts => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hosts_is_a_usage_error() {
        assert_eq!(2, Error::MissingHosts.exit_code());
    }

    #[test]
    fn other_errors_exit_with_one() {
        let err = Error::ParseHost {
            line: 3,
            entry: "a b c".to_string(),
        };
        assert_eq!(1, err.exit_code());

        let err = Error::CommandExited {
            host: "a".to_string(),
            command: "sudo reboot".to_string(),
            code: 1,
        };
        assert_eq!(1, err.exit_code());
    }

    #[test]
    fn parse_error_names_line_and_entry() {
        let err = Error::ParseHost {
            line: 3,
            entry: "a b c".to_string(),
        };
        assert_eq!("Can't parse host entry on line 3: a b c", err.to_string());
    }

    #[test]
    fn rejected_command_names_host_and_command() {
        let err = Error::CommandRejected {
            host: "a.example".to_string(),
            command: "sudo reboot".to_string(),
        };
        assert_eq!("a.example refused to run `sudo reboot`", err.to_string());
        assert_eq!(1, err.exit_code());
    }
}
