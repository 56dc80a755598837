//! Command-line options and the fixed timings of a reboot run.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// How long to wait for the SSH connection, handshake and authentication to complete.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a single reachability probe may take before it counts as a failure.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait between reachability probes.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait after a host is back online before moving on to the next one.
pub const INTER_HOST_DELAY: Duration = Duration::from_secs(5);

pub const DEFAULT_USER: &str = "root";

pub const DEFAULT_PORT: u16 = 22;

/// Timings for the wait loops of a run.
///
/// Production code uses [Pacing::default]. Tests shrink these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub inter_host_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            probe_interval: PROBE_INTERVAL,
            probe_timeout: PROBE_TIMEOUT,
            inter_host_delay: INTER_HOST_DELAY,
        }
    }
}

/// Returns `~/.ssh/id_rsa`, or a relative `.ssh/id_rsa` if the home directory is unknown.
pub fn default_key_path() -> PathBuf {
    let mut path = home::home_dir().unwrap_or_default();
    path.push(".ssh");
    path.push("id_rsa");
    path
}

/// Reboot machines one at a time, waiting for each to come back before moving on.
#[derive(Clone, Debug, Parser)]
#[command(name = "rollboot", version)]
pub struct Options {
    /// SSH user name
    #[arg(long, default_value = DEFAULT_USER)]
    pub user: String,

    /// Path to private key file
    #[arg(long, default_value_os_t = default_key_path())]
    pub key: PathBuf,

    /// Passphrase for private key
    #[arg(long, default_value = "")]
    pub passphrase: String,

    /// SSH port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// File with list of hosts to reboot
    #[arg(long)]
    pub hosts: Option<PathBuf>,
}

impl Options {
    /// Parses options from the process arguments, accepting single-dash long flags.
    ///
    /// Exits the process with status 2 on malformed arguments, as clap does.
    pub fn from_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// The passphrase, or [None] if it was left empty.
    pub fn passphrase(&self) -> Option<&str> {
        match self.passphrase.as_str() {
            "" => None,
            passphrase => Some(passphrase),
        }
    }
}

/// The long flags that may also be spelled with a single dash, e.g. `-hosts`.
const LONG_FLAGS: [&str; 5] = ["user", "key", "passphrase", "port", "hosts"];

/// Rewrites single-dash long flags (`-hosts file`, `-port=2222`) into their double-dash form.
///
/// Everything else, including the program name and flag values, passes through untouched. A
/// value that happens to look like a flag, e.g. the passphrase `-key`, is only left alone when
/// it follows a flag that takes a value, which is every flag in [LONG_FLAGS].
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut expect_value = false;

    for arg in args.into_iter().map(Into::into) {
        if expect_value {
            expect_value = false;
            normalized.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        let rewritten = match text.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') => {
                let (name, inline_value) = match rest.split_once('=') {
                    Some((name, _)) => (name, true),
                    None => (rest, false),
                };
                if LONG_FLAGS.contains(&name) {
                    expect_value = !inline_value;
                    Some(OsString::from(format!("-{text}")))
                } else {
                    None
                }
            }
            Some(rest) => {
                let name = rest[1..].split('=').next().unwrap_or_default();
                expect_value = LONG_FLAGS.contains(&name) && !rest.contains('=');
                None
            }
            None => None,
        };

        normalized.push(rewritten.unwrap_or(arg));
    }

    normalized
}
