//! Reads the list of hosts to reboot.
//!
//! The host list is a plain text file with one entry per line. Each entry is either a bare host
//! name or a host name followed by a single space and the word `workload`:
//!
//! ```text
//! db1.example
//! worker1.example workload
//! ```
//!
//! Surrounding white space is ignored, and so are blank lines. Anything else is an error, and no
//! partial list is returned.

use crate::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// The second token that marks a host as running workloads.
pub const WORKLOAD_MARKER: &str = "workload";

/// One entry in the host list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    /// The name or address used both for SSH and for the reachability probe.
    pub hostname: String,

    /// Whether the entry carried the [WORKLOAD_MARKER].
    pub workload: bool,
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hostname)
    }
}

/// Reads and parses the host list at `path`.
pub fn load_hosts(path: impl AsRef<Path>) -> Result<Vec<Host>, Error> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| Error::ReadHosts {
        path: path.to_owned(),
        source,
    })?;
    parse_hosts(&contents)
}

/// Parses the contents of a host list, preserving file order.
pub fn parse_hosts(contents: &str) -> Result<Vec<Host>, Error> {
    let mut hosts = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split(' ').collect();
        let host = match tokens[..] {
            [hostname] => Host {
                hostname: hostname.to_string(),
                workload: false,
            },
            [hostname, WORKLOAD_MARKER] => Host {
                hostname: hostname.to_string(),
                workload: true,
            },
            _ => {
                return Err(Error::ParseHost {
                    line: index + 1,
                    entry: line.to_string(),
                })
            }
        };
        hosts.push(host);
    }

    Ok(hosts)
}
