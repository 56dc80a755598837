//! Keeps the operator informed of progress on standard output.
//!
//! Each message has two halves: a method on the [Report] trait, and a free function that does the
//! actual formatting into any writer.
//! [Reporter] locks the real stdout and calls the free functions. Tests call the free functions
//! directly with a `Vec<u8>`, or swap in their own [Report] implementation to observe the order
//! of events.

use crate::hosts::Host;
use chrono::Local;
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;
use tracing::warn;

/// Receives progress events from a reboot run.
///
/// None of these can fail. Implementations that write somewhere fallible should swallow the
/// error; a lost status line must never abort a reboot in progress.
pub trait Report {
    /// A host is about to be rebooted.
    fn rebooting(&mut self, host: &Host);

    /// A reachability probe to a rebooting host failed.
    fn unreachable(&mut self, hostname: &str, error: &io::Error);

    /// A rebooting host accepted a connection again.
    fn online(&mut self, hostname: &str);

    /// The run is pausing before the next host.
    fn settling(&mut self, hostname: &str, delay: Duration);
}

/// The production [Report] implementation. Writes timestamped lines to stdout.
#[derive(Clone, Debug, Default)]
pub struct Reporter;

impl Reporter {
    fn write(&self, writer: impl FnOnce(&mut io::StdoutLock<'_>, &dyn Display) -> io::Result<()>) {
        let stamp = Local::now().format("%H:%M:%S");
        let mut stdout = io::stdout().lock();
        if let Err(err) = writer(&mut stdout, &stamp) {
            warn!(%err, "failed to write progress to stdout");
        }
    }
}

impl Report for Reporter {
    fn rebooting(&mut self, host: &Host) {
        self.write(|out, stamp| _rebooting(out, stamp, host));
    }

    fn unreachable(&mut self, hostname: &str, error: &io::Error) {
        self.write(|out, stamp| _unreachable(out, stamp, hostname, error));
    }

    fn online(&mut self, hostname: &str) {
        self.write(|out, stamp| _online(out, stamp, hostname));
    }

    fn settling(&mut self, hostname: &str, delay: Duration) {
        self.write(|out, stamp| _settling(out, stamp, hostname, delay));
    }
}

/// Writes the header for a host's reboot. A blank line separates it from the previous host.
pub fn _rebooting(mut out: impl Write, stamp: impl Display, host: &Host) -> io::Result<()> {
    let suffix = if host.workload { " (workload)" } else { "" };
    writeln!(out)?;
    writeln!(out, "[{stamp}] Rebooting {}{suffix}", host.hostname)
}

pub fn _unreachable(
    mut out: impl Write,
    stamp: impl Display,
    hostname: &str,
    error: &io::Error,
) -> io::Result<()> {
    writeln!(out, "[{stamp}] Host {hostname} is not reachable yet: {error}")
}

pub fn _online(mut out: impl Write, stamp: impl Display, hostname: &str) -> io::Result<()> {
    writeln!(out, "[{stamp}] Host {hostname} is back online")
}

pub fn _settling(
    mut out: impl Write,
    stamp: impl Display,
    hostname: &str,
    delay: Duration,
) -> io::Result<()> {
    writeln!(
        out,
        "[{stamp}] Waiting {}s after {hostname} before continuing",
        delay.as_secs(),
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    const STAMP: &str = "12:34:56";

    fn written(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn rebooting_starts_with_blank_line() {
        let host = Host {
            hostname: "a.example".to_string(),
            workload: false,
        };
        let text = written(|out| _rebooting(out, STAMP, &host));
        assert_eq!("\n[12:34:56] Rebooting a.example\n", text);
    }

    #[test]
    fn rebooting_marks_workload_hosts() {
        let host = Host {
            hostname: "b.example".to_string(),
            workload: true,
        };
        let text = written(|out| _rebooting(out, STAMP, &host));
        assert!(text.ends_with("Rebooting b.example (workload)\n"));
    }

    #[test]
    fn unreachable_includes_error() {
        let error = io::Error::from(io::ErrorKind::ConnectionRefused);
        let text = written(|out| _unreachable(out, STAMP, "a.example", &error));
        assert!(text.starts_with("[12:34:56] Host a.example is not reachable yet: "));
        assert!(text.contains(&error.to_string()));
    }

    #[test]
    fn online() {
        let text = written(|out| _online(out, STAMP, "a.example"));
        assert_eq!("[12:34:56] Host a.example is back online\n", text);
    }

    #[test]
    fn settling_shows_whole_seconds() {
        let text = written(|out| _settling(out, STAMP, "a.example", Duration::from_secs(5)));
        assert_eq!(
            "[12:34:56] Waiting 5s after a.example before continuing\n",
            text,
        );
    }
}
