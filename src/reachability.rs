//! Waits for a rebooting host to accept TCP connections again.

use crate::report::Report;
use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use tracing::trace;

/// A single reachability check.
#[async_trait]
pub trait Probe {
    /// Try once to reach `host` on `port`. Any resources used for the check are released before
    /// returning.
    async fn probe(&mut self, host: &str, port: u16) -> io::Result<()>;
}

/// Production implementation of [Probe]. Opens and immediately closes a TCP connection.
#[derive(Clone, Copy, Debug)]
pub struct TcpProbe {
    /// How long one connection attempt may take.
    pub timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&mut self, host: &str, port: u16) -> io::Result<()> {
        let stream = time::timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                io::Error::new(
                    ErrorKind::TimedOut,
                    format!("no answer within {}ms", self.timeout.as_millis()),
                )
            })??;
        drop(stream);
        Ok(())
    }
}

/// Blocks until `probe` reaches `host` on `port`, trying once every `interval`.
///
/// There is no upper bound on how long this waits. A host that never comes back keeps the run
/// here until the process is killed.
pub async fn wait_for_host<P, R>(
    probe: &mut P,
    reporter: &mut R,
    host: &str,
    port: u16,
    interval: Duration,
) where
    P: Probe + ?Sized,
    R: Report + ?Sized,
{
    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        match probe.probe(host, port).await {
            Ok(()) => break,
            Err(err) => {
                trace!(host, port, attempts, %err, "probe failed");
                reporter.unreachable(host, &err);
                time::sleep(interval).await;
            }
        }
    }
    trace!(host, port, attempts, "probe succeeded");
    reporter.online(host);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{Event, TestReporter};
    use std::collections::VecDeque;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    // A Probe that replays scripted results and panics if asked for more.
    struct ScriptedProbe {
        results: VecDeque<io::Result<()>>,
        calls: Vec<(String, u16)>,
    }

    impl ScriptedProbe {
        // Fails `failures` times, then succeeds once.
        fn new(failures: usize) -> Self {
            let mut results: VecDeque<_> = (0..failures)
                .map(|_| Err(io::Error::from(ErrorKind::ConnectionRefused)))
                .collect();
            results.push_back(Ok(()));
            Self {
                results,
                calls: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn probe(&mut self, host: &str, port: u16) -> io::Result<()> {
            self.calls.push((host.to_string(), port));
            self.results
                .pop_front()
                .expect("probe called after it already succeeded")
        }
    }

    // Returns a local port with nothing listening on it.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    mod wait_for_host {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn returns_on_first_success() {
            let mut probe = ScriptedProbe::new(0);
            let mut reporter = TestReporter::new();

            wait_for_host(&mut probe, &mut reporter, "a", 22, Duration::from_secs(1)).await;

            assert_eq!(vec![("a".to_string(), 22)], probe.calls);
            assert_eq!(vec![Event::Online("a".to_string())], reporter.events);
        }

        #[tokio::test(start_paused = true)]
        async fn retries_every_interval_until_success() {
            let mut probe = ScriptedProbe::new(3);
            let mut reporter = TestReporter::new();
            let start = time::Instant::now();

            wait_for_host(&mut probe, &mut reporter, "a", 22, Duration::from_secs(1)).await;

            assert_eq!(4, probe.calls.len());
            assert_eq!(3, reporter.unreachable_count());
            assert_eq!(Some(&Event::Online("a".to_string())), reporter.events.last());
            assert!(start.elapsed() >= Duration::from_secs(3));
        }

        #[tokio::test]
        async fn never_returns_while_host_refuses() {
            let port = closed_port().await;
            let mut probe = TcpProbe::new(Duration::from_millis(200));
            let mut reporter = TestReporter::new();

            let result = time::timeout(
                Duration::from_millis(500),
                wait_for_host(
                    &mut probe,
                    &mut reporter,
                    "127.0.0.1",
                    port,
                    Duration::from_millis(50),
                ),
            )
            .await;

            assert!(result.is_err(), "wait_for_host returned for a closed port");
            assert!(reporter.unreachable_count() >= 3);
            assert!(!reporter.events.contains(&Event::Online("127.0.0.1".to_string())));
        }

        #[tokio::test]
        async fn returns_once_host_starts_listening() {
            let port = closed_port().await;

            // Start listening after a few probes have been refused, then accept exactly one
            // connection and read it to EOF.
            let server = tokio::spawn(async move {
                time::sleep(Duration::from_millis(300)).await;
                let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf).await.unwrap();
                buf.len()
            });

            let mut probe = TcpProbe::new(Duration::from_millis(200));
            let mut reporter = TestReporter::new();
            time::timeout(
                Duration::from_secs(5),
                wait_for_host(
                    &mut probe,
                    &mut reporter,
                    "127.0.0.1",
                    port,
                    Duration::from_millis(50),
                ),
            )
            .await
            .expect("wait_for_host did not return after the host came back");

            // The probe closed its socket without sending anything.
            let received = time::timeout(Duration::from_secs(5), server)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(0, received);

            assert!(reporter.unreachable_count() >= 1);
            let online: Vec<_> = reporter
                .events
                .iter()
                .filter(|e| matches!(e, Event::Online(_)))
                .collect();
            assert_eq!(1, online.len());
            assert_eq!(Some(&Event::Online("127.0.0.1".to_string())), reporter.events.last());
        }
    }

    mod tcp_probe {
        use super::*;

        #[tokio::test]
        async fn refused_connection_is_error() {
            let port = closed_port().await;
            let mut probe = TcpProbe::new(Duration::from_secs(1));
            assert!(probe.probe("127.0.0.1", port).await.is_err());
        }

        #[tokio::test]
        async fn listening_port_is_reachable() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let mut probe = TcpProbe::new(Duration::from_secs(1));
            assert!(probe.probe("127.0.0.1", port).await.is_ok());
        }
    }
}
