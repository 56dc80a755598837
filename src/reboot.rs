//! Reboots hosts one at a time.
//!
//! For each host, in order: connect over SSH, run [REBOOT_COMMAND], wait for the host to accept
//! connections on the SSH port again, then pause for [Pacing::inter_host_delay]. The first error
//! ends the run; later hosts are never touched.

use crate::auth::AuthConfig;
use crate::client::{ClientInterface, CommandOutcome, ManageClient};
use crate::config::Pacing;
use crate::hosts::Host;
use crate::reachability::{wait_for_host, Probe};
use crate::report::Report;
use crate::Error;
use tokio::time;
use tracing::{debug, info};

/// The command that reboots a host.
pub const REBOOT_COMMAND: &str = "sudo reboot";

/// Runs `command` on `client` and decides whether the host is rebooting.
///
/// The SSH server usually dies before it can report an exit status, so
/// [CommandOutcome::NoExitStatus] counts as success along with a clean exit.
pub async fn reboot_host<CI>(client: &mut CI, hostname: &str, command: &str) -> Result<(), Error>
where
    CI: ClientInterface + ?Sized,
{
    match client.run(command).await? {
        CommandOutcome::Success | CommandOutcome::NoExitStatus => Ok(()),
        CommandOutcome::ExitStatus(code) => Err(Error::CommandExited {
            host: hostname.to_owned(),
            command: command.to_owned(),
            code,
        }),
        CommandOutcome::Signal(signal) => Err(Error::CommandSignaled {
            host: hostname.to_owned(),
            command: command.to_owned(),
            signal,
        }),
    }
}

/// Reboots a single host and waits until it is reachable again.
pub async fn process_host<M, CI, P, R>(
    manager: &mut M,
    probe: &mut P,
    reporter: &mut R,
    host: &Host,
    port: u16,
    auth: &AuthConfig,
    pacing: &Pacing,
) -> Result<(), Error>
where
    M: ManageClient<CI> + ?Sized,
    CI: ClientInterface,
    P: Probe + ?Sized,
    R: Report + ?Sized,
{
    reporter.rebooting(host);

    let mut client = manager.connect(&host.hostname, port, auth).await?;
    reboot_host(&mut client, &host.hostname, REBOOT_COMMAND).await?;
    drop(client);
    debug!(host = %host, "reboot issued");

    wait_for_host(probe, reporter, &host.hostname, port, pacing.probe_interval).await;
    Ok(())
}

/// Reboots every host in order, stopping at the first error.
///
/// The same `auth` is used for every connection. After each host, including the last, the run
/// pauses for [Pacing::inter_host_delay].
pub async fn reboot_hosts<M, CI, P, R>(
    hosts: &[Host],
    port: u16,
    auth: &AuthConfig,
    manager: &mut M,
    probe: &mut P,
    reporter: &mut R,
    pacing: &Pacing,
) -> Result<(), Error>
where
    M: ManageClient<CI> + ?Sized,
    CI: ClientInterface,
    P: Probe + ?Sized,
    R: Report + ?Sized,
{
    for (index, host) in hosts.iter().enumerate() {
        info!(host = %host, position = index + 1, total = hosts.len(), "processing host");
        process_host(manager, probe, reporter, host, port, auth, pacing).await?;

        reporter.settling(&host.hostname, pacing.inter_host_delay);
        time::sleep(pacing.inter_host_delay).await;
    }
    Ok(())
}
