//! Ties the command-line options to a reboot run.

use crate::auth::AuthConfig;
use crate::client::{ClientInterface, ManageClient};
use crate::config::{Options, Pacing};
use crate::hosts::load_hosts;
use crate::reachability::Probe;
use crate::reboot::reboot_hosts;
use crate::report::Report;
use crate::Error;
use tracing::info;

/// Runs a whole reboot according to `options`.
///
/// The host list is loaded before the key, so a bad host list is reported without touching the
/// key file. Nothing connects until both have loaded successfully.
pub async fn run<M, CI, P, R>(
    options: &Options,
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
    let hosts_path = options.hosts.as_ref().ok_or(Error::MissingHosts)?;
    let hosts = load_hosts(hosts_path)?;
    info!(path = %hosts_path.display(), count = hosts.len(), "loaded host list");

    let auth = AuthConfig::from_key_file(&options.key, options.passphrase(), &options.user)?;

    reboot_hosts(&hosts, options.port, &auth, manager, probe, reporter, pacing).await?;
    info!(count = hosts.len(), "all hosts rebooted");
    Ok(())
}
