//! Rolling reboots over SSH.
//!
//! Reboots a list of machines one at a time. Each machine is rebooted with `sudo reboot` over an
//! SSH connection, and the next machine is only touched once the previous one accepts TCP
//! connections on the SSH port again.
//!
//! # Program flow
//!
//! 1. [hosts::load_hosts] reads the host list.
//! 2. [auth::AuthConfig::from_key_file] loads the private key once for the whole run.
//! 3. [reboot::reboot_hosts] walks the list in order. For each host it connects through
//!    [client::ManageClient], runs the reboot command through [client::ClientInterface], waits
//!    in [reachability::wait_for_host], and pauses before the next host.
//!
//! [app::run] strings these together for the `rollboot` binary. The first error ends the run.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod hosts;
pub mod reachability;
pub mod reboot;
pub mod report;

#[doc(inline)]
pub use error::Error;

#[doc(inline)]
pub use hosts::Host;
