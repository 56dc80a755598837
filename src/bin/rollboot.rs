use rollboot::app;
use rollboot::client::SshConnector;
use rollboot::config::{Options, Pacing};
use rollboot::reachability::TcpProbe;
use rollboot::report::Reporter;
use std::io;
use std::process::ExitCode;
use tokio::runtime;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let options = Options::from_env();
    let pacing = Pacing::default();
    let mut probe = TcpProbe::new(pacing.probe_timeout);

    // Hosts are handled strictly one after another.
    let runtime = runtime::Builder::new_current_thread().enable_all().build()?;
    let result = runtime.block_on(app::run(
        &options,
        &mut SshConnector,
        &mut probe,
        &mut Reporter,
        &pacing,
    ));

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            println!("{err}");
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}
