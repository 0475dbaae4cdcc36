//! fyteclub-daemon: the standalone syncshell process.
//!
//! A single OS process holding one profile's identity and index database.
//! The UI surface for this build is the CLI (§6); a full desktop
//! integration drives the same library crates through its own shell.

use fyteclub_daemon::config::FyteclubConfig;
use fyteclub_daemon::{commands, DaemonContext};
use tracing::info;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("FYTECLUB_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_env("RUST_LOG"))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fyteclub=info")),
        )
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::ExitCode::from(exit_code_for(&err))
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = FyteclubConfig::load()?;
    let data_dir = config.data_dir();

    info!(?data_dir, "fyteclub daemon starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut ctx = DaemonContext::bootstrap(data_dir, config.storage.store_capacity_bytes)?;

    commands::dispatch(&mut ctx, &args)?;
    Ok(())
}

/// `anyhow::Error` erases the original type by the time it reaches `main`;
/// recover the daemon's own exit code when the chain's root cause is a
/// `DaemonError`, and fall back to a generic crypto-adjacent failure code
/// otherwise (this binary's errors are dominated by identity/crypto setup).
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<fyteclub_daemon::DaemonError>()
        .map(|e| e.exit_code() as u8)
        .unwrap_or(3)
}
