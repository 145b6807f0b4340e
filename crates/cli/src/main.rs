//! padctl - PS/2 touchpad probe console
//!
//! Opens a PS/2-style pad device and drops into an interactive console for
//! running scripted command exchanges and watching decoded telemetry.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod output;
mod repl;
mod transport;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padprobe_engine::{EngineCommand, EngineConfig};
use ps2_pad_protocol::CommandCatalog;

#[derive(Parser)]
#[command(name = "padctl")]
#[command(about = "Interactive console for probing PS/2 touchpads")]
#[command(version)]
#[command(long_about = "
padctl opens a PS/2-style pad device and drops into a console. Catalog
commands (init_ps2, byd_detect, ...) run scripted exchanges against the
pad; a bare hex byte is sent raw. Telemetry frames arriving between
commands are decoded and printed as they appear. `help` lists everything.
")]
struct Cli {
    /// Pad device node, e.g. a serio raw node or serial adapter
    device: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Send-side re-poll interval while an exchange awaits a reply
    #[arg(long, value_name = "MS", default_value_t = 250)]
    poll_interval_ms: u64,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("padctl={}", log_level(cli.verbose)).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(error) => {
            output::print_error(&error);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let catalog = CommandCatalog::builtin().context("building command catalog")?;
    let (writer, inbound) = transport::open_device(&cli.device)?;
    let config = EngineConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    };
    let (handle, events, engine) = padprobe_engine::spawn(catalog.clone(), writer, inbound, config);

    let printer = tokio::spawn(output::print_events(events));

    let console_handle = handle.clone();
    tokio::task::spawn_blocking(move || repl::run(console_handle, catalog))
        .await
        .context("console thread panicked")??;

    // Console is done; stop the engine, which closes the event stream and
    // lets the printer drain.
    let _ = handle.send(EngineCommand::Shutdown).await;
    engine.await.context("engine task panicked")?;
    let transport_closed = printer.await.context("printer task panicked")?;
    if transport_closed {
        anyhow::bail!("pad device connection lost");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_device_with_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["padctl", "/dev/ttyS0"])?;
        assert_eq!(cli.device, PathBuf::from("/dev/ttyS0"));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.poll_interval_ms, 250);
        Ok(())
    }

    #[test]
    fn parse_verbose_levels() -> TestResult {
        let cli1 = Cli::try_parse_from(["padctl", "-v", "/dev/ttyS0"])?;
        assert_eq!(cli1.verbose, 1);

        let cli2 = Cli::try_parse_from(["padctl", "-vv", "/dev/ttyS0"])?;
        assert_eq!(cli2.verbose, 2);

        let cli3 = Cli::try_parse_from(["padctl", "/dev/ttyS0", "-vvv"])?;
        assert_eq!(cli3.verbose, 3);
        Ok(())
    }

    #[test]
    fn parse_poll_interval() -> TestResult {
        let cli = Cli::try_parse_from(["padctl", "--poll-interval-ms", "100", "/dev/ttyS0"])?;
        assert_eq!(cli.poll_interval_ms, 100);
        Ok(())
    }

    #[test]
    fn reject_missing_device() {
        assert!(Cli::try_parse_from(["padctl"]).is_err());
    }

    #[test]
    fn reject_unknown_flag() {
        assert!(Cli::try_parse_from(["padctl", "/dev/ttyS0", "--json"]).is_err());
    }

    #[test]
    fn reject_non_numeric_poll_interval() {
        assert!(Cli::try_parse_from(["padctl", "--poll-interval-ms", "soon", "/dev/ttyS0"]).is_err());
    }

    #[test]
    fn log_level_mapping() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(2), "debug");
        assert_eq!(log_level(3), "trace");
        assert_eq!(log_level(9), "trace");
    }
}
