//! Wangsaf terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! # Connect on startup
//! wangsaf --server 127.0.0.1 --port 8888 --username alice
//!
//! # Start disconnected, then type `/connect 127.0.0.1 alice`
//! wangsaf
//! ```
//!
//! Typed lines are chat messages; `/w <user> <message>` whispers, and
//! `/connect`, `/disconnect` and `/quit` control the session. Logs go to
//! stderr, filtered by `RUST_LOG` or `--log-level`.

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wangsaf_app::{App, Runtime};
use wangsaf_cli::{Args, CliError, LineFrontend};
use wangsaf_client::TcpConnector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    tracing::info!(server = %args.server, port = args.port, "Wangsaf client starting");

    let username = args.username.clone().unwrap_or_default();
    let app = App::new(args.server.clone(), args.port, username);
    let frontend = LineFrontend::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    let mut runtime = Runtime::new(app, TcpConnector, args.session_config(), frontend);

    if args.username.is_some() {
        runtime.connect().await?;
    }

    runtime.run().await?;
    Ok(())
}

fn init_logging(level: &str) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
