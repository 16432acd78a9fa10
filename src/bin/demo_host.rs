//! Stand-alone document host: serves the demo document as JSON lines on
//! stdin/stdout, for `canvas-console --host-cmd demo-host`.

use std::process;
use std::time::Duration;

use clap::Parser;

use canvas_console::bus::MessageBus;
use canvas_console::demo::{DemoDocument, DemoHost};
use canvas_console::logging;
use canvas_console::transport;

#[derive(Parser)]
#[command(
    name = "demo-host",
    about = "In-memory canvas document host speaking JSON lines on stdio",
    version
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (logs go to stderr)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Delay analytics replies by this many milliseconds to simulate a large
    /// document; 10000 or more makes the host answer with a timeout error
    #[arg(long)]
    analytics_delay_ms: Option<u64>,

    /// Answer `get-user-info` as if working offline
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_stderr_logging(&cli.log_level);

    let mut document = DemoDocument::sample();
    if cli.offline {
        document.user = None;
    }
    let mut host = DemoHost::new(document);
    if let Some(ms) = cli.analytics_delay_ms {
        host = host.with_analytics_delay(Duration::from_millis(ms));
    }

    let (console, endpoint) = MessageBus::channel();
    let serving = tokio::spawn(host.run(endpoint));
    if let Err(e) = transport::serve_stdio(console).await {
        tracing::error!(error = %e, "transport failed");
        process::exit(1);
    }
    serving.abort();
    tracing::info!("demo host stopped");
}
