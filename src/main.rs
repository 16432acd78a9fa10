use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use canvas_console::bridge::Bridge;
use canvas_console::bus::MessageBus;
use canvas_console::controller::{ConsoleController, Submission};
use canvas_console::demo::{DemoDocument, DemoHost};
use canvas_console::logging;
use canvas_console::paths;
use canvas_console::settings::{self, ConsoleSettings};
use canvas_console::state::ConsoleState;
use canvas_console::transcript::TranscriptEntry;
use canvas_console::transport::HostProcess;

/// How long to wait for in-flight commands once input has ended.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "canvas-console",
    about = "Interactive command console for a canvas document host",
    version
)]
struct Cli {
    /// Config directory override
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Run this program as the document host, talking JSON lines on its stdio.
    /// Without it an in-process demo document answers.
    #[arg(long)]
    host_cmd: Option<String>,

    /// Argument passed to the host program (repeatable)
    #[arg(long = "host-arg", requires = "host_cmd")]
    host_args: Vec<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Deadline for `analytics` in milliseconds; 0 waits forever
    #[arg(long)]
    analytics_timeout_ms: Option<u64>,

    /// Show host `error` replies as command errors instead of waiting them out
    #[arg(long)]
    surface_host_errors: bool,

    /// Run this line and exit instead of reading stdin (repeatable, run in order)
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,
}

impl Cli {
    fn apply_to(&self, settings: &mut ConsoleSettings) {
        if let Some(level) = &self.log_level {
            settings.log_level.clone_from(level);
        }
        if let Some(ms) = self.analytics_timeout_ms {
            settings.analytics_timeout_ms = (ms > 0).then_some(ms);
        }
        if self.surface_host_errors {
            settings.surface_host_errors = true;
        }
    }
}

// ── Output ───────────────────────────────────────────────────────

struct Screen {
    prompt: String,
    ansi: bool,
}

impl Screen {
    fn entry(&self, entry: &TranscriptEntry) {
        let mut out = std::io::stdout().lock();
        if !entry.command.is_empty() {
            let _ = writeln!(out, "{} {}", self.prompt, entry.command);
        }
        if entry.output.is_empty() {
            return;
        }
        if entry.is_error && self.ansi {
            let _ = writeln!(out, "\x1b[31m{}\x1b[0m", entry.output);
        } else {
            let _ = writeln!(out, "{}", entry.output);
        }
    }

    fn prompt(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "{} ", self.prompt);
        let _ = out.flush();
    }

    fn clear(&self) {
        if self.ansi {
            print!("\x1b[2J\x1b[H");
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);

    let mut settings = settings::load_settings(&config_dir).unwrap_or_else(|e| {
        eprintln!("[canvas-console] {e}; using default settings");
        ConsoleSettings::default()
    });
    cli.apply_to(&mut settings);

    if let Err(e) = logging::init_file_logging(&config_dir, &settings.log_level) {
        eprintln!("[canvas-console] {e}");
    }
    tracing::info!(config_dir = %config_dir.display(), "console starting");

    let (console, host) = MessageBus::channel();
    let host_process = match &cli.host_cmd {
        Some(command) => match HostProcess::spawn(command, &cli.host_args, host) {
            Ok(process) => Some(process),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => {
            tokio::spawn(DemoHost::new(DemoDocument::sample()).run(host));
            None
        }
    };

    let screen = Screen {
        prompt: settings.prompt.clone(),
        ansi: std::io::stdout().is_terminal(),
    };
    let state = Arc::new(ConsoleState::new(Bridge::new(console), settings));
    let mut controller = ConsoleController::new(state);
    for entry in controller.transcript().entries() {
        screen.entry(entry);
    }

    if cli.commands.is_empty() {
        interactive(&mut controller, &screen).await;
    } else {
        scripted(&mut controller, &screen, &cli.commands).await;
    }

    if let Some(process) = host_process {
        process.shutdown().await;
    }
    tracing::info!("console stopped");
}

/// Read lines from stdin while results stream in as they settle.
async fn interactive(controller: &mut ConsoleController, screen: &Screen) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    screen.prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    match controller.submit(&line) {
                        Submission::Cleared => screen.clear(),
                        Submission::Ignored | Submission::Dispatched { .. } => {}
                    }
                    if controller.in_flight() == 0 {
                        screen.prompt();
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                }
            },
            Some(entry) = controller.next_completion(), if controller.in_flight() > 0 => {
                screen.entry(&entry);
                if controller.is_closing() {
                    return;
                }
                screen.prompt();
            }
        }
    }
    drain(controller, screen).await;
}

/// Run each line to completion before the next.
async fn scripted(controller: &mut ConsoleController, screen: &Screen, commands: &[String]) {
    for line in commands {
        if controller.submit(line) == Submission::Cleared {
            screen.clear();
        }
        while let Some(entry) = controller.next_completion().await {
            screen.entry(&entry);
        }
        if controller.is_closing() {
            break;
        }
    }
}

async fn drain(controller: &mut ConsoleController, screen: &Screen) {
    while controller.in_flight() > 0 {
        match tokio::time::timeout(DRAIN_GRACE, controller.next_completion()).await {
            Ok(Some(entry)) => screen.entry(&entry),
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    pending = controller.in_flight(),
                    "giving up on unanswered commands"
                );
                break;
            }
        }
    }
}
