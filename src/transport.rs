//! JSON-lines transport that carries bus traffic across a process boundary.
//!
//! Each line is one message wrapped as `{"pluginMessage": {...}}`. Bare
//! messages without the wrapper are accepted on input. Lines that do not
//! decode are logged and dropped.

use std::process::Stdio;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::bus::{ConsoleEndpoint, HostEndpoint, Replier};
use crate::error::ConsoleError;
use crate::protocol::{Envelope, HostReply, HostRequest};

/// Serialize one message as an enveloped JSON line (without the newline).
pub fn encode<T: Serialize>(message: &T) -> Result<String, ConsoleError> {
    Ok(serde_json::to_string(&Envelope {
        plugin_message: message,
    })?)
}

/// Strip the `pluginMessage` wrapper when present.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("pluginMessage") => {
            map.remove("pluginMessage").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode one line, enveloped or bare.
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, ConsoleError> {
    let value: Value = serde_json::from_str(line)?;
    Ok(serde_json::from_value(unwrap_envelope(value))?)
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

// ── Console side ────────────────────────────────────────────────

/// Forward every console request to `writer` until the console goes away.
pub async fn pump_requests<W>(host: &mut HostEndpoint, mut writer: W) -> Result<(), ConsoleError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(request) = host.next_request().await {
        let line = encode(&request)?;
        tracing::trace!(%line, "-> host");
        write_line(&mut writer, &line).await?;
    }
    Ok(())
}

/// Post every reply read from `reader` onto the bus. The bus is closed when
/// the stream ends so pending requests settle instead of hanging.
pub async fn pump_replies<R>(reader: R, replier: Replier)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match decode::<HostReply>(&line) {
                Ok(reply) => {
                    tracing::trace!(%line, "<- host");
                    replier.reply(&reply);
                }
                Err(e) => tracing::warn!(%line, error = %e, "dropping malformed host message"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "host stream read failed");
                break;
            }
        }
    }
    tracing::info!("host stream ended");
    replier.close();
}

/// A host running as a child process, talking JSON lines on its stdio.
pub struct HostProcess {
    child: Child,
    tasks: Vec<JoinHandle<()>>,
}

impl HostProcess {
    /// Spawn `command` and wire its stdio to the host side of the bus. The
    /// child's stderr goes to the log.
    pub fn spawn(
        command: &str,
        args: &[String],
        mut host: HostEndpoint,
    ) -> Result<Self, ConsoleError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConsoleError::Io {
                message: format!("Failed to spawn host process '{command}': {e}"),
            })?;
        tracing::info!(command, pid = ?child.id(), "host process started");

        let missing = |stream: &str| ConsoleError::Io {
            message: format!("Failed to capture host {stream}"),
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let mut tasks = Vec::with_capacity(3);
        tasks.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!(target: "host", "{line}");
            }
        }));
        tasks.push(tokio::spawn(pump_replies(BufReader::new(stdout), host.replier())));
        tasks.push(tokio::spawn(async move {
            if let Err(e) = pump_requests(&mut host, stdin).await {
                tracing::warn!(error = %e, "writing to host failed");
                host.replier().close();
            }
        }));

        Ok(Self { child, tasks })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the child and stop the pumps.
    pub async fn shutdown(mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Err(e) = self.child.kill().await {
            tracing::debug!(error = %e, "host process already gone");
        }
    }
}

// ── Host side ───────────────────────────────────────────────────

fn unsupported(line: &str, error: &ConsoleError) -> HostReply {
    let kind = serde_json::from_str::<Value>(line)
        .ok()
        .map(unwrap_envelope)
        .and_then(|v| v.get("type").and_then(Value::as_str).map(str::to_string));
    let message = match kind {
        Some(kind) => format!("Unsupported message type: {kind}"),
        None => error.to_string(),
    };
    HostReply::Error {
        context: "processing message".into(),
        message: format!("Error processing message: {message}"),
    }
}

/// Serve a host that lives behind `console`: requests read from `reader` are
/// sent on the bus, every reply the bus sees is written to `writer`. Returns
/// when the input ends (the console is gone) or the bus closes.
pub async fn serve_lines<R, W>(
    console: ConsoleEndpoint,
    reader: R,
    mut writer: W,
) -> Result<(), ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut replies = console.subscribe(|_| true);
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match decode::<HostRequest>(&line) {
                    Ok(request) => console.send(request)?,
                    Err(e) => {
                        tracing::warn!(%line, error = %e, "unsupported request");
                        write_line(&mut writer, &encode(&unsupported(&line, &e))?).await?;
                    }
                },
                None => break,
            },
            reply = replies.recv() => match reply {
                Some(reply) => write_line(&mut writer, &encode(&reply)?).await?,
                None => break,
            },
        }
    }
    Ok(())
}

/// [`serve_lines`] over this process's stdin and stdout.
pub async fn serve_stdio(console: ConsoleEndpoint) -> Result<(), ConsoleError> {
    serve_lines(
        console,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}
