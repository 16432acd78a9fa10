//! Console session driver: input, history, transcript and in-flight commands.
//!
//! Submissions never wait for each other. Each one becomes a future in a
//! [`FuturesUnordered`]; results join the transcript as they settle, so a fast
//! command submitted after a slow one can be shown first.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};

use crate::history::{Direction, History};
use crate::input::{InputLine, Key};
use crate::parser;
use crate::registry::{self, CommandName};
use crate::state::ConsoleState;
use crate::transcript::{CommandResult, Transcript, TranscriptEntry};

/// Coarse controller state. `Dispatching` while any command is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
}

/// What a submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank line: nothing recorded.
    Ignored,
    /// `clear`: transcript wiped, nothing recorded.
    Cleared,
    /// Recorded in history and started; `seq` counts submissions.
    Dispatched { seq: u64 },
}

struct Completion {
    seq: u64,
    result: CommandResult,
    closes: bool,
}

/// Run one command, turning a panic inside it into an error entry so the
/// session survives.
async fn guarded<F>(seq: u64, input: &str, run: F) -> CommandResult
where
    F: Future<Output = CommandResult>,
{
    AssertUnwindSafe(run).catch_unwind().await.unwrap_or_else(|_| {
        tracing::error!(seq, command = %input, "command handler panicked");
        CommandResult::error(input, "Error executing command: handler panicked")
    })
}

pub struct ConsoleController {
    state: Arc<ConsoleState>,
    history: History,
    transcript: Transcript,
    input: InputLine,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    next_seq: u64,
    closing: bool,
}

impl ConsoleController {
    /// New session whose transcript starts with the configured greeting.
    pub fn new(state: Arc<ConsoleState>) -> Self {
        let mut transcript = Transcript::new();
        if !state.settings.greeting.is_empty() {
            transcript.push(CommandResult::ok("", state.settings.greeting.clone()));
        }
        Self {
            state,
            history: History::new(),
            transcript,
            input: InputLine::new(),
            in_flight: FuturesUnordered::new(),
            next_seq: 1,
            closing: false,
        }
    }

    /// Accept one line. Returns immediately; the result shows up through
    /// [`next_completion`](Self::next_completion).
    pub fn submit(&mut self, line: &str) -> Submission {
        let Some(parsed) = parser::parse(line) else {
            return Submission::Ignored;
        };
        let input = line.trim().to_string();
        if input == "clear" {
            self.transcript.clear();
            tracing::debug!(in_flight = self.in_flight.len(), "transcript cleared");
            return Submission::Cleared;
        }

        self.history.push(input.clone());
        let seq = self.next_seq;
        self.next_seq += 1;
        let exits = CommandName::from_name(&parsed.name) == Some(CommandName::Exit);
        tracing::info!(seq, command = %input, "dispatching");

        let state = Arc::clone(&self.state);
        let task = async move {
            let run = registry::execute(state, &input, parsed);
            let result = guarded(seq, &input, run).await;
            Completion {
                seq,
                closes: exits && !result.is_error,
                result,
            }
        };
        self.in_flight.push(task.boxed());
        Submission::Dispatched { seq }
    }

    /// Feed one key to the input line; `Enter` submits.
    pub fn handle_key(&mut self, key: Key) -> Submission {
        match self.input.apply(key, &mut self.history) {
            Some(line) => self.submit(&line),
            None => Submission::Ignored,
        }
    }

    /// Step through history and show the recalled line in the input.
    pub fn navigate_history(&mut self, direction: Direction) -> Option<&str> {
        let key = match direction {
            Direction::Up => Key::Up,
            Direction::Down => Key::Down,
        };
        self.input.apply(key, &mut self.history);
        self.history.selected()
    }

    /// Wait for the next in-flight command to settle and append its entry.
    /// Returns `None` at once when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<TranscriptEntry> {
        let done = self.in_flight.next().await?;
        tracing::debug!(seq = done.seq, error = done.result.is_error, "command settled");
        if done.closes {
            self.closing = true;
        }
        self.transcript.push(done.result.clone());
        Some(done.result)
    }

    /// Drain every in-flight command. Hangs as long as any of them does.
    pub async fn settle_all(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    /// Wipe the transcript. History and in-flight commands are untouched.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.is_empty() {
            Phase::Idle
        } else {
            Phase::Dispatching
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Set once `exit` has completed.
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn state(&self) -> &Arc<ConsoleState> {
        &self.state
    }
}
