pub mod catalog;
pub mod execute;
pub mod handlers;
pub mod params;
pub mod validation;

use std::sync::Arc;

use serde::Serialize;

use crate::error::ConsoleError;
use crate::protocol::HostReply;
use crate::state::ConsoleState;

use handlers::{document, selection, session, shape};

pub use execute::{execute, lookup};

// ── Command metadata ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    /// Needs a round trip to the host before it can answer.
    pub bridged: bool,
}

// ── Command output ──────────────────────────────────────────────

/// What a handler hands back on success. `echo` replaces the command name in
/// the transcript when the handler wants to show its normalized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub echo: Option<String>,
    pub message: String,
}

impl CommandOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            echo: None,
            message: message.into(),
        }
    }

    pub fn with_echo(mut self, echo: impl Into<String>) -> Self {
        self.echo = Some(echo.into());
        self
    }
}

/// A reply that passed the kind filter but has the wrong shape. Only reachable
/// if a handler's `Expect` and its destructuring disagree.
pub(crate) fn unexpected_reply(reply: &HostReply) -> ConsoleError {
    ConsoleError::Host {
        context: "decoding reply".to_string(),
        message: format!(
            "Unexpected reply from host: {}",
            reply.kind().map_or("unknown", |k| k.as_str())
        ),
    }
}

// ── define_commands! macro ──────────────────────────────────────

/// Single source of truth for all commands. Generates:
/// 1. `CommandName` enum
/// 2. `CommandName::info()` (name, usage, summary, bridged)
/// 3. `CommandName::from_name()`, exact and case-sensitive
/// 4. `CommandName::all()` in declaration order
/// 5. `CommandName::dispatch()`: local handlers run inline, bridged ones are awaited
macro_rules! define_commands {
    (
        local {
            $(
                $lv:ident => $lh:path, $ln:literal, $lu:literal : $ls:literal ;
            )*
        }
        bridged {
            $(
                $bv:ident => $bh:path, $bn:literal, $bu:literal : $bs:literal ;
            )*
        }
    ) => {
        // ── 1. CommandName enum ──
        /// Every command the console knows. Adding a variant causes compiler
        /// errors until it's fully handled.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommandName {
            $( $lv, )*
            $( $bv, )*
        }

        impl CommandName {
            // ── 2. info() ──
            pub fn info(self) -> CommandInfo {
                match self {
                    $( CommandName::$lv => CommandInfo {
                        name: $ln,
                        usage: $lu,
                        summary: $ls,
                        bridged: false,
                    }, )*
                    $( CommandName::$bv => CommandInfo {
                        name: $bn,
                        usage: $bu,
                        summary: $bs,
                        bridged: true,
                    }, )*
                }
            }

            // ── 3. from_name() ──
            pub fn from_name(name: &str) -> Option<CommandName> {
                match name {
                    $( $ln => Some(CommandName::$lv), )*
                    $( $bn => Some(CommandName::$bv), )*
                    _ => None,
                }
            }

            // ── 4. all() ──
            pub fn all() -> &'static [CommandName] {
                &[
                    $( CommandName::$lv, )*
                    $( CommandName::$bv, )*
                ]
            }

            // ── 5. dispatch() ──
            pub(crate) async fn dispatch(
                self,
                state: Arc<ConsoleState>,
                args: Vec<String>,
            ) -> Result<CommandOutput, ConsoleError> {
                match self {
                    $( CommandName::$lv => $lh(&state, &args), )*
                    $( CommandName::$bv => $bh(state, args).await, )*
                }
            }
        }
    };
}

// ── Command definitions ─────────────────────────────────────────

define_commands! {
    local {
        Help => session::help, "help", "help [command]": "Show available commands";
        Clear => session::clear, "clear", "clear": "Clear the console";
        History => session::history, "history", "history": "List the commands in this session's history";
        Shape => shape::shape, "shape", "shape <type> [...params]": "Create shapes";
        Exit => session::exit, "exit", "exit": "Close the plugin";
    }
    bridged {
        Selection => selection::selection, "selection", "selection [--verbose]": "Show selected elements info";
        Analytics => document::analytics, "analytics", "analytics": "Display file analytics";
        Whoami => document::whoami, "whoami", "whoami": "Display current user info";
        Ls => document::ls, "ls", "ls <fonts|styles|components|help> [--current]": "List fonts, styles, components";
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for cmd in CommandName::all() {
            assert_eq!(CommandName::from_name(cmd.info().name), Some(*cmd));
        }
        assert_eq!(CommandName::all().len(), 9);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(CommandName::from_name("help"), Some(CommandName::Help));
        assert_eq!(CommandName::from_name("HELP"), None);
        assert_eq!(CommandName::from_name("Shape"), None);
    }

    #[test]
    fn only_host_queries_are_bridged() {
        let bridged: Vec<&str> = CommandName::all()
            .iter()
            .filter(|c| c.info().bridged)
            .map(|c| c.info().name)
            .collect();
        assert_eq!(bridged, ["selection", "analytics", "whoami", "ls"]);
    }
}
