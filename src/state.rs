use std::time::Duration;

use crate::bridge::{Bridge, Expect};
use crate::protocol::ReplyKind;
use crate::registry::CommandName;
use crate::settings::ConsoleSettings;

/// State shared by every command handler for one console session.
pub struct ConsoleState {
    pub bridge: Bridge,
    pub settings: ConsoleSettings,
}

impl ConsoleState {
    pub fn new(bridge: Bridge, settings: ConsoleSettings) -> Self {
        Self { bridge, settings }
    }

    /// Reply kinds a bridged command waits for. Host `error` replies are only
    /// accepted when the settings opt in.
    pub fn expect(&self, kind: ReplyKind) -> Expect {
        let expect = Expect::only(kind);
        if self.settings.surface_host_errors {
            expect.or_error()
        } else {
            expect
        }
    }

    /// Caller-side deadline for a command's round trip.
    pub fn deadline_for(&self, command: CommandName) -> Option<Duration> {
        match command {
            CommandName::Analytics => self.settings.analytics_timeout(),
            _ => self.settings.request_timeout(),
        }
    }
}
