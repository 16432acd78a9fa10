use std::sync::Arc;

use crate::error::ConsoleError;
use crate::parser::ParsedCommand;
use crate::state::ConsoleState;
use crate::transcript::CommandResult;

use super::CommandName;

pub fn lookup(name: &str) -> Result<CommandName, ConsoleError> {
    CommandName::from_name(name).ok_or_else(|| ConsoleError::NotFound {
        name: name.to_string(),
    })
}

/// Error text for the transcript. Host messages already read "Error <context>: ..."
/// and are shown as they are.
fn error_output(e: &ConsoleError) -> String {
    let text = e.to_string();
    if text.starts_with("Error") {
        text
    } else {
        format!("Error: {text}")
    }
}

/// Run one parsed line to completion. This is the single point where handler
/// errors become error transcript entries, so it never fails.
///
/// Unknown names echo the whole input; handler failures echo the command name.
pub async fn execute(
    state: Arc<ConsoleState>,
    input: &str,
    parsed: ParsedCommand,
) -> CommandResult {
    let cmd = match lookup(&parsed.name) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::debug!(command = %parsed.name, "unknown command");
            return CommandResult::error(input.trim(), error_output(&e));
        }
    };
    let name = cmd.info().name;
    match cmd.dispatch(state, parsed.args).await {
        Ok(out) => CommandResult::ok(out.echo.unwrap_or_else(|| name.to_string()), out.message),
        Err(e) => {
            tracing::debug!(command = name, error = %e, "command failed");
            CommandResult::error(name, error_output(&e))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::bridge::Bridge;
    use crate::bus::{HostEndpoint, MessageBus};
    use crate::parser::parse;
    use crate::protocol::{HostReply, HostRequest, LsSubCommand, ShapeType};
    use crate::settings::ConsoleSettings;

    fn setup() -> (Arc<ConsoleState>, HostEndpoint) {
        let (console, host) = MessageBus::channel();
        let state = Arc::new(ConsoleState::new(
            Bridge::new(console),
            ConsoleSettings::default(),
        ));
        (state, host)
    }

    async fn run(state: &Arc<ConsoleState>, line: &str) -> CommandResult {
        execute(Arc::clone(state), line, parse(line).expect("non-blank")).await
    }

    #[tokio::test]
    async fn unknown_command_is_an_error_entry() {
        let (state, _host) = setup();
        let r = run(&state, "foo bar").await;
        assert!(r.is_error);
        assert_eq!(r.command, "foo bar");
        assert_eq!(r.output, "Error: Command \"foo\" not found");
    }

    #[tokio::test]
    async fn local_commands_never_touch_the_bus() {
        let (state, mut host) = setup();
        let lines = [
            "help",
            "history",
            "clear",
            "shape",
            "shape rect 0 100",
            "shape polygon 2 10",
        ];
        for line in lines {
            let r = run(&state, line).await;
            assert!(!r.output.is_empty() || line == "clear", "{line}");
        }
        drop(state);
        assert_eq!(host.next_request().await, None);
    }

    #[tokio::test]
    async fn shape_posts_create_shape_and_echoes_arguments() {
        let (state, mut host) = setup();
        let r = run(&state, "shape Rect 100 100").await;
        assert!(!r.is_error);
        assert_eq!(r.command, "shape Rect 100 100");
        assert_eq!(r.output, "rect created: 100x100 at (0, 0)");

        let Some(HostRequest::CreateShape(spec)) = host.next_request().await else {
            panic!("expected create-shape");
        };
        assert_eq!(spec.shape_type, ShapeType::Rect);
        assert_eq!(spec.width, Some(100.0));
    }

    #[tokio::test]
    async fn validation_errors_echo_the_command_name() {
        let (state, _host) = setup();
        let r = run(&state, "shape rect 0 100").await;
        assert!(r.is_error);
        assert_eq!(r.command, "shape");
        assert_eq!(r.output, "Error: Width and height must be greater than 0");

        let r = run(&state, "shape star 5 50 1").await;
        assert_eq!(r.output, "Error: Inner radius ratio must be between 0 and 1");
    }

    #[tokio::test]
    async fn exit_posts_close_plugin() {
        let (state, mut host) = setup();
        let r = run(&state, "exit").await;
        assert_eq!(r.output, "Closing plugin...");
        assert_eq!(host.next_request().await, Some(HostRequest::ClosePlugin));
    }

    #[tokio::test]
    async fn ls_round_trip_uses_normalized_echo() {
        let (state, mut host) = setup();
        let replier = host.replier();
        let responder = tokio::spawn(async move {
            let req = host.next_request().await.expect("request");
            assert_eq!(
                req,
                HostRequest::GetLsData {
                    sub_command: LsSubCommand::Fonts,
                    list_current: true
                }
            );
            replier.reply(&HostReply::LsData {
                data: "Inter Regular".into(),
                sub_command: LsSubCommand::Fonts,
            });
        });
        let r = run(&state, "ls --current fonts").await;
        responder.await.unwrap();
        assert!(!r.is_error);
        assert_eq!(r.command, "ls fonts --current");
        assert_eq!(r.output, "Inter Regular");
    }

    #[tokio::test]
    async fn whoami_offline_uses_host_message() {
        let (state, mut host) = setup();
        let replier = host.replier();
        let responder = tokio::spawn(async move {
            host.next_request().await.expect("request");
            replier.reply(&HostReply::UserInfo {
                user: None,
                message: None,
            });
        });
        let r = run(&state, "whoami").await;
        responder.await.unwrap();
        assert!(!r.is_error);
        assert_eq!(
            r.output,
            "User information not available. You may be working offline."
        );
    }

    #[tokio::test]
    async fn closed_bridge_is_an_error_entry() {
        let (state, host) = setup();
        host.replier().close();
        let r = run(&state, "analytics").await;
        assert!(r.is_error);
        assert_eq!(r.output, "Error: Host bridge closed");
    }

    #[test]
    fn host_errors_are_not_prefixed_twice() {
        let host = ConsoleError::Host {
            context: "loading pages".into(),
            message: "Error loading pages: Analytics timeout: Document may be too large".into(),
        };
        assert_eq!(
            error_output(&host),
            "Error loading pages: Analytics timeout: Document may be too large"
        );
        assert_eq!(error_output(&ConsoleError::BridgeClosed), "Error: Host bridge closed");
        assert_eq!(
            error_output(&ConsoleError::validation("Radius must be greater than 0")),
            "Error: Radius must be greater than 0"
        );
    }
}
