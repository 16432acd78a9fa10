//! Commands answered entirely on the console side.

use crate::error::ConsoleError;
use crate::protocol::HostRequest;
use crate::registry::{catalog, CommandOutput};
use crate::state::ConsoleState;

pub fn help(_state: &ConsoleState, args: &[String]) -> Result<CommandOutput, ConsoleError> {
    let topic = args.iter().find(|a| !a.is_empty()).map(String::as_str);
    Ok(CommandOutput::new(catalog::help_text(topic)?))
}

/// The controller intercepts a bare `clear` before it gets here; this only
/// runs for `clear` with arguments.
pub fn clear(_state: &ConsoleState, _args: &[String]) -> Result<CommandOutput, ConsoleError> {
    Ok(CommandOutput::new(""))
}

pub fn history(_state: &ConsoleState, _args: &[String]) -> Result<CommandOutput, ConsoleError> {
    Ok(CommandOutput::new(
        "Command history functionality is provided via up/down arrow keys",
    ))
}

pub fn exit(state: &ConsoleState, _args: &[String]) -> Result<CommandOutput, ConsoleError> {
    state.bridge.send(HostRequest::ClosePlugin)?;
    Ok(CommandOutput::new("Closing plugin..."))
}
