use crate::error::ConsoleError;
use crate::protocol::HostRequest;
use crate::registry::params::{ShapeParams, SHAPE_USAGE};
use crate::registry::CommandOutput;
use crate::state::ConsoleState;

/// Validate locally, then post `create-shape` without waiting for the host's
/// `shape-created` reply. The summary describes what was requested.
pub fn shape(state: &ConsoleState, args: &[String]) -> Result<CommandOutput, ConsoleError> {
    let Some((type_token, rest)) = args.split_first() else {
        return Ok(CommandOutput::new(SHAPE_USAGE));
    };
    let params = ShapeParams::parse(type_token, rest)?;
    state.bridge.send(HostRequest::CreateShape(params.to_spec()))?;
    tracing::debug!(shape = params.shape_type().slug(), "create-shape posted");
    Ok(CommandOutput::new(params.summary()).with_echo(format!("shape {}", args.join(" "))))
}
