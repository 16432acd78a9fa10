//! Document-level queries: analytics, current user, resource listings.

use std::sync::Arc;

use crate::error::ConsoleError;
use crate::protocol::{HostReply, HostRequest, ReplyKind, OFFLINE_MESSAGE};
use crate::registry::params::LsParams;
use crate::registry::{unexpected_reply, CommandName, CommandOutput};
use crate::state::ConsoleState;

pub async fn analytics(
    state: Arc<ConsoleState>,
    _args: Vec<String>,
) -> Result<CommandOutput, ConsoleError> {
    let reply = state
        .bridge
        .request_within(
            HostRequest::GetAnalytics,
            state.expect(ReplyKind::AnalyticsData),
            state.deadline_for(CommandName::Analytics),
        )
        .await?;
    match reply {
        HostReply::AnalyticsData {
            total_pages,
            total_layers_in_document,
            total_layers_in_current_page,
        } => Ok(CommandOutput::new(format!(
            "Total Pages: {total_pages}\nTotal Layers: {total_layers_in_document}\nTotal Layers in Current Page: {total_layers_in_current_page}"
        ))),
        other => Err(unexpected_reply(&other)),
    }
}

pub async fn whoami(
    state: Arc<ConsoleState>,
    _args: Vec<String>,
) -> Result<CommandOutput, ConsoleError> {
    let reply = state
        .bridge
        .request_within(
            HostRequest::GetUserInfo,
            state.expect(ReplyKind::UserInfo),
            state.deadline_for(CommandName::Whoami),
        )
        .await?;
    let (user, message) = match reply {
        HostReply::UserInfo { user, message } => (user, message),
        other => return Err(unexpected_reply(&other)),
    };
    let output = match user {
        Some(user) => format!(
            "User: {}\nEmail: {}",
            user.name,
            user.email.as_deref().unwrap_or("Unknown")
        ),
        None => message.unwrap_or_else(|| OFFLINE_MESSAGE.to_string()),
    };
    Ok(CommandOutput::new(output))
}

pub async fn ls(
    state: Arc<ConsoleState>,
    args: Vec<String>,
) -> Result<CommandOutput, ConsoleError> {
    let p = LsParams::from_args(&args)?;
    let reply = state
        .bridge
        .request_within(
            HostRequest::GetLsData {
                sub_command: p.sub_command,
                list_current: p.list_current,
            },
            state.expect(ReplyKind::LsData),
            state.deadline_for(CommandName::Ls),
        )
        .await?;
    match reply {
        HostReply::LsData { data, .. } => Ok(CommandOutput::new(data).with_echo(p.echo())),
        other => Err(unexpected_reply(&other)),
    }
}
