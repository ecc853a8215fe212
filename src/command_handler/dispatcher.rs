use twilight_model::application::interaction::{Interaction, application_command::CommandData};

use crate::command_handler::definition::GlobalState;
use crate::commands::COMMANDS;

pub async fn slash_handler(
    interaction: Interaction,
    data: CommandData,
    state: GlobalState,
) -> anyhow::Result<()> {
    match COMMANDS.iter().find(|cmd_def| cmd_def.name == data.name.as_str()) {
        Some(cmd_def) => (cmd_def.slash_executor)(state, interaction, data).await,
        None => {
            tracing::warn!("Unknown slash command: {}", data.name);
            Ok(())
        }
    }
}
