use super::{author_voice_channel, leave};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

#[derive(CommandModel, CreateCommand)]
#[command(name = "stop", desc = "Stop playback and leave the voice channel.")]
pub struct StopCommand;

#[async_trait]
impl Command for StopCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        author_voice_channel(&state, cmd_ctx)?;
        leave(&state, guild_id).await?;

        let response = CommandResponseBuilder::new().content("⏹️ Stopped").build();
        cmd_ctx.reply(response).await?;

        Ok(())
    }
}
