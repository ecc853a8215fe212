use super::{author_voice_channel, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

#[derive(CommandModel, CreateCommand)]
#[command(name = "skip", desc = "Skip the currently playing song.")]
pub struct SkipCommand;

#[async_trait]
impl Command for SkipCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        author_voice_channel(&state, cmd_ctx)?;

        let player = player_for(&state, guild_id)?;
        let track = player
            .get_player()
            .await?
            .track
            .ok_or_else(|| anyhow::anyhow!("No track is currently playing."))?;

        player.skip()?;

        let response = CommandResponseBuilder::new()
            .content(format!("⏩ Skipped **{}**.", track.info.title))
            .build();
        cmd_ctx.reply(response).await?;

        Ok(())
    }
}
