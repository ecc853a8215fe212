use super::{artwork_for, author_voice_channel, build_playback_embed, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

#[derive(CommandModel, CreateCommand)]
#[command(name = "resume", desc = "Resume the currently paused track.")]
pub struct ResumeCommand;

#[async_trait]
impl Command for ResumeCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        author_voice_channel(&state, cmd_ctx)?;

        let player = player_for(&state, guild_id)?;
        let player_data = player.get_player().await?;
        let track = player_data
            .track
            .ok_or_else(|| anyhow!("Nothing is in the queue."))?;
        if !player_data.paused {
            bail!("The music is already playing.");
        }

        player.set_pause(false).await?;

        let artwork = artwork_for(&state.artwork, &track.info).await;
        cmd_ctx
            .reply(
                CommandResponseBuilder::new()
                    .embed(build_playback_embed(&track.info.title, false, artwork))
                    .build(),
            )
            .await?;
        Ok(())
    }
}
