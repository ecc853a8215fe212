use super::{author_voice_channel, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::{Result, bail};
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

const MAX_VOLUME: i64 = 150;

#[derive(CommandModel, CreateCommand)]
#[command(name = "volume", desc = "Change the volume of the player.")]
pub struct VolumeCommand {
    #[allow(unused)]
    #[command(desc = "Volume level (0-150)", min_value = 0, max_value = 150)]
    volume: i64,
}

#[async_trait]
impl Command for VolumeCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        let volume: i64 = cmd_ctx.get_arg("volume").ok_or_else(|| {
            anyhow::anyhow!("Volume argument is required and must be a number between 0 and 150.")
        })?;

        let Ok(level) = u16::try_from(volume) else {
            bail!("Volume must be between 0 and {}.", MAX_VOLUME);
        };
        if volume > MAX_VOLUME {
            bail!("Volume must be between 0 and {}.", MAX_VOLUME);
        }

        author_voice_channel(&state, cmd_ctx)?;
        let player = player_for(&state, guild_id)?;
        player.set_volume(level).await?;

        let response = CommandResponseBuilder::new()
            .content(format!("🔊 Volume set to {}%.", level))
            .build();
        cmd_ctx.reply(response).await?;
        Ok(())
    }
}
