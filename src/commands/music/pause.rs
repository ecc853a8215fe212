use super::{artwork_for, author_voice_channel, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, ImageSource};

const PAUSED_COLOR: u32 = 0xE74C3C;
const RESUMED_COLOR: u32 = 0x2ECC71;

#[derive(CommandModel, CreateCommand)]
#[command(name = "pause", desc = "Pause or resume the currently playing track.")]
pub struct PauseCommand;

#[async_trait]
impl Command for PauseCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        author_voice_channel(&state, cmd_ctx)?;

        let player = player_for(&state, guild_id)?;
        let player_data = player.get_player().await?;
        let track = player_data
            .track
            .ok_or_else(|| anyhow!("Nothing is currently playing."))?;

        let pause = !player_data.paused;
        player.set_pause(pause).await?;

        let artwork = artwork_for(&state.artwork, &track.info).await;
        cmd_ctx
            .reply(
                CommandResponseBuilder::new()
                    .embed(build_playback_embed(&track.info.title, pause, artwork))
                    .build(),
            )
            .await?;
        Ok(())
    }
}

/// Shared by `/pause` and `/resume`.
pub fn build_playback_embed(title: &str, paused: bool, artwork: Option<String>) -> Embed {
    let mut embed = if paused {
        EmbedBuilder::new()
            .title("⏸️ Paused")
            .description(format!("Paused **{}**", title))
            .color(PAUSED_COLOR)
    } else {
        EmbedBuilder::new()
            .title("▶️ Resumed")
            .description(format!("Resumed playing **{}**", title))
            .color(RESUMED_COLOR)
    };
    if let Some(source) = artwork.and_then(|url| ImageSource::url(url).ok()) {
        embed = embed.thumbnail(source);
    }
    embed.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_embed_reflects_new_state() {
        let paused = build_playback_embed("Song", true, None);
        assert_eq!(paused.title.as_deref(), Some("⏸️ Paused"));
        assert_eq!(paused.color, Some(PAUSED_COLOR));

        let resumed = build_playback_embed("Song", false, Some("https://i.example/a.jpg".into()));
        assert_eq!(resumed.description.as_deref(), Some("Resumed playing **Song**"));
        assert_eq!(resumed.color, Some(RESUMED_COLOR));
        assert!(resumed.thumbnail.is_some());
    }
}
