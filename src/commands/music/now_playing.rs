use super::{MUSIC_COLOR, artwork_for, author_voice_channel, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::utils::duration::format_track_duration;
use anyhow::Result;
use async_trait::async_trait;
use lavalink_rs::model::track::TrackData;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, ImageSource};

#[derive(CommandModel, CreateCommand)]
#[command(name = "now_playing", desc = "Show the currently playing song.")]
pub struct NowPlayingCommand;

#[async_trait]
impl Command for NowPlayingCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        author_voice_channel(&state, cmd_ctx)?;

        let player = player_for(&state, guild_id)?;
        let player_data = player.get_player().await?;
        let track = player_data
            .track
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No track is currently playing."))?;

        cmd_ctx.defer().await?;
        let artwork = artwork_for(&state.artwork, &track.info).await;
        let embed = build_now_playing_embed(
            track,
            artwork,
            Some(player_data.volume),
            Some(player_data.state.position),
        );

        cmd_ctx
            .reply(CommandResponseBuilder::new().embed(embed).build())
            .await?;

        Ok(())
    }
}

/// Shared by `/now_playing` and the track-start announcement.
pub fn build_now_playing_embed(
    track: &TrackData,
    artwork: Option<String>,
    volume: Option<u16>,
    position_ms: Option<u64>,
) -> Embed {
    let info = &track.info;
    let duration = if info.is_stream {
        "🔴 Live".to_string()
    } else {
        match position_ms {
            Some(position) if position >= 1000 => format!(
                "{} / {}",
                format_track_duration(position),
                format_track_duration(info.length)
            ),
            Some(_) => format!("0:00 / {}", format_track_duration(info.length)),
            None => format_track_duration(info.length),
        }
    };

    let mut embed = EmbedBuilder::new()
        .title("🎵 Now Playing")
        .description(format!("**{}** by **{}**", info.title, info.author))
        .color(MUSIC_COLOR)
        .field(EmbedFieldBuilder::new("Duration", duration).inline())
        .field(EmbedFieldBuilder::new("Source", info.source_name.clone()).inline());

    if let Some(uri) = &info.uri {
        embed = embed.url(uri.clone());
    }
    if let Some(volume) = volume {
        embed = embed.field(EmbedFieldBuilder::new("Volume", format!("{}%", volume)).inline());
    }
    if let Some(source) = artwork.and_then(|url| ImageSource::url(url).ok()) {
        embed = embed.thumbnail(source);
    }

    embed.build()
}
