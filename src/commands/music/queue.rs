use super::{MUSIC_COLOR, author_voice_channel, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::utils::duration::{format_playlist_duration, format_track_duration};
use anyhow::Result;
use async_trait::async_trait;
use lavalink_rs::player_context::QueueRef;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

const MAX_LISTED_TRACKS: usize = 15;

#[derive(CommandModel, CreateCommand)]
#[command(name = "queue", desc = "Show the current music queue.")]
pub struct QueueCommand;

#[async_trait]
impl Command for QueueCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        author_voice_channel(&state, cmd_ctx)?;

        let player = player_for(&state, guild_id)?;
        let queue = player.get_queue();

        let embed = build_queue_embed(&queue).await?;
        let response = CommandResponseBuilder::new().embed(embed).build();

        cmd_ctx.reply(response).await?;

        Ok(())
    }
}

pub async fn build_queue_embed(queue: &QueueRef) -> Result<Embed> {
    let mut embed = EmbedBuilder::new()
        .title("🎶 Current Queue")
        .color(MUSIC_COLOR);

    let tracks = queue.get_queue().await?;
    if tracks.is_empty() {
        return Ok(embed.description("The queue is currently empty.").build());
    }

    let mut lines: Vec<String> = tracks
        .iter()
        .take(MAX_LISTED_TRACKS)
        .enumerate()
        .map(|(index, queued)| {
            let info = &queued.track.info;
            format!(
                "`{}.` {} - {} `[{}]`",
                index + 1,
                info.title,
                info.author,
                format_track_duration(info.length)
            )
        })
        .collect();
    if tracks.len() > MAX_LISTED_TRACKS {
        lines.push(format!("…and {} more", tracks.len() - MAX_LISTED_TRACKS));
    }

    let total_ms: u64 = tracks.iter().map(|queued| queued.track.info.length).sum();
    embed = embed.description(lines.join("\n")).footer(EmbedFooterBuilder::new(format!(
        "{} tracks · {} total",
        tracks.len(),
        format_playlist_duration(total_ms)
    )));

    Ok(embed.build())
}
