use std::collections::VecDeque;

use super::{MUSIC_COLOR, artwork_for, author_voice_channel, join, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::utils::duration::{format_playlist_duration, format_track_duration};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use lavalink_rs::prelude::{SearchEngines, TrackInQueue, TrackLoadData};
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_mention::Mention;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, ImageSource};

#[derive(CommandModel, CreateCommand)]
#[command(name = "play", desc = "Play a song from YouTube, Spotify or other sources.")]
pub struct PlayCommand {
    #[allow(unused)]
    #[command(desc = "A search query or a link to a track, album or playlist")]
    song: String,
}

#[async_trait]
impl Command for PlayCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let song_query: String = cmd_ctx
            .get_arg("song")
            .ok_or_else(|| anyhow!("Song query is missing or not a string."))?;
        let author_id = cmd_ctx
            .author()
            .ok_or_else(|| anyhow!("Interaction is missing author information."))?
            .id;
        let guild_id = cmd_ctx.guild_id()?;
        let voice_channel_id = author_voice_channel(&state, cmd_ctx)?;
        let text_channel_id = cmd_ctx.channel_id().unwrap_or(voice_channel_id);

        cmd_ctx.defer().await?;

        let joined = join(&state, guild_id, voice_channel_id, text_channel_id).await?;
        let player = player_for(&state, guild_id)?;

        let query_term = if song_query.starts_with("http") {
            song_query.clone()
        } else if (song_query.contains(':') && song_query.split(':').count() == 2)
            || song_query.contains(" - ")
        {
            song_query.clone()
        } else {
            SearchEngines::Spotify.to_query(&song_query)?
        };

        let loaded = state.lavalink.load_tracks(guild_id, &query_term).await?;

        let (mut tracks_to_queue, playlist_name) = match loaded.data {
            Some(TrackLoadData::Track(track)) => (vec![TrackInQueue::from(track)], None),
            Some(TrackLoadData::Search(search_results)) => {
                let track = search_results
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("No tracks found for `{}`.", song_query))?;
                (vec![TrackInQueue::from(track)], None)
            }
            Some(TrackLoadData::Playlist(playlist)) => {
                let tracks = playlist
                    .tracks
                    .into_iter()
                    .map(TrackInQueue::from)
                    .collect();
                (tracks, Some(playlist.info.name))
            }
            Some(TrackLoadData::Error(e)) => bail!("Error loading tracks: {}", e.message),
            None => bail!("Failed to load tracks: received no data from Lavalink."),
        };

        let Some(first) = tracks_to_queue.first() else {
            bail!("No tracks were loaded to queue.");
        };

        let artwork = match state.artwork.resolve_link(&song_query).await {
            Some(url) => Some(url),
            None => artwork_for(&state.artwork, &first.track.info).await,
        };

        let mut embed = EmbedBuilder::new().color(MUSIC_COLOR);
        embed = if let Some(name) = &playlist_name {
            let total_ms = tracks_to_queue.iter().map(|t| t.track.info.length).sum();
            embed
                .title("📃 Playlist Queued")
                .description(format!("**{}**", name))
                .field(EmbedFieldBuilder::new("Tracks", tracks_to_queue.len().to_string()).inline())
                .field(EmbedFieldBuilder::new("Duration", format_playlist_duration(total_ms)).inline())
        } else {
            let info = &first.track.info;
            let title = match info.uri.as_deref() {
                Some(uri) => format!("**[{}]({})**", info.title, uri),
                None => format!("**{}**", info.title),
            };
            embed
                .title("➕ Added to Queue")
                .description(title)
                .field(EmbedFieldBuilder::new("Artist", info.author.clone()).inline())
                .field(EmbedFieldBuilder::new("Duration", format_track_duration(info.length)).inline())
        };
        embed = embed.field(EmbedFieldBuilder::new("Requested by", author_id.mention().to_string()).inline());
        if let Some(source) = artwork.and_then(|url| ImageSource::url(url).ok()) {
            embed = embed.thumbnail(source);
        }

        tracks_to_queue.iter_mut().for_each(|track_in_queue| {
            track_in_queue.track.user_data = Some(serde_json::json!({ "requester_id": author_id }));
        });

        let queue = player.get_queue();
        queue.append(VecDeque::from(tracks_to_queue))?;

        let mut response = CommandResponseBuilder::new().embed(embed.build());
        if joined {
            response = response.content(format!("🎙️ Joined {}", voice_channel_id.mention()));
        }
        cmd_ctx.reply(response.build()).await?;

        if let Ok(player_data) = player.get_player().await {
            if player_data.track.is_none() && queue.get_track(0).await.is_ok_and(|x| x.is_some()) {
                player.skip()?;
            }
        }

        Ok(())
    }
}
