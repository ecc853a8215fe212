use super::{MUSIC_COLOR, player_for};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::utils::lyrics::{Lyrics, LyricsTarget, fit_lyrics, get_lyrics};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use lavalink_rs::prelude::{SearchEngines, TrackLoadData};
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder, ImageSource};

const MAX_LYRICS_CHARS: usize = 4000;

#[derive(CommandModel, CreateCommand)]
#[command(name = "lyrics", desc = "Get lyrics for the current song or search for a specific one.")]
pub struct LyricsCommand {
    #[allow(unused)]
    #[command(desc = "Search for lyrics of a specific song")]
    query: Option<String>,
}

#[async_trait]
impl Command for LyricsCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let guild_id = cmd_ctx.guild_id()?;
        let query: Option<String> = cmd_ctx.get_arg("query");

        cmd_ctx.defer().await?;

        let node = state.lavalink.get_node_for_guild(guild_id).await;
        let address = &node.http.rest_address_versionless;
        let session_id = node.session_id.load().to_string();
        let token = node
            .http
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| anyhow!("Failed to get Authorization header from node"))?;

        let (title, artwork, lyrics) = match query {
            Some(query) => {
                let loaded = state
                    .lavalink
                    .load_tracks(guild_id, &SearchEngines::YouTube.to_query(&query)?)
                    .await?;
                let track = match loaded.data {
                    Some(TrackLoadData::Search(results)) => results.into_iter().next(),
                    Some(TrackLoadData::Track(track)) => Some(track),
                    _ => None,
                }
                .ok_or_else(|| anyhow!("No songs found for `{}`.", query))?;

                let lyrics = get_lyrics(
                    &state.reqwest,
                    address,
                    token,
                    LyricsTarget::Track {
                        encoded: &track.encoded,
                    },
                )
                .await?;
                (track.info.title, track.info.artwork_url, lyrics)
            }
            None => {
                let player = player_for(&state, guild_id)?;
                let track = player
                    .get_player()
                    .await?
                    .track
                    .ok_or_else(|| {
                        anyhow!("No song is currently playing and no search query provided.")
                    })?;

                let guild_id_str = guild_id.to_string();
                let lyrics = get_lyrics(
                    &state.reqwest,
                    address,
                    token,
                    LyricsTarget::Playing {
                        session_id: &session_id,
                        guild_id: &guild_id_str,
                    },
                )
                .await?;
                (track.info.title, track.info.artwork_url, lyrics)
            }
        };

        let Some(lyrics) = lyrics else {
            bail!("Could not find lyrics for **{}**.", title);
        };

        cmd_ctx
            .reply(
                CommandResponseBuilder::new()
                    .embed(build_lyrics_embed(&title, &lyrics, artwork))
                    .build(),
            )
            .await?;

        Ok(())
    }
}

fn build_lyrics_embed(title: &str, lyrics: &Lyrics, artwork: Option<String>) -> Embed {
    let mut embed = EmbedBuilder::new()
        .title(format!("🎶 {}", title))
        .description(fit_lyrics(&lyrics.body(), MAX_LYRICS_CHARS))
        .color(MUSIC_COLOR);

    let credit = match (lyrics.provider.as_deref(), lyrics.source_name.as_deref()) {
        (Some(provider), Some(source)) => Some(format!("Lyrics by {} via {}", provider, source)),
        (Some(provider), None) => Some(format!("Lyrics by {}", provider)),
        (None, Some(source)) => Some(format!("Lyrics via {}", source)),
        (None, None) => None,
    };
    if let Some(credit) = credit {
        embed = embed.footer(EmbedFooterBuilder::new(credit));
    }
    if let Some(source) = artwork.and_then(|url| ImageSource::url(url).ok()) {
        embed = embed.thumbnail(source);
    }

    embed.build()
}
