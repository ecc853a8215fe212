mod lyrics;
mod now_playing;
mod pause;
mod play;
mod queue;
mod resume;
mod skip;
mod stop;
mod volume;

pub use lyrics::LyricsCommand;
pub use now_playing::{NowPlayingCommand, build_now_playing_embed};
pub use pause::{PauseCommand, build_playback_embed};
pub use play::PlayCommand;
pub use queue::QueueCommand;
pub use resume::ResumeCommand;
pub use skip::SkipCommand;
pub use stop::StopCommand;
pub use volume::VolumeCommand;

use std::sync::Arc;

use lavalink_rs::model::player::ConnectionInfo;
use lavalink_rs::model::track::TrackInfo;
use lavalink_rs::player_context::PlayerContext;
use songbird::ConnectionInfo as SongbirdConnectionInfo;
use twilight_http::Client as HttpClient;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker},
};

use crate::artwork::ArtworkResolver;
use crate::command_handler::{CommandContext, GlobalState};
use crate::metrics::ConnectionEventKind;

pub const MUSIC_COLOR: u32 = 0x1DB954;

/// Stored on each Lavalink player so event hooks know where to post.
pub struct PlayerContextData {
    pub text_channel_id: Id<ChannelMarker>,
    pub http: Arc<HttpClient>,
}

fn convert_connection_info(connection_info: SongbirdConnectionInfo) -> ConnectionInfo {
    ConnectionInfo {
        endpoint: connection_info.endpoint,
        token: connection_info.token,
        session_id: connection_info.session_id,
    }
}

/// Joins `voice_channel_id` unless a call already exists for the guild.
/// Returns whether a new connection was made.
pub async fn join(
    state: &GlobalState,
    guild_id: Id<GuildMarker>,
    voice_channel_id: Id<ChannelMarker>,
    text_channel_id: Id<ChannelMarker>,
) -> anyhow::Result<bool> {
    if state.songbird.get(guild_id).is_some() {
        return Ok(false);
    }

    let (connection_info, _) = state
        .songbird
        .join_gateway(guild_id, voice_channel_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to join voice channel, {}", e))?;

    state
        .lavalink
        .create_player_context_with_data::<PlayerContextData>(
            guild_id,
            convert_connection_info(connection_info),
            Arc::new(PlayerContextData {
                text_channel_id,
                http: state.http.clone(),
            }),
        )
        .await?;

    state
        .metrics
        .record_connection_event(ConnectionEventKind::Connect, guild_id.to_string());
    tracing::info!(%guild_id, %voice_channel_id, "Joined voice channel");

    Ok(true)
}

pub async fn leave(state: &GlobalState, guild_id: Id<GuildMarker>) -> anyhow::Result<()> {
    state.songbird.remove(guild_id).await?;
    state.lavalink.delete_player(guild_id).await?;

    state
        .metrics
        .record_connection_event(ConnectionEventKind::Disconnect, guild_id.to_string());
    tracing::info!(%guild_id, "Left voice channel");
    Ok(())
}

pub fn author_voice_channel(
    state: &GlobalState,
    ctx: &CommandContext,
) -> anyhow::Result<Id<ChannelMarker>> {
    let author = ctx
        .author()
        .ok_or_else(|| anyhow::anyhow!("Interaction is missing author information."))?;
    let guild_id = ctx.guild_id()?;

    state
        .cache
        .voice_state(author.id, guild_id)
        .map(|voice_state| voice_state.channel_id())
        .ok_or_else(|| anyhow::anyhow!("You must be in a voice channel to use this command."))
}

pub fn player_for(state: &GlobalState, guild_id: Id<GuildMarker>) -> anyhow::Result<PlayerContext> {
    state
        .lavalink
        .get_player_context(guild_id)
        .ok_or_else(|| anyhow::anyhow!("No player found for this guild."))
}

pub async fn artwork_for(artwork: &ArtworkResolver, info: &TrackInfo) -> Option<String> {
    if info.source_name.eq_ignore_ascii_case("spotify") {
        if let Some(uri) = info.uri.as_deref() {
            if let Some(url) = artwork.resolve(uri).await {
                return Some(url);
            }
        }
    }
    info.artwork_url.clone()
}
