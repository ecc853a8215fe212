use std::sync::Arc;

use lavalink_rs::{client::LavalinkClient, hook, model::GuildId, model::events};
use twilight_model::channel::message::Embed;

use crate::commands::music::{PlayerContextData, artwork_for, build_now_playing_embed};
use crate::metrics::ConnectionEventKind;
use crate::state::PlayerEventData;

fn event_data(client: &LavalinkClient) -> Option<Arc<PlayerEventData>> {
    match client.data::<PlayerEventData>() {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::error!(error = ?e, "Lavalink client is missing its event data");
            None
        }
    }
}

fn player_data(client: &LavalinkClient, guild_id: GuildId) -> Option<Arc<PlayerContextData>> {
    let player = client.get_player_context(guild_id)?;
    player.data::<PlayerContextData>().ok()
}

async fn announce(client: &LavalinkClient, guild_id: GuildId, content: Option<&str>, embed: Option<Embed>) {
    let Some(data) = player_data(client, guild_id) else {
        tracing::debug!(guild_id = guild_id.0, "No text channel stored for player, skipping announcement");
        return;
    };

    let embeds: Vec<Embed> = embed.into_iter().collect();
    let mut message = data.http.create_message(data.text_channel_id).embeds(&embeds);
    if let Some(content) = content {
        message = message.content(content);
    }
    if let Err(e) = message.await {
        tracing::warn!(error = ?e, guild_id = guild_id.0, "Failed to post player announcement");
    }
}

#[hook]
pub async fn ready_event(client: LavalinkClient, session_id: String, event: &events::Ready) {
    if let Err(e) = client.delete_all_player_contexts().await {
        tracing::warn!(error = ?e, "Failed to clear stale player contexts");
    }
    tracing::info!(%session_id, resumed = event.resumed, "Lavalink node ready");
}

#[hook]
pub async fn track_start(client: LavalinkClient, _session_id: String, event: &events::TrackStart) {
    let Some(data) = event_data(&client) else {
        return;
    };

    tracing::info!(
        guild_id = event.guild_id.0,
        title = %event.track.info.title,
        "Track started"
    );

    let artwork = artwork_for(&data.artwork, &event.track.info).await;
    let embed = build_now_playing_embed(&event.track, artwork, None, None);
    announce(&client, event.guild_id, None, Some(embed)).await;
}

#[hook]
pub async fn track_exception(client: LavalinkClient, _session_id: String, event: &events::TrackException) {
    let guild_id = event.guild_id.0.to_string();
    let message = event
        .exception
        .message
        .clone()
        .unwrap_or_else(|| event.exception.cause.clone());

    if let Some(data) = event_data(&client) {
        data.metrics.record_error("track_exception");
        data.metrics
            .record_connection_event(ConnectionEventKind::Error, guild_id.as_str());
    }

    tracing::error!(
        %guild_id,
        title = %event.track.info.title,
        severity = %event.exception.severity,
        %message,
        "Track failed to play"
    );

    let content = format!("❌ | Failed to play **{}**: {}", event.track.info.title, message);
    announce(&client, event.guild_id, Some(&content), None).await;
}

#[hook]
pub async fn track_stuck(client: LavalinkClient, _session_id: String, event: &events::TrackStuck) {
    if let Some(data) = event_data(&client) {
        data.metrics.record_error("track_stuck");
    }
    tracing::warn!(
        guild_id = event.guild_id.0,
        threshold_ms = event.threshold_ms,
        title = %event.track.info.title,
        "Track stuck"
    );
}

#[hook]
pub async fn websocket_closed(client: LavalinkClient, _session_id: String, event: &events::WebSocketClosed) {
    if let Some(data) = event_data(&client) {
        data.metrics
            .record_connection_event(ConnectionEventKind::Disconnect, event.guild_id.0.to_string());
    }
    tracing::warn!(
        guild_id = event.guild_id.0,
        code = event.code,
        reason = %event.reason,
        by_remote = event.by_remote,
        "Voice websocket closed"
    );
}
