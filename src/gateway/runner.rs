use std::sync::Arc;

use tokio::sync::oneshot::{self, error::TryRecvError};
use twilight_gateway::{CloseFrame, Event, EventTypeFlags, StreamExt};

use super::{Bot, ShardInfo};
use crate::metrics::{ConnectionEventKind, MetricsSampler};
use crate::state::State;

const GATEWAY_SUBJECT: &str = "gateway";

#[tracing::instrument(skip_all)]
pub async fn runner(mut bot: Bot, mut shutdown_rx: oneshot::Receiver<()>) -> anyhow::Result<()> {
    loop {
        let item = tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                tracing::info!("Shutdown requested, leaving gateway loop.");
                break;
            }
            item = bot.shard.next_event(EventTypeFlags::all()) => item,
        };

        let event = match item {
            Some(Ok(event)) => event,
            Some(Err(source)) => {
                tracing::warn!(?source, "Error receiving event from shard");
                bot.state.metrics.record_error(GATEWAY_SUBJECT);
                continue;
            }
            None => {
                tracing::info!("Shard event stream ended.");
                break;
            }
        };

        match &event {
            // terminal for the shard's stream either way
            Event::GatewayClose(frame) => {
                if close_was_planned(&mut shutdown_rx) {
                    tracing::info!(?frame, "Gateway closed for shutdown.");
                } else {
                    record_unexpected_close(&bot.state.metrics, frame.as_ref());
                }
                break;
            }
            Event::GatewayHeartbeatAck => report_latency(&mut bot).await,
            _ => {}
        }

        dispatch(bot.state.clone(), event);
    }

    bot.shard.close(CloseFrame::NORMAL);
    Ok(())
}

fn close_was_planned(shutdown_rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty))
}

fn record_unexpected_close(metrics: &MetricsSampler, frame: Option<&CloseFrame<'_>>) {
    let code = frame.map(|frame| frame.code);
    tracing::warn!(?code, "Gateway closed unexpectedly by Discord.");
    metrics.record_error("gateway_close");
    metrics.record_connection_event(ConnectionEventKind::Error, GATEWAY_SUBJECT);
}

async fn report_latency(bot: &mut Bot) {
    let Some(average) = bot.shard.latency().average() else {
        tracing::debug!(shard = bot.shard.id().number(), "No latency average yet");
        return;
    };

    let info = ShardInfo {
        latency_ms: Some(average.as_millis()),
    };
    if let Err(e) = bot.shard_info_tx.send(info).await {
        tracing::warn!("Failed to send shard info: {}", e);
    }
}

fn dispatch(state: Arc<State>, event: Event) {
    tokio::spawn(async move {
        state.songbird.process(&event).await;
        state.cache.update(&event);

        if let Err(e) = super::process(event, state).await {
            tracing::error!(error = ?e, "Error processing event");
        }
    });
}
