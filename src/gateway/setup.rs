use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use lavalink_rs::client::LavalinkClient;
use lavalink_rs::model::events as LavalinkEventsModel;
use lavalink_rs::node::NodeBuilder;
use lavalink_rs::prelude::NodeDistributionStrategy;
use songbird::Songbird;
use songbird::shards::TwilightMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_gateway::{ConfigBuilder, Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::outgoing::update_presence::UpdatePresencePayload;
use twilight_model::gateway::presence::{ActivityType, MinimalActivity, Status};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use crate::artwork::{ArtworkResolver, CatalogEndpoints, ReqwestTransport};
use crate::commands::COMMANDS;
use crate::config::Config;
use crate::gateway::runner;
use crate::lavalink_events;
use crate::metrics::{CLEANUP_INTERVAL, MetricsSampler, ProcessProbe};
use crate::state::{PlayerEventData, State};

#[derive(Debug, Clone)]
pub struct ShardInfo {
    pub latency_ms: Option<u128>,
}

pub struct Bot {
    pub shard: Shard,
    pub state: Arc<State>,
    pub shard_info_tx: mpsc::Sender<ShardInfo>,
}

impl Bot {
    pub fn new(shard: Shard, state: Arc<State>, shard_info_tx: mpsc::Sender<ShardInfo>) -> Self {
        Self {
            shard,
            state,
            shard_info_tx,
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default tracing subscriber: {}", e))?;
    Ok(())
}

fn load_config_and_env_sync() -> anyhow::Result<Config> {
    // variables may come from the environment alone
    if let Err(e) = dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }
    Config::from_env()
}

fn init_http_client(config: &Config) -> Arc<HttpClient> {
    Arc::new(HttpClient::new(config.token.clone()))
}

fn init_shard(config: &Config, presence: UpdatePresencePayload) -> Shard {
    let config = ConfigBuilder::new(
        config.token.clone(),
        Intents::GUILDS | Intents::GUILD_VOICE_STATES,
    )
    .presence(presence)
    .build();
    Shard::with_config(ShardId::ONE, config)
}

fn presence() -> anyhow::Result<UpdatePresencePayload> {
    Ok(UpdatePresencePayload::new(
        [MinimalActivity {
            name: "/play".to_string(),
            kind: ActivityType::Listening,
            url: None,
        }
        .into()],
        false,
        None,
        Status::Online,
    )?)
}

fn init_metrics() -> Arc<MetricsSampler> {
    let metrics = Arc::new(MetricsSampler::new(Arc::new(ProcessProbe::new())));
    metrics.start();
    metrics
}

fn init_artwork_resolver(config: &Config, client: reqwest::Client) -> Arc<ArtworkResolver> {
    Arc::new(ArtworkResolver::new(
        config.catalog.clone(),
        CatalogEndpoints::default(),
        Arc::new(ReqwestTransport::new(client)),
    ))
}

async fn init_lavalink_client(
    config: &Config,
    user_id: Id<UserMarker>,
    event_data: Arc<PlayerEventData>,
) -> anyhow::Result<Arc<LavalinkClient>> {
    let lavalink_events_handlers = LavalinkEventsModel::Events {
        ready: Some(lavalink_events::ready_event),
        track_start: Some(lavalink_events::track_start),
        track_exception: Some(lavalink_events::track_exception),
        track_stuck: Some(lavalink_events::track_stuck),
        websocket_closed: Some(lavalink_events::websocket_closed),
        ..Default::default()
    };

    let node = NodeBuilder {
        hostname: config.lavalink_host.clone(),
        is_ssl: config.lavalink_ssl,
        events: LavalinkEventsModel::Events::default(),
        password: config.lavalink_password.clone(),
        user_id: user_id.into(),
        session_id: None,
    };

    let client = LavalinkClient::new_with_data(
        lavalink_events_handlers,
        vec![node],
        NodeDistributionStrategy::round_robin(),
        event_data,
    )
    .await;
    Ok(Arc::new(client))
}

async fn init_songbird_client(
    shard_sender: twilight_gateway::MessageSender,
    shard_id_number: u32,
    user_id: Id<UserMarker>,
) -> anyhow::Result<Arc<Songbird>> {
    let senders = TwilightMap::new(HashMap::from([(shard_id_number, shard_sender)]));
    Ok(Arc::new(Songbird::twilight(Arc::new(senders), user_id)))
}

async fn register_bot_commands(state: Arc<State>) -> anyhow::Result<()> {
    let commands_to_register: Vec<twilight_model::application::command::Command> = COMMANDS
        .iter()
        .map(|cmd_def| (cmd_def.create_slash_data_fn)())
        .collect();

    if commands_to_register.is_empty() {
        tracing::info!("No commands to register.");
        return Ok(());
    }

    let application_id = state
        .http
        .current_user_application()
        .await
        .context("Failed to get current user application")?
        .model()
        .await
        .context("Failed to model current user application")?
        .id;

    let interaction_client = state.http.interaction(application_id);

    match interaction_client
        .set_global_commands(&commands_to_register)
        .await
    {
        Ok(_) => {
            tracing::info!(count = commands_to_register.len(), "Registered global commands.");
        }
        Err(error) => {
            tracing::error!(?error, "Failed to register global commands");
        }
    }
    Ok(())
}

fn spawn_cleanup_task(metrics: Arc<MetricsSampler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(tokio::time::Instant::now() + CLEANUP_INTERVAL, CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            metrics.cleanup();
        }
    })
}

pub async fn initialize_and_run_bot() -> anyhow::Result<()> {
    init_tracing().context("Failed to initialize tracing")?;
    tracing::info!("Cadence starting up...");

    let (shard_info_tx, mut shard_info_rx) = mpsc::channel::<ShardInfo>(32);

    let config = load_config_and_env_sync().context("Failed to load configuration")?;

    let http_client = init_http_client(&config);

    let current_user_id = http_client
        .current_user()
        .await
        .context("Failed to get current user from Discord")?
        .model()
        .await
        .context("Failed to model current user data")?
        .id;

    let metrics = init_metrics();
    let reqwest_client = reqwest::Client::new();
    let artwork = init_artwork_resolver(&config, reqwest_client.clone());

    let lavalink_client = init_lavalink_client(
        &config,
        current_user_id,
        Arc::new(PlayerEventData {
            metrics: metrics.clone(),
            artwork: artwork.clone(),
        }),
    )
    .await
    .context("Failed to initialize Lavalink client")?;

    let initial_shard = init_shard(&config, presence()?);

    let songbird_client = init_songbird_client(
        initial_shard.sender(),
        initial_shard.id().number() as u32,
        current_user_id,
    )
    .await
    .context("Failed to initialize Songbird client")?;

    let app_state = Arc::new(State {
        http: http_client.clone(),
        lavalink: lavalink_client,
        songbird: songbird_client,
        cache: DefaultInMemoryCache::new(),
        config,
        latency_ms: tokio::sync::Mutex::new(None),
        metrics: metrics.clone(),
        artwork,
        reqwest: reqwest_client,
    });

    let bot = Bot::new(initial_shard, app_state.clone(), shard_info_tx);

    register_bot_commands(app_state.clone())
        .await
        .context("Failed to register bot commands")?;

    let app_state_for_latency_task = app_state.clone();
    tokio::spawn(async move {
        while let Some(info) = shard_info_rx.recv().await {
            if let Some(latency_value) = info.latency_ms {
                let mut latency_state = app_state_for_latency_task.latency_ms.lock().await;
                *latency_state = Some(latency_value);
                tracing::debug!("Latency updated: {}ms", latency_value);
            }
        }
        tracing::info!("Shard info receiver channel closed, latency updates will stop.");
    });

    let cleanup_handle = spawn_cleanup_task(metrics.clone());

    tracing::info!("Bot initialized. Connecting to gateway and running event loop...");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let runner_handle = tokio::spawn(async move { runner(bot, shutdown_rx).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for ctrl_c signal");
        let _ = shutdown_tx.send(());
    } else {
        tracing::info!("Ctrl+C received. Initiating graceful shutdown...");
        if shutdown_tx.send(()).is_err() {
            tracing::warn!(
                "Failed to send shutdown signal to gateway runner; it might have already exited."
            );
        }
    }

    metrics.stop();
    cleanup_handle.abort();

    tracing::info!("Waiting for gateway runner to complete...");
    match runner_handle.await {
        Ok(Ok(_)) => tracing::info!("Gateway runner finished successfully."),
        Ok(Err(e)) => tracing::error!(error = ?e, "Gateway runner failed."),
        Err(e) => tracing::error!(error = ?e, "Gateway runner task panicked or was cancelled."),
    }

    tracing::info!("Shutdown complete.");
    Ok(())
}
