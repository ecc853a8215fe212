use std::sync::Arc;

use lavalink_rs::client::LavalinkClient;
use songbird::Songbird;
use tokio::sync::Mutex;
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_http::Client;

use crate::artwork::ArtworkResolver;
use crate::config::Config;
use crate::metrics::MetricsSampler;

pub struct State {
    pub http: Arc<Client>,
    pub lavalink: Arc<LavalinkClient>,
    pub songbird: Arc<Songbird>,
    pub cache: DefaultInMemoryCache,
    pub config: Config,
    pub latency_ms: Mutex<Option<u128>>,
    pub metrics: Arc<MetricsSampler>,
    pub artwork: Arc<ArtworkResolver>,
    pub reqwest: reqwest::Client,
}

/// Shared with the Lavalink event hooks through the client's user data.
pub struct PlayerEventData {
    pub metrics: Arc<MetricsSampler>,
    pub artwork: Arc<ArtworkResolver>,
}
