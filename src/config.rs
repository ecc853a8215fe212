use std::env;

use anyhow::Context;
use twilight_model::id::{Id, marker::UserMarker};

use crate::artwork::CatalogCredentials;

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub lavalink_host: String,
    pub lavalink_password: String,
    pub lavalink_ssl: bool,
    pub catalog: CatalogCredentials,
    pub owner_id: Option<Id<UserMarker>>,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;
        let lavalink_host = env::var("LAVALINK_HOST").context("LAVALINK_HOST must be set")?;
        let lavalink_password =
            env::var("LAVALINK_PASSWORD").context("LAVALINK_PASSWORD must be set")?;
        let lavalink_ssl = optional("LAVALINK_SSL")
            .map(|value| value.parse::<bool>())
            .transpose()
            .context("LAVALINK_SSL must be true or false")?
            .unwrap_or(false);
        let owner_id = optional("BOT_OWNER_ID")
            .map(|value| value.parse::<Id<UserMarker>>())
            .transpose()
            .context("BOT_OWNER_ID must be a Discord user id")?;

        let catalog = CatalogCredentials {
            client_id: optional("SPOTIFY_CLIENT_ID"),
            client_secret: optional("SPOTIFY_CLIENT_SECRET"),
        };
        if !catalog.is_configured() {
            tracing::warn!("Spotify credentials not found; artwork enrichment is disabled");
        }

        Ok(Self {
            token,
            lavalink_host,
            lavalink_password,
            lavalink_ssl,
            catalog,
            owner_id,
        })
    }
}
