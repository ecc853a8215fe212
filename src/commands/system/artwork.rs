use super::{SYSTEM_COLOR, WARNING_COLOR};
use crate::artwork::{ArtworkError, is_catalog_link, parse_reference};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, ImageSource};

#[derive(CommandModel, CreateCommand)]
#[command(name = "artwork", desc = "Look up the artwork for a Spotify track or album link.")]
pub struct ArtworkCommand {
    #[allow(unused)]
    #[command(desc = "A Spotify track or album link")]
    url: String,
}

const NOT_CONFIGURED: &str = "⚪ Not configured";

fn token_status(result: &Result<String, ArtworkError>) -> &'static str {
    match result {
        Ok(_) => "🟢 Connected",
        Err(ArtworkError::MissingCredential(_)) => NOT_CONFIGURED,
        Err(ArtworkError::Timeout) => "🔴 Timed out",
        Err(ArtworkError::Upstream { .. }) => "🔴 Rejected by catalog",
        Err(ArtworkError::Transport(_) | ArtworkError::Decode(_)) => "🔴 Unreachable",
    }
}

#[async_trait]
impl Command for ArtworkCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let url: String = cmd_ctx
            .get_arg("url")
            .ok_or_else(|| anyhow!("Link is missing or not a string."))?;
        if !is_catalog_link(&url) {
            bail!("Only open.spotify.com links can be looked up.");
        }
        let reference = parse_reference(&url)
            .ok_or_else(|| anyhow!("That doesn't look like a track, album or playlist link."))?;

        cmd_ctx.defer().await?;

        let catalog_status = if state.artwork.has_credentials() {
            let token = state.artwork.get_access_token().await;
            if let Err(e) = &token {
                tracing::warn!(error = %e, "Catalog token unavailable for artwork lookup");
            }
            token_status(&token)
        } else {
            NOT_CONFIGURED
        };
        let artwork = state.artwork.resolve_link(&url).await;

        let mut embed = EmbedBuilder::new()
            .title("🖼️ Artwork Lookup")
            .field(EmbedFieldBuilder::new("Type", reference.kind.as_str()).inline())
            .field(EmbedFieldBuilder::new("ID", format!("`{}`", reference.id)).inline())
            .field(EmbedFieldBuilder::new("Catalog", catalog_status).inline());

        embed = match artwork.and_then(|url| ImageSource::url(url).ok()) {
            Some(source) => embed
                .color(SYSTEM_COLOR)
                .description("Found artwork for this link.")
                .thumbnail(source),
            None => embed
                .color(WARNING_COLOR)
                .description("No artwork could be found for this link."),
        };

        cmd_ctx
            .reply(CommandResponseBuilder::new().embed(embed.build()).build())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_status_distinguishes_configuration_from_outages() {
        assert_eq!(token_status(&Ok("token".into())), "🟢 Connected");
        assert_eq!(
            token_status(&Err(ArtworkError::MissingCredential("SPOTIFY_CLIENT_ID"))),
            "⚪ Not configured"
        );
        assert_eq!(token_status(&Err(ArtworkError::Timeout)), "🔴 Timed out");
        assert_eq!(
            token_status(&Err(ArtworkError::Upstream { status: 401 })),
            "🔴 Rejected by catalog"
        );
    }
}
