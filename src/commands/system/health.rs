use super::{SYSTEM_COLOR, WARNING_COLOR, flag};
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

#[derive(CommandModel, CreateCommand)]
#[command(name = "health", desc = "Check whether the bot's performance looks degraded.")]
pub struct HealthCommand;

#[async_trait]
impl Command for HealthCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let embed = match state.metrics.is_degraded() {
            None => EmbedBuilder::new()
                .title("🩺 Health Check")
                .color(SYSTEM_COLOR)
                .description("Not enough data yet; the first memory sample is taken 30 seconds after startup.")
                .build(),
            Some(verdict) => {
                let (summary, color) = if verdict.degraded {
                    ("⚠️ Performance is degraded", WARNING_COLOR)
                } else {
                    ("✅ All systems running normally", SYSTEM_COLOR)
                };
                EmbedBuilder::new()
                    .title("🩺 Health Check")
                    .color(color)
                    .description(summary)
                    .field(EmbedFieldBuilder::new("High memory", flag(verdict.high_memory)).inline())
                    .field(EmbedFieldBuilder::new("Possible leak", flag(verdict.possible_leak)).inline())
                    .field(
                        EmbedFieldBuilder::new("Connection trouble", flag(verdict.connection_trouble))
                            .inline(),
                    )
                    .build()
            }
        };

        cmd_ctx
            .reply(CommandResponseBuilder::new().embed(embed).build())
            .await?;
        Ok(())
    }
}
