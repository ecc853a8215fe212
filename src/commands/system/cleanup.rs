use super::SYSTEM_COLOR;
use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

#[derive(CommandModel, CreateCommand)]
#[command(name = "cleanup", desc = "Prune old performance data (administrators only).")]
pub struct CleanupCommand;

#[async_trait]
impl Command for CleanupCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let author_id = cmd_ctx
            .author()
            .ok_or_else(|| anyhow!("Interaction is missing author information."))?
            .id;
        let is_owner = state.config.owner_id == Some(author_id);
        if !is_owner && !cmd_ctx.is_administrator() {
            bail!("You need administrator permissions to use this command.");
        }

        let pruned = state.metrics.cleanup();
        let retained = state.metrics.report().data_points;

        let embed = EmbedBuilder::new()
            .title("🧹 Cleanup Complete")
            .color(SYSTEM_COLOR)
            .description(format!("Removed **{}** stale entries.", pruned.total()))
            .field(
                EmbedFieldBuilder::new(
                    "Removed",
                    format!(
                        "Memory samples: {}\nCPU samples: {}\nConnection events: {}",
                        pruned.memory, pruned.cpu, pruned.connections
                    ),
                )
                .inline(),
            )
            .field(
                EmbedFieldBuilder::new(
                    "Retained",
                    format!(
                        "Memory samples: {}\nCPU samples: {}\nConnection events: {}",
                        retained.memory, retained.cpu, retained.connections
                    ),
                )
                .inline(),
            )
            .build();

        cmd_ctx
            .reply(CommandResponseBuilder::new().embed(embed).build())
            .await?;
        Ok(())
    }
}
