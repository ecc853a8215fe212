use crate::command_handler::{Command, CommandContext, CommandResponseBuilder, GlobalState};
use crate::utils::duration::format_uptime;
use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};

#[derive(CommandModel, CreateCommand)]
#[command(name = "ping", desc = "Check if the bot is responsive.")]
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let ping = *state.latency_ms.lock().await;

        let Some(ping) = ping else {
            anyhow::bail!("Latency is not available; Not enough data collected yet.");
        };
        let response = CommandResponseBuilder::new()
            .content(format!(
                "🏓 Pong! `({}ms)` · up {}",
                ping,
                format_uptime(state.metrics.uptime())
            ))
            .build();

        cmd_ctx.reply(response).await?;
        Ok(())
    }
}
