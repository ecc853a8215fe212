use std::{future::Future, pin::Pin, sync::Arc};

use twilight_interactions::command::CreateCommand;
use twilight_model::application::interaction::{Interaction, application_command::CommandData};

use crate::command_handler::context::CommandContext;
use crate::state::State;

pub type GlobalState = Arc<State>;

#[async_trait::async_trait]
pub trait Command: CreateCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> anyhow::Result<()>;

    async fn execute_slash_command(
        state: GlobalState,
        interaction: Interaction,
        data: CommandData,
    ) -> anyhow::Result<()> {
        let cmd_ctx = CommandContext::new(interaction, data, state.http.clone());

        if let Err(e) = Self::execute(state.clone(), &cmd_ctx).await {
            state.metrics.record_error("command");
            if let Err(reply_err) = cmd_ctx
                .reply_error(&e, super::response::create_error_response)
                .await
            {
                tracing::error!(error = ?reply_err, "Failed to send error embed for slash command");
            }
        }
        Ok(())
    }
}

pub type SlashExecutor =
    fn(GlobalState, Interaction, CommandData) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

pub struct CommandDefinition {
    pub name: &'static str,
    pub create_slash_data_fn: fn() -> twilight_model::application::command::Command,
    pub slash_executor: SlashExecutor,
}

#[macro_export]
macro_rules! command_def {
    ($command_type:ty) => {
        $crate::command_handler::CommandDefinition {
            name: <$command_type as twilight_interactions::command::CreateCommand>::NAME,
            create_slash_data_fn: || <$command_type as twilight_interactions::command::CreateCommand>::create_command().into(),
            slash_executor: |state, interaction, data| {
                Box::pin(<$command_type as $crate::command_handler::Command>::execute_slash_command(state, interaction, data))
            },
        }
    };
}
