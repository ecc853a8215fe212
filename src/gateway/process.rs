use std::sync::Arc;

use twilight_gateway::Event;
use twilight_model::application::interaction::InteractionData;

use crate::state::State;

pub async fn process(event: Event, state: Arc<State>) -> anyhow::Result<()> {
    match event {
        Event::InteractionCreate(interaction_payload) => {
            let mut interaction = interaction_payload.0;

            match std::mem::take(&mut interaction.data) {
                Some(InteractionData::ApplicationCommand(data)) => {
                    if let Err(e) =
                        crate::command_handler::slash_handler(interaction, *data, state.clone())
                            .await
                    {
                        tracing::error!(error = ?e, "Error handling slash command");
                    }
                }
                _ => {
                    tracing::debug!("Ignoring non-application-command interaction");
                }
            }
        }
        Event::Ready(ready) => {
            tracing::info!(
                user = %ready.user.name,
                guilds = ready.guilds.len(),
                "Gateway session ready"
            );
        }
        _ => {}
    }
    Ok(())
}
