use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use twilight_http::Client as HttpClient;
use twilight_model::{
    application::interaction::{
        Interaction,
        application_command::{CommandData, CommandOptionValue},
    },
    channel::Message,
    guild::Permissions,
    http::interaction::{InteractionResponse, InteractionResponseType},
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker},
    },
    user::User,
};

use crate::command_handler::response::CommandResponse;

pub trait FromCommandOptionValue: Sized {
    fn from_option_value(value: &CommandOptionValue) -> Option<Self>;
}

impl FromCommandOptionValue for String {
    fn from_option_value(value: &CommandOptionValue) -> Option<Self> {
        if let CommandOptionValue::String(s) = value {
            Some(s.clone())
        } else {
            None
        }
    }
}

impl FromCommandOptionValue for i64 {
    fn from_option_value(value: &CommandOptionValue) -> Option<Self> {
        match value {
            CommandOptionValue::Integer(i) => Some(*i),
            CommandOptionValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

pub struct CommandContext {
    pub interaction: Interaction,
    pub data: CommandData,
    pub http_client: Arc<HttpClient>,
    deferred: AtomicBool,
}

impl CommandContext {
    pub fn new(interaction: Interaction, data: CommandData, http_client: Arc<HttpClient>) -> Self {
        Self {
            interaction,
            data,
            http_client,
            deferred: AtomicBool::new(false),
        }
    }

    // later replies edit the deferred response in place
    pub async fn defer(&self) -> anyhow::Result<()> {
        if self.deferred.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.http_client
            .interaction(self.interaction.application_id)
            .create_response(
                self.interaction.id,
                &self.interaction.token,
                &InteractionResponse {
                    kind: InteractionResponseType::DeferredChannelMessageWithSource,
                    data: None,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn reply(&self, response: CommandResponse) -> anyhow::Result<Message> {
        let interaction_client = self.http_client.interaction(self.interaction.application_id);

        if self.deferred.load(Ordering::SeqCst) {
            let message = interaction_client
                .update_response(&self.interaction.token)
                .content(response.content())
                .embeds(response.embeds())
                .await?
                .model()
                .await?;
            return Ok(message);
        }

        interaction_client
            .create_response(
                self.interaction.id,
                &self.interaction.token,
                &InteractionResponse::from(response),
            )
            .await?;

        let message = interaction_client
            .response(&self.interaction.token)
            .await?
            .model()
            .await?;
        Ok(message)
    }

    pub async fn reply_error(
        &self,
        error: &anyhow::Error,
        create_error_fn: impl Fn(&anyhow::Error) -> CommandResponse,
    ) -> anyhow::Result<()> {
        tracing::error!(error = ?error, command = %self.data.name, "Command execution failed");
        let error_response = create_error_fn(error);
        self.reply(error_response).await?;
        Ok(())
    }

    pub fn get_arg<T: FromCommandOptionValue>(&self, name: &str) -> Option<T> {
        self.data
            .options
            .iter()
            .find(|opt| opt.name == name)
            .and_then(|opt| T::from_option_value(&opt.value))
    }

    pub fn author(&self) -> Option<&User> {
        self.interaction.author()
    }

    pub fn guild_id(&self) -> anyhow::Result<Id<GuildMarker>> {
        self.interaction
            .guild_id
            .ok_or_else(|| anyhow::anyhow!("This command must be used in a guild."))
    }

    pub fn channel_id(&self) -> Option<Id<ChannelMarker>> {
        self.interaction.channel.as_ref().map(|channel| channel.id)
    }

    pub fn is_administrator(&self) -> bool {
        self.interaction
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|permissions| permissions.contains(Permissions::ADMINISTRATOR))
    }
}
