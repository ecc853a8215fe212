use twilight_model::{
    channel::message::Embed,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    util::Timestamp,
};
use twilight_util::builder::embed::EmbedBuilder;

pub const ERROR_COLOR: u32 = 0xdd7878;

#[derive(Default, Clone)]
pub struct CommandResponse {
    pub embeds: Vec<Embed>,
    pub content: String,
}

impl CommandResponse {
    pub fn content(&self) -> Option<&str> {
        (!self.content.is_empty()).then_some(self.content.as_str())
    }

    pub fn embeds(&self) -> Option<&[Embed]> {
        (!self.embeds.is_empty()).then_some(self.embeds.as_slice())
    }
}

impl From<CommandResponse> for InteractionResponse {
    fn from(val: CommandResponse) -> Self {
        InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(InteractionResponseData {
                content: val.content().map(str::to_string),
                embeds: val.embeds().map(<[Embed]>::to_vec),
                ..Default::default()
            }),
        }
    }
}

#[derive(Default)]
pub struct CommandResponseBuilder {
    embeds: Vec<Embed>,
    content: String,
}

impl CommandResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn build(self) -> CommandResponse {
        CommandResponse {
            embeds: self.embeds,
            content: self.content,
        }
    }
}

pub fn now_timestamp() -> Option<Timestamp> {
    let now = chrono::Utc::now().timestamp_micros();
    match Timestamp::from_micros(now) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::warn!(error = ?e, "Failed to build current timestamp for embed");
            None
        }
    }
}

pub fn create_error_response(error: &anyhow::Error) -> CommandResponse {
    let mut embed = EmbedBuilder::new()
        .title("Command Error")
        .description(format!(
            "I ran into a problem trying to do that:\n```\n{}```",
            error
        ))
        .color(ERROR_COLOR);
    if let Some(timestamp) = now_timestamp() {
        embed = embed.timestamp(timestamp);
    }

    CommandResponseBuilder::new().embed(embed.build()).build()
}
