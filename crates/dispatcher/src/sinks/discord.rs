//! DiscordWebhookSink - posts each event as a Discord embed

use std::time::Duration;

use adapter_registry::decode_params;
use contracts::{ContractError, Event, EventSink, EventType};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Discord rejects embeds with more fields than this
const MAX_EMBED_FIELDS: usize = 25;

const COLOR_BLUE: u32 = 3447003;
const COLOR_PURPLE: u32 = 10181046;
const COLOR_GREEN: u32 = 5763719;
const COLOR_RED: u32 = 15158332;
const COLOR_WHITE: u32 = 16777215;
const COLOR_ORANGE: u32 = 16711680;

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// `https://discord.com/api/webhooks/{id}/{token}`
    pub webhook_url: String,
}

impl DiscordConfig {
    pub fn from_params(params: &Value) -> Result<Self, ContractError> {
        let config: Self = decode_params(DiscordWebhookSink::TYPE, params)?;
        config.parsed_url()?;
        Ok(config)
    }

    /// Parse and check the webhook URL shape
    fn parsed_url(&self) -> Result<Url, ContractError> {
        let url = Url::parse(&self.webhook_url)
            .map_err(|e| ContractError::config_validation("webhook_url", e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContractError::config_validation(
                "webhook_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            [.., "webhooks", id, token] if id.parse::<u64>().is_ok() && !token.is_empty() => Ok(url),
            _ => Err(ContractError::config_validation(
                "webhook_url",
                "expected a path ending in /webhooks/{id}/{token}",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Embed {
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmbedMedia {
    url: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmbedAuthor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

/// Embed colour for an event type; `None` for types this sink cannot render
fn event_color(event_type: EventType) -> Option<u32> {
    match event_type {
        EventType::ObjectAdded => Some(COLOR_BLUE),
        EventType::ObjectUpdated => Some(COLOR_PURPLE),
        EventType::ObjectCompleted => Some(COLOR_GREEN),
        EventType::ObjectFailed | EventType::ObjectDeleted => Some(COLOR_RED),
        EventType::Informational | EventType::Test => Some(COLOR_WHITE),
        EventType::HealthIssue => Some(COLOR_ORANGE),
        EventType::Unknown => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn build_embed(event: &Event, color: u32) -> Embed {
    let author = non_empty(&event.source).map(|name| EmbedAuthor {
        name,
        icon_url: non_empty(&event.source_icon_url),
    });

    if event.metadata.len() > MAX_EMBED_FIELDS {
        debug!(
            fields = event.metadata.len(),
            max = MAX_EMBED_FIELDS,
            "Metadata truncated for embed"
        );
    }

    Embed {
        title: event.title.clone(),
        description: event.description.clone(),
        url: event.link_url.clone(),
        color,
        thumbnail: event.thumbnail_url.clone().map(|url| EmbedMedia { url }),
        image: event.image_url.clone().map(|url| EmbedMedia { url }),
        author,
        fields: event
            .metadata
            .iter()
            .take(MAX_EMBED_FIELDS)
            .map(|field| EmbedField {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect(),
    }
}

/// Sink that delivers events to a Discord channel webhook
pub struct DiscordWebhookSink {
    name: String,
    url: Url,
    client: reqwest::Client,
}

impl DiscordWebhookSink {
    pub const TYPE: &'static str = "discord-webhook";

    pub fn new(name: impl Into<String>, config: DiscordConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let url = config.parsed_url()?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        Ok(Self { name, url, client })
    }

    /// Create from an adapter payload (for the registry)
    pub fn from_params(name: &str, params: &Value) -> Result<Self, ContractError> {
        Self::new(name, DiscordConfig::from_params(params)?)
    }
}

impl EventSink for DiscordWebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "discord_sink_process",
        skip(self, event),
        fields(sink = %self.name, event_type = %event.event_type)
    )]
    async fn process(&mut self, event: &Event) -> Result<(), ContractError> {
        let color = event_color(event.event_type)
            .ok_or_else(|| ContractError::unknown_event_type(&self.name, event.event_type))?;

        let message = WebhookMessage {
            embeds: vec![build_embed(event, color)],
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&message)
            .send()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(sink = %self.name, status = %status, body = %body, "Discord rejected webhook message");
            return Err(ContractError::sink_write(
                &self.name,
                format!("webhook returned {status}"),
            ));
        }

        debug!(sink = %self.name, status = %status, "Embed delivered");
        Ok(())
    }

    #[instrument(name = "discord_sink_shutdown", skip(self))]
    async fn shutdown(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "DiscordWebhookSink closed");
        Ok(())
    }
}

/// Registry validator: `webhook_url` must be a Discord style webhook URL
pub fn validate_config(params: &Value) -> Result<(), ContractError> {
    DiscordConfig::from_params(params).map(|_| ())
}
