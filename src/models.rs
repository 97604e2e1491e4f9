//! Request and response types exchanged with the Lettermint API.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Response returned after an email is accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    /// Unique identifier of the sent message.
    pub message_id: String,
    /// Current message status: `pending`, `queued`, `processed`, `delivered`,
    /// `soft_bounced`, `hard_bounced` or `failed`.
    pub status: String,
}

/// Email attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Base64-encoded file content.
    pub content: String,
    /// Content-ID for inline attachments referenced as `cid:` in HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

/// Body of `POST /send`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct EmailPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Verified webhook event.
///
/// Only produced by a successful signature check; see [`crate::verify_webhook`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookEvent {
    /// Unique webhook delivery ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Event type, e.g. `message.delivered` or `message.hard_bounced`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,
    /// Unix timestamp of the event.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    /// Event-specific data.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: WebhookEventData,
    /// Original request body, for custom parsing of fields not modelled here.
    #[serde(skip)]
    pub raw_payload: Vec<u8>,
}

/// Event-specific data of a [`WebhookEvent`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookEventData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipient: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, String>,
    /// SMTP response details, present on delivery and bounce events.
    #[serde(default)]
    pub response: Option<WebhookResponse>,
}

/// SMTP response details attached to delivery events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_code: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Decode `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error body returned by the API on 4xx/5xx.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApiErrorResponse {
    pub message: Option<String>,
    pub error: Option<String>,
    pub error_type: Option<String>,
    pub errors: HashMap<String, Vec<String>>,
}
