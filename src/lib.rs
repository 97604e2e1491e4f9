//! # Lettermint
//! Asynchronous SDK for the Lettermint transactional email API: compose and send messages with [`Client`] and [`EmailBuilder`], and authenticate inbound webhooks with [`verify_webhook`] or [`Webhook`].
//!
//! ## Audience and uses
//! For Rust services that deliver email through Lettermint and consume its delivery webhooks: configure with [`ClientBuilder`], send with [`Client::email`], then verify each webhook delivery before trusting its [`WebhookEvent`].
//!
//! ## Runtime requirements
//! Sending is async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`. Webhook verification is synchronous and CPU-bound, so it can be called from any context.
//!
//! ## Out of scope
//! No retries are performed. A failed send is returned to the caller as-is; use [`EmailBuilder::idempotency_key`] when retrying yourself.
//!
//! ## Errors
//! Every fallible call returns the crate-wide [`Result`]. Match on [`Error::kind`] to tell transport failures, API rejections ([`Error::Api`]), and webhook failures apart. In particular [`ErrorKind::PayloadParse`] means the webhook sender was authenticated but the body was malformed, while [`ErrorKind::InvalidSignature`] means it was not.
//!
//! ## Example
//! ```no_run
//! use lettermint::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lettermint::Error> {
//!     let client = Client::new("your-api-token")?;
//!     let response = client
//!         .email()
//!         .from("John Doe <john@example.com>")
//!         .to("user@example.com")
//!         .subject("Hello from Lettermint")
//!         .html("<p>Hello World</p>")
//!         .send()
//!         .await?;
//!     println!("Sent {} ({})", response.message_id, response.status);
//!     Ok(())
//! }
//! ```
//!
//! Verifying a webhook:
//! ```no_run
//! use lettermint::{verify_webhook, DEFAULT_WEBHOOK_TOLERANCE};
//!
//! # fn handle(signature: &str, body: &[u8]) -> Result<(), lettermint::Error> {
//! let event = verify_webhook(signature, body, None, "whsec_secret", DEFAULT_WEBHOOK_TOLERANCE)?;
//! println!("{} for {}", event.event, event.data.recipient);
//! # Ok(())
//! # }
//! ```

mod client;
mod email;
mod error;
mod models;
mod webhook;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, VERSION};
pub use email::EmailBuilder;
pub use error::{ApiError, Error, ErrorKind};
pub use models::{Attachment, SendResponse, WebhookEvent, WebhookEventData, WebhookResponse};
pub use webhook::{
    DEFAULT_WEBHOOK_TOLERANCE, HEADER_DELIVERY, HEADER_SIGNATURE, SignatureToken, Webhook,
    sign_payload, verify_webhook, verify_webhook_request,
};

/// Result type alias for Lettermint operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
