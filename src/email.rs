//! Fluent email composition and sending.

use crate::models::{ApiErrorResponse, EmailPayload};
use crate::{ApiError, Attachment, Client, Error, Result, SendResponse};
use reqwest::StatusCode;
use reqwest::header::HeaderValue;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Fluent builder for composing and sending an email.
///
/// Create one per message with [`Client::email`]. Setters that take lists
/// (`to`, `cc`, `bcc`, `reply_to`) append, so they can be called repeatedly.
#[derive(Debug, Clone)]
#[must_use = "an email is only sent when `send` is awaited"]
pub struct EmailBuilder<'a> {
    client: &'a Client,
    payload: EmailPayload,
    idempotency_key: Option<String>,
}

impl<'a> EmailBuilder<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            payload: EmailPayload::default(),
            idempotency_key: None,
        }
    }

    /// Set the sender, either `john@example.com` or `John Doe <john@example.com>`.
    pub fn from(mut self, email: impl Into<String>) -> Self {
        self.payload.from = email.into();
        self
    }

    /// Add a recipient.
    pub fn to(mut self, email: impl Into<String>) -> Self {
        self.payload.to.push(email.into());
        self
    }

    /// Add a CC recipient.
    pub fn cc(mut self, email: impl Into<String>) -> Self {
        self.payload.cc.push(email.into());
        self
    }

    /// Add a BCC recipient.
    pub fn bcc(mut self, email: impl Into<String>) -> Self {
        self.payload.bcc.push(email.into());
        self
    }

    /// Add a Reply-To address.
    pub fn reply_to(mut self, email: impl Into<String>) -> Self {
        self.payload.reply_to.push(email.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.payload.subject = subject.into();
        self
    }

    /// Set the HTML body. At least one of HTML or text is required.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.payload.html = Some(html.into());
        self
    }

    /// Set the plain-text body. At least one of HTML or text is required.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.payload.text = Some(text.into());
        self
    }

    /// Add a custom email header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.headers.insert(key.into(), value.into());
        self
    }

    /// Merge custom email headers into those already set.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.payload
            .headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a file. `content` must already be base64-encoded.
    pub fn attach(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.payload.attachments.push(Attachment {
            filename: filename.into(),
            content: content.into(),
            content_id: None,
        });
        self
    }

    /// Attach a file for inline use, referenced from HTML as `cid:<content_id>`.
    pub fn attach_with_content_id(
        mut self,
        filename: impl Into<String>,
        content: impl Into<String>,
        content_id: impl Into<String>,
    ) -> Self {
        self.payload.attachments.push(Attachment {
            filename: filename.into(),
            content: content.into(),
            content_id: Some(content_id.into()),
        });
        self
    }

    /// Merge metadata into that already set.
    ///
    /// Metadata is echoed back in webhook payloads; it is not added to the
    /// email headers.
    pub fn metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.payload
            .metadata
            .extend(metadata.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a single metadata value.
    pub fn metadata_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.metadata.insert(key.into(), value.into());
        self
    }

    /// Tag the email for filtering in the dashboard.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.payload.tag = Some(tag.into());
        self
    }

    /// Select the sending route.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.payload.route = Some(route.into());
        self
    }

    /// Set an idempotency key. Requests repeating a key are only processed once.
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Send the email.
    ///
    /// # Errors
    /// - [`Error::InvalidRequest`] if a required field is missing (no request is made)
    /// - [`Error::Timeout`] / [`Error::Request`] for transport failures
    /// - [`Error::Api`] when the API answers with a 4xx or 5xx status
    /// - [`Error::ResponseParse`] when a success body cannot be decoded
    pub async fn send(self) -> Result<SendResponse> {
        self.validate()?;

        let body = serde_json::to_vec(&self.payload).map_err(Error::Serialize)?;

        let mut headers = self.client.headers();
        if let Some(key) = &self.idempotency_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| Error::InvalidRequest("invalid idempotency key".to_string()))?;
            headers.insert(IDEMPOTENCY_HEADER, value);
        }

        let url = self.client.endpoint("send");
        tracing::debug!(
            url = %url,
            recipients = self.payload.to.len(),
            idempotent = self.idempotency_key.is_some(),
            "sending email"
        );

        let response = self
            .client
            .http()
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if status.is_client_error() || status.is_server_error() {
            let err = parse_api_error(status, &bytes);
            tracing::warn!(status = status.as_u16(), error = %err, "email rejected by API");
            return Err(err.into());
        }

        let sent: SendResponse = serde_json::from_slice(&bytes).map_err(Error::ResponseParse)?;
        tracing::debug!(message_id = %sent.message_id, status = %sent.status, "email accepted");
        Ok(sent)
    }

    /// Check that all required fields are set.
    fn validate(&self) -> Result<()> {
        let payload = &self.payload;
        let reason = if payload.from.is_empty() {
            "from address is required"
        } else if payload.to.is_empty() {
            "at least one recipient is required"
        } else if payload.subject.is_empty() {
            "subject is required"
        } else if is_blank(&payload.html) && is_blank(&payload.text) {
            "either html or text body is required"
        } else {
            return Ok(());
        };
        Err(Error::InvalidRequest(reason.to_string()))
    }
}

fn is_blank(body: &Option<String>) -> bool {
    body.as_deref().is_none_or(str::is_empty)
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err)
    } else {
        Error::Request(err)
    }
}

/// Convert an error response into an [`ApiError`].
fn parse_api_error(status: StatusCode, body: &[u8]) -> ApiError {
    let response_body = String::from_utf8_lossy(body).into_owned();
    let parsed = serde_json::from_slice::<ApiErrorResponse>(body).ok();

    let mut err = ApiError {
        status_code: status.as_u16(),
        message: String::new(),
        error_type: None,
        errors: Default::default(),
        response_body: response_body.clone(),
    };

    match parsed {
        Some(parsed) => {
            err.message = parsed
                .message
                .filter(|m| !m.is_empty())
                .or(parsed.error)
                .unwrap_or_default();
            err.error_type = parsed.error_type.filter(|t| !t.is_empty());
            err.errors = parsed.errors;
        }
        None => err.message = response_body,
    }

    if err.message.is_empty() {
        err.message = status.canonical_reason().unwrap_or_default().to_string();
    }

    err
}
