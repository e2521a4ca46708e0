//! HTTP client for the Cloud API messages endpoint.
//!
//! # Example
//! ```rust,no_run
//! use serde_json::json;
//! use whatsapp_cloud_bridge::{Client, Config, SendRequest};
//!
//! # async fn example() -> Result<(), whatsapp_cloud_bridge::Error> {
//! let client = Client::new(Config::from_env()?)?;
//!
//! let sent = client
//!     .send_message(&SendRequest::new("5519000000000", "text", json!({"body": "Hello"})))
//!     .await?;
//! println!("sent {} to {}", sent.external_id, sent.recipient_phone_number);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client as HttpClient,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::{
    config::Config,
    error::Error,
    outbound::{self, SendOutcome, SendRequest, StatusRequest, WireRequest},
    rest::{client::handle_response, FromResponse},
};

/// Default user agent for the client
const USER_AGENT: &str = "whatsapp-cloud-bridge/0.1 (Rust)";

/// Sends messages and status updates for the configured phone number.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<InnerClient>,
}

#[derive(Debug)]
struct InnerClient {
    http_client: HttpClient,
    endpoint: String,
}

impl Client {
    /// Creates a client authenticated with `config.access_token`.
    pub fn new(config: Config) -> Result<Self, Error> {
        let auth = format!("Bearer {}", config.access_token);
        let mut auth: HeaderValue = auth
            .parse()
            .map_err(|err| Error::internal(format!("Invalid auth: {err}").into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let mut http = HttpClient::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            http = http.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(InnerClient {
                http_client: http.build()?,
                endpoint: config.messages_endpoint(),
            }),
        })
    }

    /// The messages endpoint every call is posted to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Validates and sends a message.
    ///
    /// Validation failures are returned before anything goes over the wire.
    pub async fn send_message(&self, request: &SendRequest) -> Result<SendOutcome, Error> {
        let wire = outbound::send_message(request)?;
        self.send_wire(&wire).await
    }

    /// Sends an already-built wire request.
    pub async fn send_wire(&self, wire: &WireRequest) -> Result<SendOutcome, Error> {
        let outcome: SendOutcome = self.post(wire).await?;
        debug!(
            to = %outcome.recipient_phone_number,
            external_id = %outcome.external_id,
            "Message sent"
        );
        Ok(outcome)
    }

    /// Marks a received message as read.
    pub async fn set_read(&self, recipient: &str, external_id: &str) -> Result<(), Error> {
        let request = outbound::set_read(recipient, external_id)?;
        self.post_status(&request).await
    }

    /// Marks a received message as read and shows a typing indicator.
    pub async fn set_typing_indicator(
        &self,
        recipient: &str,
        external_id: &str,
    ) -> Result<(), Error> {
        let request = outbound::set_typing_indicator(recipient, external_id)?;
        self.post_status(&request).await
    }

    async fn post_status(&self, request: &StatusRequest) -> Result<(), Error> {
        self.post(request).await
    }

    async fn post<B, T>(&self, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: FromResponse,
    {
        let result = self.execute(body).await;

        if let Err(err) = &result {
            error!(endpoint = self.endpoint(), error = %err, "Error sending message");
        }

        result
    }

    async fn execute<B, T>(&self, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: FromResponse,
    {
        let endpoint = self.endpoint();
        let response = self
            .inner
            .http_client
            .post(endpoint)
            .json(body)
            .send()
            .await?;

        handle_response(response, endpoint).await
    }
}
