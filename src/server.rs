//! Webhook server
//!
//! An axum router answering the Cloud API's subscription handshake (`GET`) and
//! webhook deliveries (`POST`). Deliveries are run through an [`Extractor`]
//! and each accepted entry is handed to your [`Handler`] on its own task.
//!
//! Every delivery whose body parses as JSON is acknowledged with `200`, even
//! when extraction fails, so the provider does not redeliver it. Failures are
//! logged and passed to [`Handler::handle_error`].
//!
//! # Example
//! ```rust,no_run
//! use whatsapp_cloud_bridge::{server::{Handler, Server}, Config, ExtractedEntry};
//!
//! struct Printer;
//!
//! impl Handler for Printer {
//!     async fn handle_entry(&self, entry: ExtractedEntry) {
//!         for message in entry.messages.unwrap_or_default() {
//!             println!("{} sent {:?}", message.external_id, message.content);
//!         }
//!     }
//! }
//!
//! # async fn example() -> Result<(), whatsapp_cloud_bridge::Error> {
//! let config = Config::from_env()?;
//!
//! Server::builder()
//!     .endpoint("0.0.0.0:8080".parse().unwrap())
//!     .route("/webhook")
//!     .build()
//!     .serve(&config, Printer)
//!     .await
//! # }
//! ```
//!
//! [`Extractor`]: crate::Extractor

use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr},
    pin::Pin,
    sync::Arc,
};

use axum::{routing::get, Router};

use crate::{
    config::Config,
    error::Error,
    extract::Extractor,
    message::ExtractedEntry,
    rest::server::{handle_verification, handle_webhook, InnerServer},
};

// Default Server configuration...
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ROUTE_PATH: &str = "/";

/// WhatsApp webhook server
///
/// Create using [`Server::builder()`] or [`Server::new()`].
#[derive(Default)]
pub struct Server {
    pub(crate) config: ServerBuilder,
}

impl Server {
    /// Create a new server with default settings
    pub fn new() -> Self {
        ServerBuilder::new().build()
    }

    /// Create a server builder for custom configuration
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the configured endpoint and serves webhook traffic until the
    /// shutdown future (if any) resolves.
    ///
    /// `config` supplies the account and phone number to accept traffic for
    /// and the verify token for the handshake.
    pub async fn serve<H: Handler + 'static>(
        self,
        config: &Config,
        handler: H,
    ) -> Result<(), Error> {
        self.serve_inner(config, handler).await
    }
}

/// Configuration for a [`Server`].
#[must_use]
pub struct ServerBuilder {
    pub(crate) endpoint: SocketAddr,
    pub(crate) route_path: String,
    pub(crate) shutdown: Option<Pin<Box<dyn Future<Output = ()> + Send + 'static>>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            endpoint: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            route_path: DEFAULT_ROUTE_PATH.to_owned(),
            shutdown: None,
        }
    }
}

impl ServerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to listen on. Defaults to `127.0.0.1:3000`.
    pub fn endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the webhook path. Defaults to `/`.
    pub fn route<P: Into<String>>(mut self, path: P) -> Self {
        self.route_path = path.into();
        self
    }

    /// Sets a future that, when resolved, gracefully shuts the server down.
    ///
    /// # Example
    /// ```rust,no_run
    /// use whatsapp_cloud_bridge::server::ServerBuilder;
    ///
    /// let builder = ServerBuilder::new().shutdown(async {
    ///     let _ = tokio::signal::ctrl_c().await;
    /// });
    /// ```
    pub fn shutdown<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shutdown = Some(Box::pin(shutdown));
        self
    }

    pub fn build(self) -> Server {
        Server { config: self }
    }
}

/// Builds the webhook router without binding a listener, for mounting into
/// an existing axum application.
pub fn router<H: Handler + 'static>(route_path: &str, config: &Config, handler: H) -> Router {
    let state = Arc::new(InnerServer {
        extractor: Extractor::from_config(config),
        verify_token: config.verify_token.clone(),
        handler,
    });

    Router::new()
        .route(
            route_path,
            get(handle_verification::<H>).post(handle_webhook::<H>),
        )
        .with_state(state)
}

/// Receives the outcome of each webhook delivery.
///
/// Both methods default to doing nothing; failures are logged regardless.
///
/// # Example
/// ```rust
/// use whatsapp_cloud_bridge::{server::Handler, ExtractedEntry};
///
/// struct MyHandler;
///
/// impl Handler for MyHandler {
///     async fn handle_entry(&self, entry: ExtractedEntry) {
///         println!("{} messages", entry.messages.map_or(0, |m| m.len()));
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Handle one accepted webhook change
    fn handle_entry(&self, _entry: ExtractedEntry) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Handle a delivery that could not be extracted
    fn handle_error(&self, _error: Error) -> impl Future<Output = ()> + Send {
        async {}
    }
}

impl<F, Fut> Handler for F
where
    Fut: Future<Output = ()> + Send,
    F: Fn(ExtractedEntry) -> Fut + Send + Sync,
{
    #[inline]
    fn handle_entry(&self, entry: ExtractedEntry) -> impl Future<Output = ()> + Send {
        self(entry)
    }
}
