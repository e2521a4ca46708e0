use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use std::{
    borrow::Cow,
    collections::HashMap,
    future::{ready, Ready},
    sync::Arc,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    error::Error,
    extract::Extractor,
    server::{router, Handler, Server},
};

const SUBSCRIBE_MODE: &str = "subscribe";

/// Shared state of the webhook routes.
pub(crate) struct InnerServer<H> {
    pub(crate) extractor: Extractor,
    pub(crate) verify_token: String,
    pub(crate) handler: H,
}

impl Server {
    pub(crate) async fn serve_inner<H>(self, config: &Config, handler: H) -> Result<(), Error>
    where
        H: Handler + 'static,
    {
        let listener = TcpListener::bind(&self.config.endpoint)
            .await
            .map_err(|err| Error::network(err.into()))?;

        info!(
            endpoint = %self.config.endpoint,
            route = %self.config.route_path,
            "Webhook server listening"
        );

        let app = router(&self.config.route_path, config, handler);

        let r = if let Some(shutdown) = self.config.shutdown {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        } else {
            axum::serve(listener, app).await
        };

        r.map_err(|err| Error::network(err.into()))
    }
}

// Verification handler
pub(crate) fn handle_verification<H>(
    State(state): State<Arc<InnerServer<H>>>,
    Query(query): Query<HashMap<String, String>>,
) -> Ready<(StatusCode, Cow<'static, str>)>
where
    H: Handler + 'static,
{
    let mode = query.get("hub.mode").map(String::as_str);
    let token = query.get("hub.verify_token").map(String::as_str);

    if mode == Some(SUBSCRIBE_MODE)
        && !state.verify_token.is_empty()
        && token == Some(state.verify_token.as_str())
    {
        debug!("Webhook subscription verified");
        let challenge = query.get("hub.challenge").cloned().unwrap_or_default();
        ready((StatusCode::OK, challenge.into()))
    } else {
        warn!(?mode, "Webhook verification rejected");
        ready((StatusCode::FORBIDDEN, "Invalid verification token".into()))
    }
}

// Webhook handler
pub(crate) fn handle_webhook<H>(
    State(state): State<Arc<InnerServer<H>>>,
    body: Bytes,
) -> Ready<(StatusCode, Cow<'static, str>)>
where
    H: Handler + 'static,
{
    let document: Value = match serde_json::from_slice(&body) {
        Ok(document) => document,
        Err(err) => {
            warn!(error = %err, "Rejecting unparsable webhook body");
            return ready((
                StatusCode::BAD_REQUEST,
                "Invalid JSON payload. Please ensure the body is valid JSON.".into(),
            ));
        }
    };

    debug!(bytes = body.len(), "Webhook received");

    match state.extractor.extract_value(document) {
        Ok(entries) => {
            debug!(entries = entries.len(), "Webhook extracted");
            for entry in entries {
                let state = state.clone();
                tokio::spawn(async move { state.handler.handle_entry(entry).await });
            }
        }
        Err(err) => {
            error!(error = %err, "Webhook extraction failed");
            tokio::spawn(async move { state.handler.handle_error(err.into()).await });
        }
    }

    ready((StatusCode::OK, "".into()))
}
