#![deny(clippy::future_not_send)]
#![deny(clippy::large_enum_variant)]

//! # whatsapp_cloud_bridge
//!
//! An adapter between the WhatsApp Cloud API and your application.
//!
//! ## Features
//!
//! - **Inbound extraction**: turn webhook deliveries into flat, typed,
//!   serializable records. Traffic for another account or phone number and
//!   incomplete messages are logged and skipped; malformed content aborts.
//! - **Outbound building**: validate a loosely-typed send request (text,
//!   media, contacts, reactions, interactive cta/list/buttons) against the
//!   provider's rules and produce the exact wire JSON.
//! - **Client**: post built requests to the messages endpoint, mark messages
//!   as read and show typing indicators.
//! - **Webhook server** (`server` feature, on by default): an axum router for
//!   the subscription handshake and webhook deliveries.
//!
//! This crate logs through [`tracing`] and never installs a subscriber.
//!
//! ## Examples
//!
//! ### Extract a webhook delivery
//! ```rust
//! use whatsapp_cloud_bridge::{message::Content, Extractor};
//!
//! let body = r#"{
//!   "object": "whatsapp_business_account",
//!   "entry": [{
//!     "id": "WABA_ID",
//!     "changes": [{
//!       "field": "messages",
//!       "value": {
//!         "messaging_product": "whatsapp",
//!         "metadata": {"display_phone_number": "15550000000", "phone_number_id": "PHONE_ID"},
//!         "contacts": [{"profile": {"name": "Ana"}, "wa_id": "5519000000000"}],
//!         "messages": [{
//!           "from": "5519000000000", "id": "wamid.1", "timestamp": "1755291448",
//!           "type": "reaction", "reaction": {"message_id": "wamid.0", "emoji": "👍"}
//!         }]
//!       }
//!     }]
//!   }]
//! }"#.as_bytes();
//!
//! let entries = Extractor::new("WABA_ID", "PHONE_ID").extract_slice(body).unwrap();
//! let entry = &entries[0];
//!
//! assert_eq!(entry.sender.phone_number, "15550000000");
//! assert_eq!(entry.recipient.as_ref().unwrap().name.as_deref(), Some("Ana"));
//! assert!(matches!(
//!     entry.messages.as_ref().unwrap()[0].content,
//!     Content::Reaction { .. }
//! ));
//! ```
//!
//! ### Send an interactive message
//! ```rust,no_run
//! use serde_json::json;
//! use whatsapp_cloud_bridge::{Client, Config, SendRequest};
//!
//! # async fn example() -> Result<(), whatsapp_cloud_bridge::Error> {
//! let client = Client::new(Config::from_env()?)?;
//!
//! let request = SendRequest::new(
//!     "5519000000000",
//!     "interactive_buttons",
//!     json!({
//!         "body": "Did this answer your question?",
//!         "action": {"buttons": [
//!             {"id": "yes", "title": "Yes"},
//!             {"id": "no", "title": "No"}
//!         ]}
//!     }),
//! );
//!
//! let sent = client.send_message(&request).await?;
//! client.set_read(&sent.recipient_phone_number, "wamid.RECEIVED").await?;
//! # Ok(())
//! # }
//! ```

mod rest;

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod message;
pub mod outbound;
pub mod payload;
#[cfg(feature = "server")]
pub mod server;

pub use client::Client;
pub use config::Config;
pub use error::Error;
pub use extract::Extractor;
pub use message::{Content, ExtractedEntry, InboundMessage};
pub use outbound::{send_message, SendOutcome, SendRequest, WireRequest};
#[cfg(feature = "server")]
pub use server::{Handler as WebhookHandler, Server};
