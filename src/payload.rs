//! Webhook payload structures
//!
//! The shapes the Cloud API POSTs to a webhook. Every field is optional:
//! presence rules are enforced by the [`extract`](crate::extract) module, which
//! decides per entity whether a gap is skipped or fatal.
//!
//! List levels (entries, changes, contacts, messages, statuses) are decoded
//! element by element into [`Item`]s. An element of the wrong shape becomes
//! [`Item::Malformed`] instead of failing the whole document.
//!
//! ```json
//! {
//!   "object": "whatsapp_business_account",
//!   "entry": [{
//!     "id": "WHATSAPP_BUSINESS_ACCOUNT_ID",
//!     "changes": [{
//!       "field": "messages",
//!       "value": {
//!         "messaging_product": "whatsapp",
//!         "metadata": { "display_phone_number": "...", "phone_number_id": "..." },
//!         "contacts": [{ "profile": { "name": "..." }, "wa_id": "..." }],
//!         "messages": [{ "from": "...", "id": "wamid...", "timestamp": "...", "type": "text", "text": { "body": "..." } }]
//!       }
//!     }]
//!   }]
//! }
//! ```

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use crate::rest::{deserialize_str_opt, deserialize_string_opt};

/// One element of a webhook list.
#[derive(Clone, Debug)]
pub enum Item<T> {
    Parsed(T),
    /// The element did not fit the schema; holds the decode error.
    Malformed(String),
}

impl<T: DeserializeOwned> Item<T> {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(parsed) => Item::Parsed(parsed),
            Err(err) => Item::Malformed(err.to_string()),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Item<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Item::from_value)
    }
}

/// `null` reads as absent; anything that is not an array reads as a single
/// malformed element.
fn deserialize_items<'de, T, D>(deserializer: D) -> Result<Option<Vec<Item<T>>>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Array(values) => Some(values.into_iter().map(Item::from_value).collect()),
        _ => Some(vec![Item::Malformed("expected a list".to_owned())]),
    })
}

/// A value of the wrong type reads as absent.
fn deserialize_lenient_opt<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// Top-level webhook document.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Envelope {
    /// The webhook object; `whatsapp_business_account` for this integration.
    #[serde(default, deserialize_with = "deserialize_lenient_opt")]
    pub object: Option<String>,

    /// Changes grouped by account. Multiple accounts may be batched together.
    #[serde(default, rename = "entry", deserialize_with = "deserialize_items")]
    pub entries: Option<Vec<Item<Entry>>>,
}

/// Webhook entry container
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Entry {
    /// The WhatsApp Business Account id.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_items")]
    pub changes: Option<Vec<Item<Change>>>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Change {
    /// The subscribed field, e.g. `messages`.
    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub value: Option<ChangeValue>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: Option<String>,

    #[serde(default)]
    pub metadata: Option<Metadata>,

    #[serde(default, deserialize_with = "deserialize_items")]
    pub contacts: Option<Vec<Item<Contact>>>,

    #[serde(default, deserialize_with = "deserialize_items")]
    pub messages: Option<Vec<Item<RawMessage>>>,

    #[serde(default, deserialize_with = "deserialize_items")]
    pub statuses: Option<Vec<Item<RawStatus>>>,
}

/// A metadata object describing the business phone number that received the
/// change.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default)]
    pub display_phone_number: Option<String>,

    #[serde(default)]
    pub phone_number_id: Option<String>,
}

/// The customer who sent the message.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Contact {
    #[serde(default)]
    pub profile: Option<Profile>,

    /// The customer's WhatsApp id.
    #[serde(default)]
    pub wa_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
}

/// A single received message. Only the object matching `type` is expected to
/// be set.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Present when the message replies to an earlier one.
    #[serde(default)]
    pub context: Option<RawContext>,

    #[serde(default)]
    pub text: Option<RawText>,
    #[serde(default)]
    pub image: Option<RawMedia>,
    #[serde(default)]
    pub audio: Option<RawMedia>,
    #[serde(default)]
    pub video: Option<RawMedia>,
    #[serde(default)]
    pub document: Option<RawMedia>,
    #[serde(default)]
    pub sticker: Option<RawMedia>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    #[serde(default)]
    pub contacts: Option<Vec<RawSharedContact>>,
    #[serde(default)]
    pub interactive: Option<RawInteractive>,
    #[serde(default)]
    pub reaction: Option<RawReaction>,
    #[serde(default)]
    pub order: Option<RawOrder>,
    #[serde(default)]
    pub button: Option<RawButton>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawContext {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawText {
    #[serde(default)]
    pub body: Option<String>,
}

/// Media object shared by image, audio, video, document and sticker.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawMedia {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub voice: Option<bool>,
    #[serde(default)]
    pub animated: Option<bool>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawLocation {
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawSharedContact {
    #[serde(default)]
    pub name: Option<RawContactName>,
    #[serde(default)]
    pub phones: Option<Vec<RawContactPhone>>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawContactName {
    #[serde(default)]
    pub formatted_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawContactPhone {
    #[serde(default)]
    pub wa_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawInteractive {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub button_reply: Option<RawReply>,
    #[serde(default)]
    pub list_reply: Option<RawReply>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawReply {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawReaction {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawOrder {
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub product_items: Option<Vec<RawProductItem>>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawProductItem {
    #[serde(default)]
    pub product_retailer_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_str_opt")]
    pub item_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Quick-reply button tap on a template message.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawButton {
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A delivery/read update for a message the business sent.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RawStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
}
