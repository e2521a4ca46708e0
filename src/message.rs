//! Normalized inbound records
//!
//! The flat, JSON-serializable shapes the [`Extractor`](crate::Extractor)
//! produces from a webhook delivery. Serialized keys are camelCase and every
//! message carries its `type` tag:
//!
//! ```json
//! {
//!   "type": "image",
//!   "mediaId": "X",
//!   "caption": "C",
//!   "mimeType": "image/jpeg",
//!   "externalId": "wamid...",
//!   "timestamp": "1755291448"
//! }
//! ```

use std::{fmt, str::FromStr};

use serde::Serialize;

/// One accepted change of a webhook delivery.
#[derive(Serialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntry {
    /// The business number that received the change.
    pub sender: Sender,

    /// The customer, when the change lists contacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Recipient>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<InboundMessage>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<Status>>,
}

/// The business phone number, taken from the change metadata.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub phone_number: String,
    pub phone_number_id: String,
}

/// The customer, taken from the first contact of the change.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: Option<String>,
    /// The customer's WhatsApp id (`wa_id`).
    pub phone_number: String,
}

/// A received message: its content plus the identifiers copied from the
/// source record.
#[derive(Serialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(flatten)]
    pub content: Content,

    /// The message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,

    pub external_id: String,
    pub timestamp: String,
}

/// Back-reference to a replied-to message.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct Reference {
    pub from: String,
    pub id: String,
}

/// Message payload, one variant per supported message `type`.
#[derive(Serialize, PartialEq, Clone, Debug)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Content {
    Text {
        text: String,
    },
    Image {
        media_id: String,
        caption: Option<String>,
        mime_type: Option<String>,
    },
    Audio {
        media_id: String,
        mime_type: Option<String>,
        voice: bool,
    },
    Video {
        media_id: String,
        caption: Option<String>,
        mime_type: Option<String>,
    },
    Document {
        media_id: String,
        filename: Option<String>,
        mime_type: Option<String>,
        caption: Option<String>,
    },
    Sticker {
        media_id: String,
        mime_type: Option<String>,
        animated: bool,
    },
    Location {
        latitude: f64,
        longitude: f64,
        name: Option<String>,
        address: Option<String>,
    },
    Contacts {
        contacts: Vec<SharedContact>,
    },
    Reaction {
        message_id: String,
        emoji: String,
    },
    Order {
        catalog_id: String,
        text: Option<String>,
        product_items: Vec<OrderItem>,
    },
    Button {
        payload: String,
        text: String,
    },
    /// Serialized with the reply's own tag (`button_reply` / `list_reply`).
    #[serde(untagged)]
    Interactive(InteractiveReply),
}

impl Content {
    /// The message type this content was read from.
    pub fn message_type(&self) -> MessageType {
        match self {
            Content::Text { .. } => MessageType::Text,
            Content::Image { .. } => MessageType::Image,
            Content::Audio { .. } => MessageType::Audio,
            Content::Video { .. } => MessageType::Video,
            Content::Document { .. } => MessageType::Document,
            Content::Sticker { .. } => MessageType::Sticker,
            Content::Location { .. } => MessageType::Location,
            Content::Contacts { .. } => MessageType::Contacts,
            Content::Reaction { .. } => MessageType::Reaction,
            Content::Order { .. } => MessageType::Order,
            Content::Button { .. } => MessageType::Button,
            Content::Interactive(_) => MessageType::Interactive,
        }
    }
}

impl From<InteractiveReply> for Content {
    fn from(reply: InteractiveReply) -> Self {
        Content::Interactive(reply)
    }
}

/// A user's answer to an interactive message.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractiveReply {
    ButtonReply {
        id: Option<String>,
        title: Option<String>,
    },
    ListReply {
        id: Option<String>,
        title: Option<String>,
        description: Option<String>,
    },
}

/// A contact card shared in a `contacts` message.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct SharedContact {
    pub name: Option<String>,
    pub phones: Vec<String>,
}

/// One line of an `order` message.
#[derive(Serialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_retailer_id: Option<String>,
    pub quantity: u32,
    pub item_price: f64,
    pub currency: String,
}

/// Delivery/read update for a previously sent message.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub external_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// The `type` tag of an inbound message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Sticker,
    Location,
    Contacts,
    Interactive,
    Reaction,
    Order,
    Button,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Audio => "audio",
            MessageType::Video => "video",
            MessageType::Document => "document",
            MessageType::Sticker => "sticker",
            MessageType::Location => "location",
            MessageType::Contacts => "contacts",
            MessageType::Interactive => "interactive",
            MessageType::Reaction => "reaction",
            MessageType::Order => "order",
            MessageType::Button => "button",
        }
    }
}

/// Returned when a `type` tag is not one of the supported message types.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownMessageType;

impl FromStr for MessageType {
    type Err = UnknownMessageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text" => MessageType::Text,
            "image" => MessageType::Image,
            "audio" => MessageType::Audio,
            "video" => MessageType::Video,
            "document" => MessageType::Document,
            "sticker" => MessageType::Sticker,
            "location" => MessageType::Location,
            "contacts" => MessageType::Contacts,
            "interactive" => MessageType::Interactive,
            "reaction" => MessageType::Reaction,
            "order" => MessageType::Order,
            "button" => MessageType::Button,
            _ => return Err(UnknownMessageType),
        })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_message_serializes_flat() {
        let message = InboundMessage {
            content: Content::Image {
                media_id: "X".into(),
                caption: Some("C".into()),
                mime_type: Some("image/jpeg".into()),
            },
            reference: None,
            external_id: "wamid.1".into(),
            timestamp: "1755291448".into(),
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "image",
                "mediaId": "X",
                "caption": "C",
                "mimeType": "image/jpeg",
                "externalId": "wamid.1",
                "timestamp": "1755291448"
            })
        );
    }

    #[test]
    fn interactive_reply_uses_its_own_tag() {
        let message = InboundMessage {
            content: InteractiveReply::ListReply {
                id: Some("row_1".into()),
                title: Some("Row".into()),
                description: None,
            }
            .into(),
            reference: Some(Reference {
                from: "15550000000".into(),
                id: "wamid.0".into(),
            }),
            external_id: "wamid.1".into(),
            timestamp: "1".into(),
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "list_reply",
                "id": "row_1",
                "title": "Row",
                "description": null,
                "reference": {"from": "15550000000", "id": "wamid.0"},
                "externalId": "wamid.1",
                "timestamp": "1"
            })
        );
    }

    #[test]
    fn message_type_round_trips_through_str() {
        for tag in ["text", "order", "interactive", "button"] {
            assert_eq!(tag.parse::<MessageType>().unwrap().as_str(), tag);
        }
        assert_eq!("ephemeral".parse::<MessageType>(), Err(UnknownMessageType));
    }
}
