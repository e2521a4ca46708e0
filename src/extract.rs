//! Inbound webhook extraction
//!
//! [`Extractor`] walks a webhook [`Envelope`] (entries → changes → messages /
//! statuses) and produces one [`ExtractedEntry`] per accepted change.
//!
//! Validation is two-tiered:
//!
//! - **Skipped** (logged at `warn`, the rest of the batch continues): an entry
//!   without id or for another account, a change for another product/number or
//!   without metadata, a message missing `id`/`from`/`timestamp`, a status
//!   missing `id`/`status`, an incomplete reply context, any list element
//!   (entry, change, contact, message, status) whose shape does not decode.
//! - **Fatal** ([`ExtractError`]): a wrong envelope object, metadata without
//!   sender fields, a contact without `wa_id`, content missing one of its
//!   required fields, an unknown message or interactive type.
//!
//! Webhook deliveries can batch several accounts and numbers together, so
//! traffic for someone else must never discard the rest of the delivery.
//!
//! # Example
//! ```rust
//! use serde_json::json;
//! use whatsapp_cloud_bridge::{message::Content, Extractor};
//!
//! let extractor = Extractor::new("WABA_ID", "PHONE_NUMBER_ID");
//! let entries = extractor
//!     .extract_value(json!({
//!         "object": "whatsapp_business_account",
//!         "entry": [{
//!             "id": "WABA_ID",
//!             "changes": [{
//!                 "field": "messages",
//!                 "value": {
//!                     "messaging_product": "whatsapp",
//!                     "metadata": {"display_phone_number": "15550000000", "phone_number_id": "PHONE_NUMBER_ID"},
//!                     "messages": [{
//!                         "from": "5519000000000", "id": "wamid.1", "timestamp": "1755291448",
//!                         "type": "text", "text": {"body": "hello"}
//!                     }]
//!                 }
//!             }]
//!         }]
//!     }))
//!     .unwrap();
//!
//! let messages = entries[0].messages.as_ref().unwrap();
//! assert_eq!(messages[0].content, Content::Text { text: "hello".into() });
//! ```

use std::{borrow::Cow, fmt};

use tracing::{debug, warn};

use crate::{
    config::Config,
    error::ExtractError,
    message::{
        Content, ExtractedEntry, InboundMessage, InteractiveReply, MessageType, OrderItem,
        Recipient, Reference, Sender, SharedContact, Status,
    },
    payload::{
        Change, ChangeValue, Contact, Entry, Envelope, Item, Metadata, RawButton, RawContext,
        RawInteractive, RawLocation, RawMedia, RawMessage, RawOrder, RawReaction, RawReply,
        RawSharedContact, RawStatus, RawText,
    },
    rest::present,
};

/// The only webhook object this crate accepts.
pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";
/// The only messaging product this crate accepts.
pub const MESSAGING_PRODUCT: &str = "whatsapp";
/// The only change field that produces entries.
pub const MESSAGES_FIELD: &str = "messages";

const DEFAULT_QUANTITY: u32 = 1;
const DEFAULT_ITEM_PRICE: f64 = 0.0;
const DEFAULT_CURRENCY: &str = "USD";

/// Reason an item was dropped from the output.
#[derive(Debug, PartialEq)]
pub(crate) enum Skip {
    MissingEntryId,
    AccountMismatch { found: String },
    ProductMismatch { found: Option<String> },
    MissingMetadata,
    PhoneNumberMismatch { found: Option<String> },
    MissingMessageField(&'static str),
    MissingStatusField(&'static str),
    IncompleteContext(&'static str),
    Malformed { item: &'static str, error: String },
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::MissingEntryId => f.write_str("no id found in entry"),
            Skip::AccountMismatch { found } => {
                write!(f, "entry id {found} does not match the configured account id")
            }
            Skip::ProductMismatch { found } => {
                write!(f, "messaging product is not '{MESSAGING_PRODUCT}' ({found:?})")
            }
            Skip::MissingMetadata => f.write_str("no metadata found in change"),
            Skip::PhoneNumberMismatch { found } => write!(
                f,
                "phone number id {found:?} does not match the configured phone number id"
            ),
            Skip::MissingMessageField(field) => write!(f, "no {field} found in message"),
            Skip::MissingStatusField(field) => write!(f, "no {field} found in status"),
            Skip::IncompleteContext(field) => write!(f, "no {field} found in context"),
            Skip::Malformed { item, error } => write!(f, "malformed {item}: {error}"),
        }
    }
}

/// Walks webhook payloads for one business account and phone number.
#[derive(Clone, Debug)]
pub struct Extractor {
    account_id: String,
    phone_number_id: String,
}

impl Extractor {
    /// Creates an extractor accepting traffic for `account_id` /
    /// `phone_number_id` only.
    pub fn new(account_id: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            phone_number_id: phone_number_id.into(),
        }
    }

    /// Creates an extractor from the identity part of a [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.account_id, &config.phone_number_id)
    }

    /// Decodes a raw webhook body and extracts it.
    pub fn extract_slice(&self, body: &[u8]) -> Result<Vec<ExtractedEntry>, ExtractError> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        self.extract(&envelope)
    }

    /// Decodes an already-parsed JSON document and extracts it.
    pub fn extract_value(
        &self,
        value: serde_json::Value,
    ) -> Result<Vec<ExtractedEntry>, ExtractError> {
        let envelope: Envelope = serde_json::from_value(value)?;
        self.extract(&envelope)
    }

    /// Extracts every accepted change of `envelope`, in payload order.
    ///
    /// Fails before looking at any entry if the envelope is not a
    /// `whatsapp_business_account` object.
    pub fn extract(&self, envelope: &Envelope) -> Result<Vec<ExtractedEntry>, ExtractError> {
        if envelope.object.as_deref() != Some(BUSINESS_ACCOUNT_OBJECT) {
            return Err(ExtractError::InvalidObject {
                found: envelope.object.clone(),
            });
        }

        let mut extracted = Vec::new();
        for (entry_index, entry) in slice(&envelope.entries).iter().enumerate() {
            let entry = match self.accept_entry(entry) {
                Ok(entry) => entry,
                Err(skip) => {
                    warn!(entry_index, %skip, "Skipping webhook entry");
                    continue;
                }
            };

            for (change_index, change) in slice(&entry.changes).iter().enumerate() {
                let (change, value, metadata) = match self.accept_change(change) {
                    Ok(accepted) => accepted,
                    Err(skip) => {
                        warn!(entry_index, change_index, %skip, "Skipping webhook change");
                        continue;
                    }
                };

                let sender = extract_sender(metadata)?;

                if change.field.as_deref() != Some(MESSAGES_FIELD) {
                    debug!(
                        entry_index,
                        change_index,
                        field = ?change.field,
                        "Ignoring change for unhandled field"
                    );
                    continue;
                }

                let contact = value
                    .contacts
                    .as_ref()
                    .and_then(|contacts| contacts.first())
                    .map(|contact| parsed(contact, "contact"));

                let recipient = match contact {
                    Some(Ok(contact)) => Some(extract_recipient(contact)?),
                    Some(Err(skip)) => {
                        warn!(entry_index, change_index, %skip, "Ignoring webhook contact");
                        None
                    }
                    None => None,
                };

                let messages = value.messages.as_deref().map(extract_messages).transpose()?;
                let statuses = value.statuses.as_deref().map(extract_statuses);

                extracted.push(ExtractedEntry {
                    sender,
                    recipient,
                    messages,
                    statuses,
                });
            }
        }

        Ok(extracted)
    }

    fn accept_entry<'e>(&self, entry: &'e Item<Entry>) -> Result<&'e Entry, Skip> {
        let entry = parsed(entry, "entry")?;
        let id = present(&entry.id).ok_or(Skip::MissingEntryId)?;
        if id != self.account_id {
            return Err(Skip::AccountMismatch { found: id.to_owned() });
        }
        Ok(entry)
    }

    fn accept_change<'c>(
        &self,
        change: &'c Item<Change>,
    ) -> Result<(&'c Change, &'c ChangeValue, &'c Metadata), Skip> {
        let change = parsed(change, "change")?;
        let product = change
            .value
            .as_ref()
            .and_then(|value| value.messaging_product.as_deref());

        let value = match (&change.value, product) {
            (Some(value), Some(MESSAGING_PRODUCT)) => value,
            _ => {
                return Err(Skip::ProductMismatch {
                    found: product.map(str::to_owned),
                })
            }
        };

        let metadata = value.metadata.as_ref().ok_or(Skip::MissingMetadata)?;

        if metadata.phone_number_id.as_deref() != Some(self.phone_number_id.as_str()) {
            return Err(Skip::PhoneNumberMismatch {
                found: metadata.phone_number_id.clone(),
            });
        }

        Ok((change, value, metadata))
    }
}

fn parsed<'a, T>(item: &'a Item<T>, kind: &'static str) -> Result<&'a T, Skip> {
    match item {
        Item::Parsed(parsed) => Ok(parsed),
        Item::Malformed(error) => Err(Skip::Malformed {
            item: kind,
            error: error.clone(),
        }),
    }
}

/// Builds the [`Sender`] from change metadata. Both fields are required.
pub fn extract_sender(metadata: &Metadata) -> Result<Sender, ExtractError> {
    let phone_number = present(&metadata.display_phone_number)
        .ok_or(ExtractError::MissingSenderField("display_phone_number"))?;
    let phone_number_id = present(&metadata.phone_number_id)
        .ok_or(ExtractError::MissingSenderField("phone_number_id"))?;

    Ok(Sender {
        phone_number: phone_number.to_owned(),
        phone_number_id: phone_number_id.to_owned(),
    })
}

/// Builds the [`Recipient`] from a change contact. `wa_id` is required.
pub fn extract_recipient(contact: &Contact) -> Result<Recipient, ExtractError> {
    let phone_number = present(&contact.wa_id).ok_or(ExtractError::MissingRecipientId)?;

    Ok(Recipient {
        name: contact
            .profile
            .as_ref()
            .and_then(|profile| present(&profile.name))
            .map(str::to_owned),
        phone_number: phone_number.to_owned(),
    })
}

/// Extracts every message carrying `id`, `from` and `timestamp`; others
/// (and malformed elements) are skipped. Fails on an unknown type or on
/// content missing a required field.
pub fn extract_messages(
    messages: &[Item<RawMessage>],
) -> Result<Vec<InboundMessage>, ExtractError> {
    let mut contents = Vec::with_capacity(messages.len());

    for (index, message) in messages.iter().enumerate() {
        let accepted = parsed(message, "message")
            .and_then(|message| Ok((message, required_message_fields(message)?)));

        let (message, (external_id, timestamp)) = match accepted {
            Ok(accepted) => accepted,
            Err(skip) => {
                warn!(message_index = index, %skip, "Skipping message");
                continue;
            }
        };

        let content = extract_content(message, index)?;
        let reference = message.context.as_ref().and_then(extract_reference);

        contents.push(InboundMessage {
            content,
            reference,
            external_id: external_id.to_owned(),
            timestamp: timestamp.to_owned(),
        });
    }

    Ok(contents)
}

fn required_message_fields(message: &RawMessage) -> Result<(&str, &str), Skip> {
    let id = present(&message.id).ok_or(Skip::MissingMessageField("id"))?;
    present(&message.from).ok_or(Skip::MissingMessageField("from"))?;
    let timestamp = present(&message.timestamp).ok_or(Skip::MissingMessageField("timestamp"))?;
    Ok((id, timestamp))
}

fn extract_content(message: &RawMessage, index: usize) -> Result<Content, ExtractError> {
    let kind = message
        .kind
        .as_deref()
        .and_then(|kind| kind.parse::<MessageType>().ok())
        .ok_or_else(|| ExtractError::UnsupportedMessageType {
            found: message.kind.clone(),
            index,
        })?;

    match kind {
        MessageType::Text => extract_text(&or_default(&message.text)),
        MessageType::Image => extract_image(&or_default(&message.image)),
        MessageType::Audio => extract_audio(&or_default(&message.audio)),
        MessageType::Video => extract_video(&or_default(&message.video)),
        MessageType::Document => extract_document(&or_default(&message.document)),
        MessageType::Sticker => extract_sticker(&or_default(&message.sticker)),
        MessageType::Location => extract_location(&or_default(&message.location)),
        MessageType::Contacts => extract_contacts(slice(&message.contacts)),
        MessageType::Interactive => {
            extract_interactive(&or_default(&message.interactive)).map(Content::from)
        }
        MessageType::Reaction => extract_reaction(&or_default(&message.reaction)),
        MessageType::Order => extract_order(&or_default(&message.order)),
        MessageType::Button => extract_button(&or_default(&message.button)),
    }
}

/// Extracts every status carrying `id` and `status`; others are skipped.
pub fn extract_statuses(statuses: &[Item<RawStatus>]) -> Vec<Status> {
    statuses
        .iter()
        .enumerate()
        .filter_map(|(index, status)| match parsed(status, "status").and_then(accept_status) {
            Ok(status) => Some(status),
            Err(skip) => {
                warn!(status_index = index, %skip, "Skipping status");
                None
            }
        })
        .collect()
}

fn accept_status(status: &RawStatus) -> Result<Status, Skip> {
    let external_id = present(&status.id).ok_or(Skip::MissingStatusField("id"))?;
    let state = present(&status.status).ok_or(Skip::MissingStatusField("status"))?;

    Ok(Status {
        external_id: external_id.to_owned(),
        status: state.to_owned(),
        timestamp: status.timestamp.clone(),
    })
}

/// Reads a reply context. Never fails: an incomplete context is logged and
/// dropped.
pub fn extract_reference(context: &RawContext) -> Option<Reference> {
    let fields = present(&context.from)
        .ok_or(Skip::IncompleteContext("from"))
        .and_then(|from| {
            present(&context.id)
                .ok_or(Skip::IncompleteContext("id"))
                .map(|id| (from, id))
        });

    match fields {
        Ok((from, id)) => Some(Reference {
            from: from.to_owned(),
            id: id.to_owned(),
        }),
        Err(skip) => {
            warn!(%skip, "Ignoring message context");
            None
        }
    }
}

pub fn extract_text(text: &RawText) -> Result<Content, ExtractError> {
    let body = present(&text.body).ok_or(ExtractError::missing("text", "body"))?;
    Ok(Content::Text {
        text: body.to_owned(),
    })
}

pub fn extract_image(image: &RawMedia) -> Result<Content, ExtractError> {
    Ok(Content::Image {
        media_id: media_id(image, "image")?,
        caption: owned(&image.caption),
        mime_type: owned(&image.mime_type),
    })
}

pub fn extract_audio(audio: &RawMedia) -> Result<Content, ExtractError> {
    Ok(Content::Audio {
        media_id: media_id(audio, "audio")?,
        mime_type: owned(&audio.mime_type),
        voice: audio.voice.unwrap_or(false),
    })
}

pub fn extract_video(video: &RawMedia) -> Result<Content, ExtractError> {
    Ok(Content::Video {
        media_id: media_id(video, "video")?,
        caption: owned(&video.caption),
        mime_type: owned(&video.mime_type),
    })
}

pub fn extract_document(document: &RawMedia) -> Result<Content, ExtractError> {
    Ok(Content::Document {
        media_id: media_id(document, "document")?,
        filename: owned(&document.filename),
        mime_type: owned(&document.mime_type),
        caption: owned(&document.caption),
    })
}

pub fn extract_sticker(sticker: &RawMedia) -> Result<Content, ExtractError> {
    Ok(Content::Sticker {
        media_id: media_id(sticker, "sticker")?,
        mime_type: owned(&sticker.mime_type),
        animated: sticker.animated.unwrap_or(false),
    })
}

/// Both coordinates are required. `0.0` is a valid coordinate.
pub fn extract_location(location: &RawLocation) -> Result<Content, ExtractError> {
    let latitude = location
        .latitude
        .ok_or(ExtractError::missing("location", "latitude"))?;
    let longitude = location
        .longitude
        .ok_or(ExtractError::missing("location", "longitude"))?;

    Ok(Content::Location {
        latitude,
        longitude,
        name: owned(&location.name),
        address: owned(&location.address),
    })
}

/// Fails on an empty list. A contact without phones yields an empty phone
/// list.
pub fn extract_contacts(contacts: &[RawSharedContact]) -> Result<Content, ExtractError> {
    if contacts.is_empty() {
        return Err(ExtractError::missing("contacts", "contacts"));
    }

    let contacts = contacts
        .iter()
        .map(|contact| SharedContact {
            name: contact.name.as_ref().and_then(|name| {
                present(&name.formatted_name).map(str::to_owned).or_else(|| {
                    let joined = [present(&name.first_name), present(&name.last_name)]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    (!joined.is_empty()).then_some(joined)
                })
            }),
            phones: slice(&contact.phones)
                .iter()
                .filter_map(|phone| present(&phone.wa_id).or_else(|| present(&phone.phone)))
                .map(str::to_owned)
                .collect(),
        })
        .collect();

    Ok(Content::Contacts { contacts })
}

/// Dispatches on `interactive.type`.
pub fn extract_interactive(interactive: &RawInteractive) -> Result<InteractiveReply, ExtractError> {
    match interactive.kind.as_deref() {
        Some("button_reply") => Ok(extract_button_reply(&or_default(&interactive.button_reply))),
        Some("list_reply") => Ok(extract_list_reply(&or_default(&interactive.list_reply))),
        _ => Err(ExtractError::UnsupportedInteractiveType {
            found: interactive.kind.clone(),
        }),
    }
}

pub fn extract_button_reply(reply: &RawReply) -> InteractiveReply {
    InteractiveReply::ButtonReply {
        id: owned(&reply.id),
        title: owned(&reply.title),
    }
}

pub fn extract_list_reply(reply: &RawReply) -> InteractiveReply {
    InteractiveReply::ListReply {
        id: owned(&reply.id),
        title: owned(&reply.title),
        description: owned(&reply.description),
    }
}

pub fn extract_reaction(reaction: &RawReaction) -> Result<Content, ExtractError> {
    let message_id =
        present(&reaction.message_id).ok_or(ExtractError::missing("reaction", "message_id"))?;
    let emoji = present(&reaction.emoji).ok_or(ExtractError::missing("reaction", "emoji"))?;

    Ok(Content::Reaction {
        message_id: message_id.to_owned(),
        emoji: emoji.to_owned(),
    })
}

pub fn extract_order(order: &RawOrder) -> Result<Content, ExtractError> {
    let catalog_id =
        present(&order.catalog_id).ok_or(ExtractError::missing("order", "catalog_id"))?;

    let items = slice(&order.product_items);
    if items.is_empty() {
        return Err(ExtractError::missing("order", "product_items"));
    }

    Ok(Content::Order {
        catalog_id: catalog_id.to_owned(),
        text: owned(&order.text),
        product_items: items
            .iter()
            .map(|item| OrderItem {
                product_retailer_id: owned(&item.product_retailer_id),
                quantity: item
                    .quantity
                    .filter(|quantity| *quantity != 0)
                    .unwrap_or(DEFAULT_QUANTITY),
                item_price: item.item_price.unwrap_or(DEFAULT_ITEM_PRICE),
                currency: present(&item.currency)
                    .unwrap_or(DEFAULT_CURRENCY)
                    .to_owned(),
            })
            .collect(),
    })
}

pub fn extract_button(button: &RawButton) -> Result<Content, ExtractError> {
    let payload = present(&button.payload).ok_or(ExtractError::missing("button", "payload"))?;
    let text = present(&button.text).ok_or(ExtractError::missing("button", "text"))?;

    Ok(Content::Button {
        payload: payload.to_owned(),
        text: text.to_owned(),
    })
}

fn media_id(media: &RawMedia, object: &'static str) -> Result<String, ExtractError> {
    present(&media.id)
        .map(str::to_owned)
        .ok_or(ExtractError::missing(object, "id"))
}

#[inline]
fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_owned)
}

#[inline]
fn slice<T>(list: &Option<Vec<T>>) -> &[T] {
    list.as_deref().unwrap_or(&[])
}

/// A missing content object reads as one with every field missing.
#[inline]
fn or_default<T: Clone + Default>(value: &Option<T>) -> Cow<'_, T> {
    match value {
        Some(value) => Cow::Borrowed(value),
        None => Cow::Owned(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn image_keeps_caption_and_mime_type() {
        let content = extract_image(&raw(json!({
            "id": "X",
            "caption": "C",
            "mime_type": "image/jpeg"
        })))
        .unwrap();

        assert_eq!(
            content,
            Content::Image {
                media_id: "X".into(),
                caption: Some("C".into()),
                mime_type: Some("image/jpeg".into()),
            }
        );
    }

    #[test]
    fn location_requires_both_coordinates() {
        let err = extract_location(&raw(json!({"latitude": -23.55052}))).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MissingField {
                object: "location",
                field: "longitude"
            }
        ));

        let content = extract_location(&raw(json!({"latitude": 0.0, "longitude": 0.0}))).unwrap();
        assert!(matches!(content, Content::Location { latitude, .. } if latitude == 0.0));
    }

    #[test]
    fn contacts_require_a_non_empty_list() {
        assert!(matches!(
            extract_contacts(&[]),
            Err(ExtractError::MissingField {
                object: "contacts",
                ..
            })
        ));

        let content = extract_contacts(&raw::<Vec<RawSharedContact>>(json!([
            {"name": {"first_name": "John", "last_name": "Doe"}}
        ])))
        .unwrap();

        assert_eq!(
            content,
            Content::Contacts {
                contacts: vec![SharedContact {
                    name: Some("John Doe".into()),
                    phones: vec![],
                }]
            }
        );
    }

    #[test]
    fn contact_phones_fall_back_to_phone() {
        let content = extract_contacts(&raw::<Vec<RawSharedContact>>(json!([{
            "name": {"formatted_name": "Jane"},
            "phones": [{"wa_id": "5519000000000"}, {"phone": "+1 555 0100"}, {}]
        }])))
        .unwrap();

        assert_eq!(
            content,
            Content::Contacts {
                contacts: vec![SharedContact {
                    name: Some("Jane".into()),
                    phones: vec!["5519000000000".into(), "+1 555 0100".into()],
                }]
            }
        );
    }

    #[test]
    fn order_items_get_defaults() {
        let content = extract_order(&raw(json!({
            "catalog_id": "catalog_id_123",
            "product_items": [{"product_retailer_id": "sku_1"}]
        })))
        .unwrap();

        assert_eq!(
            content,
            Content::Order {
                catalog_id: "catalog_id_123".into(),
                text: None,
                product_items: vec![OrderItem {
                    product_retailer_id: Some("sku_1".into()),
                    quantity: 1,
                    item_price: 0.0,
                    currency: "USD".into(),
                }],
            }
        );

        assert!(extract_order(&raw(json!({"catalog_id": "c", "product_items": []}))).is_err());
    }

    #[test]
    fn interactive_dispatches_on_sub_type() {
        let reply = extract_interactive(&raw(json!({
            "type": "button_reply",
            "button_reply": {"id": "yes", "title": "Yes"}
        })))
        .unwrap();
        assert_eq!(
            reply,
            InteractiveReply::ButtonReply {
                id: Some("yes".into()),
                title: Some("Yes".into()),
            }
        );

        let err = extract_interactive(&raw(json!({"type": "nfm_reply"}))).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnsupportedInteractiveType { found: Some(ref t) } if t == "nfm_reply"
        ));
    }

    #[test]
    fn reference_is_dropped_when_incomplete() {
        assert_eq!(extract_reference(&raw(json!({"from": "15550000000"}))), None);
        assert_eq!(
            extract_reference(&raw(json!({"from": "15550000000", "id": "wamid.0"}))),
            Some(Reference {
                from: "15550000000".into(),
                id: "wamid.0".into(),
            })
        );
    }

    #[test]
    fn messages_missing_identifiers_are_skipped() {
        let messages: Vec<Item<RawMessage>> = raw(json!([
            {"from": "1", "timestamp": "1", "type": "text", "text": {"body": "no id"}},
            {"id": "wamid.2", "timestamp": "1", "type": "text", "text": {"body": "no from"}},
            {"id": "wamid.3", "from": "1", "type": "text", "text": {"body": "no timestamp"}},
            {"id": "wamid.4", "from": "1", "timestamp": "1", "type": "text", "text": {"body": "ok"}}
        ]));

        let extracted = extract_messages(&messages).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].external_id, "wamid.4");
    }

    #[test]
    fn unknown_message_type_is_fatal() {
        let messages: Vec<Item<RawMessage>> = raw(json!([
            {"id": "wamid.1", "from": "1", "timestamp": "1", "type": "ephemeral"}
        ]));

        assert!(matches!(
            extract_messages(&messages),
            Err(ExtractError::UnsupportedMessageType { index: 0, .. })
        ));
    }

    #[test]
    fn typed_message_without_its_object_is_fatal() {
        let messages: Vec<Item<RawMessage>> = raw(json!([
            {"id": "wamid.1", "from": "1", "timestamp": "1", "type": "image"}
        ]));

        assert!(matches!(
            extract_messages(&messages),
            Err(ExtractError::MissingField {
                object: "image",
                field: "id"
            })
        ));
    }

    #[test]
    fn statuses_missing_fields_are_skipped() {
        let statuses: Vec<Item<RawStatus>> = raw(json!([
            {"status": "sent"},
            {"id": "wamid.1"},
            {"id": "wamid.2", "status": "read"}
        ]));

        assert_eq!(
            extract_statuses(&statuses),
            vec![Status {
                external_id: "wamid.2".into(),
                status: "read".into(),
                timestamp: None,
            }]
        );
    }

    #[test]
    fn sender_fields_are_required() {
        let err = extract_sender(&raw(json!({"phone_number_id": "1"}))).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MissingSenderField("display_phone_number")
        ));
    }

    #[test]
    fn skip_reasons_render_for_logs() {
        assert_eq!(
            Skip::AccountMismatch {
                found: "other".into()
            }
            .to_string(),
            "entry id other does not match the configured account id"
        );
        assert_eq!(
            Skip::MissingMessageField("timestamp").to_string(),
            "no timestamp found in message"
        );
        assert_eq!(
            Skip::Malformed {
                item: "entry",
                error: "expected a list".into()
            }
            .to_string(),
            "malformed entry: expected a list"
        );
    }

    #[test]
    fn malformed_messages_are_skipped() {
        let messages: Vec<Item<RawMessage>> = raw(json!([
            null,
            {"id": 7, "from": "1", "timestamp": "1", "type": "text", "text": {"body": "numeric id"}},
            {"id": "wamid.3", "from": "1", "timestamp": "1", "type": "audio", "audio": {"id": "A", "voice": "true"}},
            {"id": "wamid.4", "from": "1", "timestamp": "1", "type": "text", "text": {"body": "ok"}}
        ]));

        assert!(matches!(messages[0], Item::Malformed(_)));

        let extracted = extract_messages(&messages).unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].external_id, "wamid.4");
    }

    #[test]
    fn malformed_statuses_are_skipped() {
        let statuses: Vec<Item<RawStatus>> = raw(json!([
            "sent",
            {"id": ["wamid.1"], "status": "sent"},
            {"id": "wamid.2", "status": "delivered", "timestamp": 1755291448}
        ]));

        assert_eq!(
            extract_statuses(&statuses),
            vec![Status {
                external_id: "wamid.2".into(),
                status: "delivered".into(),
                timestamp: Some("1755291448".into()),
            }]
        );
    }

    #[test]
    fn zero_quantity_reads_as_one() {
        let content = extract_order(&raw(json!({
            "catalog_id": "c",
            "product_items": [{"product_retailer_id": "sku", "quantity": 0}, {"quantity": "3"}]
        })))
        .unwrap();

        let Content::Order { product_items, .. } = content else {
            panic!("expected an order");
        };
        assert_eq!(product_items[0].quantity, 1);
        assert_eq!(product_items[1].quantity, 3);
    }
}
