//! Outbound message building
//!
//! Turns a loosely-typed [`SendRequest`] into the provider's [`WireRequest`],
//! validating every parameter before any network call is made.
//!
//! | `type` | required params | optional params |
//! |---|---|---|
//! | `audio` | `link` | `replyToId` |
//! | `contacts` | `firstName`, `emails[]`, `phones[]` | `lastName`, `replyToId` |
//! | `document` | `link` | `caption`, `filename`, `replyToId` |
//! | `image` | `link` | `caption` |
//! | `text` | `body` | `previewUrl`, `replyToId` |
//! | `video` | `link` | `caption`, `replyToId` |
//! | `reaction` | `messageId`, `emoji` | |
//! | `interactive_cta` / `interactive_list` / `interactive_buttons` | `body`, `action` | `header`, `footer` |
//!
//! # Example
//! ```rust
//! use serde_json::json;
//! use whatsapp_cloud_bridge::outbound::{send_message, SendRequest};
//!
//! let request = SendRequest::new("5519000000000", "text", json!({"body": "hi"}));
//! let wire = send_message(&request).unwrap();
//!
//! assert_eq!(
//!     serde_json::to_value(&wire).unwrap(),
//!     json!({
//!         "messaging_product": "whatsapp",
//!         "recipient_type": "individual",
//!         "to": "5519000000000",
//!         "type": "text",
//!         "text": {"preview_url": false, "body": "hi"}
//!     })
//! );
//! ```

use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{error::BuildError, rest::present};

pub use crate::rest::client::{
    InteractiveKind, SendOutcome, StatusRequest, TypingIndicator, WireAction, WireBody,
    WireButton, WireContact, WireContactName, WireContext, WireCtaParameters, WireEmail,
    WireHeader, WireInteractive, WireInteractiveText, WireMedia, WirePhone, WireReaction,
    WireReply, WireRequest, WireRow, WireSection, WireText,
};
use crate::rest::client::MESSAGING_PRODUCT;

pub const MAX_BODY_LEN: usize = 4096;
pub const MAX_FOOTER_LEN: usize = 60;
pub const MAX_HEADER_TEXT_LEN: usize = 60;
pub const MAX_CTA_DISPLAY_TEXT_LEN: usize = 20;
pub const MAX_SECTION_TITLE_LEN: usize = 24;
pub const MAX_ROW_ID_LEN: usize = 200;
pub const MAX_ROW_TITLE_LEN: usize = 24;
pub const MAX_ROW_DESCRIPTION_LEN: usize = 72;
pub const MAX_BUTTON_ID_LEN: usize = 200;
pub const MAX_BUTTON_TITLE_LEN: usize = 20;

/// A caller's request to send one message.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub recipient_phone_number: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Type-specific parameters, see the module table.
    #[serde(default)]
    pub params: Value,
}

impl SendRequest {
    pub fn new(
        recipient_phone_number: impl Into<String>,
        kind: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            recipient_phone_number: recipient_phone_number.into(),
            kind: kind.into(),
            params,
        }
    }
}

/// The outbound message kinds a [`SendRequest`] may name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SendType {
    Audio,
    Contacts,
    Document,
    Image,
    Text,
    Video,
    Reaction,
    InteractiveCta,
    InteractiveList,
    InteractiveButtons,
}

impl SendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendType::Audio => "audio",
            SendType::Contacts => "contacts",
            SendType::Document => "document",
            SendType::Image => "image",
            SendType::Text => "text",
            SendType::Video => "video",
            SendType::Reaction => "reaction",
            SendType::InteractiveCta => "interactive_cta",
            SendType::InteractiveList => "interactive_list",
            SendType::InteractiveButtons => "interactive_buttons",
        }
    }
}

impl FromStr for SendType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "audio" => SendType::Audio,
            "contacts" => SendType::Contacts,
            "document" => SendType::Document,
            "image" => SendType::Image,
            "text" => SendType::Text,
            "video" => SendType::Video,
            "reaction" => SendType::Reaction,
            "interactive_cta" => SendType::InteractiveCta,
            "interactive_list" => SendType::InteractiveList,
            "interactive_buttons" => SendType::InteractiveButtons,
            other => return Err(BuildError::UnsupportedType(other.to_owned())),
        })
    }
}

impl fmt::Display for SendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Params of `audio`, `document`, `image` and `video` messages.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaParams {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactsParams {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub emails: Option<Vec<String>>,
    #[serde(default)]
    pub phones: Option<Vec<String>>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextParams {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub preview_url: Option<bool>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReactionParams {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Params shared by the three interactive kinds.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveParams {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub header: Option<HeaderParams>,
    #[serde(default)]
    pub action: Option<ActionParams>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeaderParams {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Union of the cta, list and buttons action params. Each kind reads only
/// its own fields.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActionParams {
    #[serde(default)]
    pub display_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<GroupParams>>,
    #[serde(default)]
    pub buttons: Option<Vec<ButtonParams>>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<OptionParams>>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptionParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ButtonParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Validates `request` and builds its wire body.
///
/// Fails on an empty recipient or type, an unknown type, params that do not
/// fit the type's shape, or any parameter rule of the type.
pub fn send_message(request: &SendRequest) -> Result<WireRequest, BuildError> {
    let to = request.recipient_phone_number.as_str();
    if to.is_empty() {
        return Err(BuildError::MissingRecipient);
    }
    if request.kind.is_empty() {
        return Err(BuildError::MissingType);
    }

    let kind: SendType = request.kind.parse()?;
    let params = &request.params;

    match kind {
        SendType::Audio => build_audio(to, &decode(kind, params)?),
        SendType::Contacts => build_contacts(to, &decode(kind, params)?),
        SendType::Document => build_document(to, &decode(kind, params)?),
        SendType::Image => build_image(to, &decode(kind, params)?),
        SendType::Text => build_text(to, &decode(kind, params)?),
        SendType::Video => build_video(to, &decode(kind, params)?),
        SendType::Reaction => build_reaction(to, &decode(kind, params)?),
        SendType::InteractiveCta => {
            build_interactive(to, InteractiveKind::CtaUrl, &decode(kind, params)?)
        }
        SendType::InteractiveList => {
            build_interactive(to, InteractiveKind::List, &decode(kind, params)?)
        }
        SendType::InteractiveButtons => {
            build_interactive(to, InteractiveKind::Button, &decode(kind, params)?)
        }
    }
}

/// `null` params read as an empty object.
fn decode<T: DeserializeOwned + Default>(kind: SendType, params: &Value) -> Result<T, BuildError> {
    if params.is_null() {
        return Ok(T::default());
    }
    T::deserialize(params).map_err(|source| BuildError::InvalidParams {
        message: kind.as_str(),
        source,
    })
}

pub fn build_audio(to: &str, params: &MediaParams) -> Result<WireRequest, BuildError> {
    let link = required(&params.link, "audio message", "link")?;

    let audio = WireMedia {
        link,
        caption: None,
        filename: None,
    };
    Ok(WireRequest::individual(to, WireBody::Audio { audio })
        .reply_to(present(&params.reply_to_id)))
}

/// Contacts requests carry no `recipient_type`.
pub fn build_contacts(to: &str, params: &ContactsParams) -> Result<WireRequest, BuildError> {
    let first_name = required(&params.first_name, "contacts message", "firstName")?;
    let emails = non_empty(&params.emails, "contacts message", "emails")?;
    let phones = non_empty(&params.phones, "contacts message", "phones")?;

    let last_name = present(&params.last_name).unwrap_or_default().to_owned();
    let formatted_name = if last_name.is_empty() {
        first_name.clone()
    } else {
        format!("{first_name} {last_name}")
    };

    let contact = WireContact {
        emails: emails
            .iter()
            .map(|email| WireEmail {
                email: email.clone(),
            })
            .collect(),
        name: WireContactName {
            formatted_name,
            first_name,
            last_name,
        },
        phones: phones
            .iter()
            .map(|phone| WirePhone {
                phone: phone.clone(),
            })
            .collect(),
    };

    Ok(WireRequest {
        messaging_product: MESSAGING_PRODUCT,
        recipient_type: None,
        to: to.to_owned(),
        context: None,
        body: WireBody::Contacts {
            contacts: vec![contact],
        },
    }
    .reply_to(present(&params.reply_to_id)))
}

pub fn build_document(to: &str, params: &MediaParams) -> Result<WireRequest, BuildError> {
    let link = required(&params.link, "document message", "link")?;

    let document = WireMedia {
        link,
        caption: Some(or_empty(&params.caption)),
        filename: Some(or_empty(&params.filename)),
    };
    Ok(WireRequest::individual(to, WireBody::Document { document })
        .reply_to(present(&params.reply_to_id)))
}

/// Image messages are never sent as replies; `replyToId` is ignored.
pub fn build_image(to: &str, params: &MediaParams) -> Result<WireRequest, BuildError> {
    let link = required(&params.link, "image message", "link")?;

    let image = WireMedia {
        link,
        caption: Some(or_empty(&params.caption)),
        filename: None,
    };
    Ok(WireRequest::individual(to, WireBody::Image { image }))
}

pub fn build_text(to: &str, params: &TextParams) -> Result<WireRequest, BuildError> {
    let body = required(&params.body, "text message", "body")?;

    let text = WireText {
        preview_url: params.preview_url.unwrap_or(false),
        body,
    };
    Ok(WireRequest::individual(to, WireBody::Text { text }).reply_to(present(&params.reply_to_id)))
}

pub fn build_video(to: &str, params: &MediaParams) -> Result<WireRequest, BuildError> {
    let link = required(&params.link, "video message", "link")?;

    let video = WireMedia {
        link,
        caption: Some(or_empty(&params.caption)),
        filename: None,
    };
    Ok(WireRequest::individual(to, WireBody::Video { video })
        .reply_to(present(&params.reply_to_id)))
}

pub fn build_reaction(to: &str, params: &ReactionParams) -> Result<WireRequest, BuildError> {
    let message_id = required(&params.message_id, "reaction message", "messageId")?;
    let emoji = required(&params.emoji, "reaction message", "emoji")?;

    let reaction = WireReaction { message_id, emoji };
    Ok(WireRequest::individual(to, WireBody::Reaction { reaction }))
}

/// Builds a cta, list or buttons message.
///
/// A header is only emitted when it names a `type`; list messages reject
/// any header that is not `text`.
pub fn build_interactive(
    to: &str,
    kind: InteractiveKind,
    params: &InteractiveParams,
) -> Result<WireRequest, BuildError> {
    let body = required(&params.body, "interactive message", "body")?;
    check_len("Body text", &body, MAX_BODY_LEN)?;

    let action = params
        .action
        .as_ref()
        .ok_or(BuildError::missing("interactive message", "action"))?;

    let footer = present(&params.footer)
        .map(|footer| {
            check_len("Footer text", footer, MAX_FOOTER_LEN).map(|_| WireInteractiveText {
                text: footer.to_owned(),
            })
        })
        .transpose()?;

    let header_params = params
        .header
        .as_ref()
        .and_then(|header| present(&header.kind).map(|kind| (header, kind)));

    let header = header_params
        .map(|(header, kind)| build_header(kind, header))
        .transpose()?;

    let action = match kind {
        InteractiveKind::CtaUrl => build_cta_action(action)?,
        InteractiveKind::List => {
            if let Some((_, found)) = header_params {
                if found != "text" {
                    return Err(BuildError::ListHeaderNotText {
                        found: found.to_owned(),
                    });
                }
            }
            build_list_action(action)?
        }
        InteractiveKind::Button => build_buttons_action(action)?,
    };

    let interactive = WireInteractive {
        kind,
        header,
        body: WireInteractiveText { text: body },
        footer,
        action,
    };
    Ok(WireRequest::individual(to, WireBody::Interactive { interactive }))
}

fn build_header(kind: &str, header: &HeaderParams) -> Result<WireHeader, BuildError> {
    let media = |message| -> Result<WireMedia, BuildError> {
        Ok(WireMedia {
            link: required(&header.link, message, "header.link")?,
            caption: None,
            filename: None,
        })
    };

    Ok(match kind {
        "document" => WireHeader::Document {
            document: WireMedia {
                filename: Some(or_empty(&header.filename)),
                ..media("document header")?
            },
        },
        "image" => WireHeader::Image {
            image: media("image header")?,
        },
        "text" => {
            let text = required(&header.text, "text header", "header.text")?;
            check_len("Header text", &text, MAX_HEADER_TEXT_LEN)?;
            WireHeader::Text { text }
        }
        "video" => WireHeader::Video {
            video: media("video header")?,
        },
        other => return Err(BuildError::UnsupportedHeaderType(other.to_owned())),
    })
}

fn build_cta_action(action: &ActionParams) -> Result<WireAction, BuildError> {
    let display_text = required(&action.display_text, "interactive CTA action", "displayText")?;
    let url = required(&action.url, "interactive CTA action", "url")?;
    check_len("Display text", &display_text, MAX_CTA_DISPLAY_TEXT_LEN)?;

    Ok(WireAction::CtaUrl {
        name: "cta_url",
        parameters: WireCtaParameters { display_text, url },
    })
}

fn build_list_action(action: &ActionParams) -> Result<WireAction, BuildError> {
    let button = required(&action.display_text, "interactive list message", "displayText")?;
    let groups = non_empty(&action.groups, "interactive list message", "groups")?;

    let sections = groups
        .iter()
        .map(|group| {
            let title = required(&group.title, "interactive list group", "title")?;
            check_len("Section title", &title, MAX_SECTION_TITLE_LEN)?;
            let options = non_empty(&group.options, "interactive list group", "options")?;

            let rows = options
                .iter()
                .map(|option| {
                    let id = required(&option.id, "interactive list option", "id")?;
                    check_len("Option id", &id, MAX_ROW_ID_LEN)?;
                    let title = required(&option.title, "interactive list option", "title")?;
                    check_len("Option title", &title, MAX_ROW_TITLE_LEN)?;
                    let description = or_empty(&option.description);
                    check_len("Option description", &description, MAX_ROW_DESCRIPTION_LEN)?;

                    Ok(WireRow {
                        id,
                        title,
                        description,
                    })
                })
                .collect::<Result<_, BuildError>>()?;

            Ok(WireSection { title, rows })
        })
        .collect::<Result<_, BuildError>>()?;

    Ok(WireAction::List { button, sections })
}

fn build_buttons_action(action: &ActionParams) -> Result<WireAction, BuildError> {
    let buttons = non_empty(&action.buttons, "interactive reply buttons message", "buttons")?;

    let buttons = buttons
        .iter()
        .map(|button| {
            let id = required(&button.id, "reply button", "id")?;
            check_len("Reply button id", &id, MAX_BUTTON_ID_LEN)?;
            let title = required(&button.title, "reply button", "title")?;
            check_len("Reply button title", &title, MAX_BUTTON_TITLE_LEN)?;

            Ok(WireButton {
                kind: "reply",
                reply: WireReply { id, title },
            })
        })
        .collect::<Result<_, BuildError>>()?;

    Ok(WireAction::Buttons { buttons })
}

/// Marks `external_id` as read.
pub fn set_read(recipient: &str, external_id: &str) -> Result<StatusRequest, BuildError> {
    status_request(recipient, external_id, None)
}

/// Marks `external_id` as read and shows a typing indicator to `recipient`.
pub fn set_typing_indicator(
    recipient: &str,
    external_id: &str,
) -> Result<StatusRequest, BuildError> {
    status_request(recipient, external_id, Some(TypingIndicator { kind: "text" }))
}

fn status_request(
    recipient: &str,
    external_id: &str,
    typing_indicator: Option<TypingIndicator>,
) -> Result<StatusRequest, BuildError> {
    if recipient.is_empty() {
        return Err(BuildError::MissingRecipient);
    }
    if external_id.is_empty() {
        return Err(BuildError::missing("status update", "externalId"));
    }

    Ok(StatusRequest {
        messaging_product: MESSAGING_PRODUCT,
        status: "read",
        message_id: external_id.to_owned(),
        typing_indicator,
    })
}

#[inline]
fn required(
    value: &Option<String>,
    message: &'static str,
    field: &'static str,
) -> Result<String, BuildError> {
    present(value)
        .map(str::to_owned)
        .ok_or(BuildError::missing(message, field))
}

#[inline]
fn non_empty<'a, T>(
    value: &'a Option<Vec<T>>,
    message: &'static str,
    field: &'static str,
) -> Result<&'a [T], BuildError> {
    value
        .as_deref()
        .filter(|list| !list.is_empty())
        .ok_or(BuildError::missing(message, field))
}

#[inline]
fn or_empty(value: &Option<String>) -> String {
    present(value).unwrap_or_default().to_owned()
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), BuildError> {
    let len = value.chars().count();
    if len > max {
        return Err(BuildError::TooLong { field, max, len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(kind: &str, params: Value) -> Result<Value, BuildError> {
        send_message(&SendRequest::new("5519000000000", kind, params))
            .map(|wire| serde_json::to_value(wire).unwrap())
    }

    #[test]
    fn recipient_and_type_are_required() {
        assert!(matches!(
            wire_request("", "text"),
            Err(BuildError::MissingRecipient)
        ));
        assert!(matches!(
            wire_request("5519000000000", ""),
            Err(BuildError::MissingType)
        ));
        assert!(matches!(
            wire_request("5519000000000", "sticker"),
            Err(BuildError::UnsupportedType(ref t)) if t == "sticker"
        ));
    }

    fn wire_request(to: &str, kind: &str) -> Result<WireRequest, BuildError> {
        send_message(&SendRequest::new(to, kind, json!({"body": "hi"})))
    }

    #[test]
    fn document_defaults_caption_and_filename() {
        assert_eq!(
            wire(
                "document",
                json!({"link": "https://example.com/a.pdf", "replyToId": "wamid.0"})
            )
            .unwrap(),
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "5519000000000",
                "type": "document",
                "document": {"link": "https://example.com/a.pdf", "caption": "", "filename": ""},
                "context": {"message_id": "wamid.0"}
            })
        );
    }

    #[test]
    fn image_ignores_reply_to_id() {
        let value = wire(
            "image",
            json!({"link": "https://example.com/a.png", "replyToId": "wamid.0"}),
        )
        .unwrap();
        assert!(value.get("context").is_none());
        assert_eq!(value["image"], json!({"link": "https://example.com/a.png", "caption": ""}));
    }

    #[test]
    fn contacts_omit_recipient_type() {
        let value = wire(
            "contacts",
            json!({"firstName": "Name", "emails": ["a@b.c"], "phones": ["155512345"]}),
        )
        .unwrap();

        assert!(value.get("recipient_type").is_none());
        assert_eq!(
            value["contacts"],
            json!([{
                "emails": [{"email": "a@b.c"}],
                "name": {"formatted_name": "Name", "first_name": "Name", "last_name": ""},
                "phones": [{"phone": "155512345"}]
            }])
        );

        assert!(matches!(
            wire("contacts", json!({"firstName": "Name", "emails": [], "phones": ["1"]})),
            Err(BuildError::MissingParameter { field: "emails", .. })
        ));
    }

    #[test]
    fn mistyped_params_are_rejected() {
        assert!(matches!(
            wire("text", json!({"body": 42})),
            Err(BuildError::InvalidParams { message: "text", .. })
        ));
    }

    #[test]
    fn lengths_count_characters() {
        let footer = "é".repeat(MAX_FOOTER_LEN);
        assert!(wire(
            "interactive_cta",
            json!({
                "body": "b",
                "footer": footer,
                "action": {"displayText": "Open", "url": "https://example.com"}
            })
        )
        .is_ok());
    }

    #[test]
    fn unknown_header_type_is_fatal() {
        assert!(matches!(
            wire(
                "interactive_buttons",
                json!({
                    "body": "b",
                    "header": {"type": "gif", "link": "x"},
                    "action": {"buttons": [{"id": "1", "title": "One"}]}
                })
            ),
            Err(BuildError::UnsupportedHeaderType(ref t)) if t == "gif"
        ));
    }

    #[test]
    fn header_without_type_is_dropped() {
        let value = wire(
            "interactive_buttons",
            json!({
                "body": "b",
                "header": {"text": "ignored"},
                "action": {"buttons": [{"id": "1", "title": "One"}]}
            }),
        )
        .unwrap();
        assert!(value["interactive"].get("header").is_none());
    }

    #[test]
    fn status_requests_need_an_id() {
        assert!(set_read("5519000000000", "").is_err());
        assert!(set_typing_indicator("", "wamid.1").is_err());
        assert_eq!(set_read("5519000000000", "wamid.1").unwrap().typing_indicator, None);
    }
}
