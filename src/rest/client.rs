//! Provider wire shapes for `POST /{phone-number-id}/messages` and the
//! response handling shared by every call to that endpoint.

use reqwest::Response;
use serde::{Deserialize, Serialize};

use super::FromResponse;
use crate::error::{Error, MetaError, ServiceError, ServiceErrorKind};

pub(crate) const MESSAGING_PRODUCT: &str = "whatsapp";
pub(crate) const INDIVIDUAL: &str = "individual";

/// The exact JSON body posted to the messages endpoint.
///
/// ```json
/// {
///   "messaging_product": "whatsapp",
///   "recipient_type": "individual",
///   "to": "5519000000000",
///   "type": "text",
///   "text": { "preview_url": false, "body": "hi" }
/// }
/// ```
#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct WireRequest {
    pub messaging_product: &'static str,

    /// Absent on contacts messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_type: Option<&'static str>,

    pub to: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<WireContext>,

    #[serde(flatten)]
    pub body: WireBody,
}

impl WireRequest {
    pub(crate) fn individual(to: &str, body: WireBody) -> Self {
        Self {
            messaging_product: MESSAGING_PRODUCT,
            recipient_type: Some(INDIVIDUAL),
            to: to.to_owned(),
            context: None,
            body,
        }
    }

    pub(crate) fn reply_to(mut self, message_id: Option<&str>) -> Self {
        self.context = message_id.map(|message_id| WireContext {
            message_id: message_id.to_owned(),
        });
        self
    }
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireContext {
    pub message_id: String,
}

/// The `type` tag and its matching content object.
#[derive(Serialize, PartialEq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireBody {
    Audio { audio: WireMedia },
    Contacts { contacts: Vec<WireContact> },
    Document { document: WireMedia },
    Image { image: WireMedia },
    Text { text: WireText },
    Video { video: WireMedia },
    Reaction { reaction: WireReaction },
    Interactive { interactive: WireInteractive },
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireMedia {
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireText {
    pub preview_url: bool,
    pub body: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireReaction {
    pub message_id: String,
    pub emoji: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireContact {
    pub emails: Vec<WireEmail>,
    pub name: WireContactName,
    pub phones: Vec<WirePhone>,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireEmail {
    pub email: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireContactName {
    pub formatted_name: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WirePhone {
    pub phone: String,
}

#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct WireInteractive {
    #[serde(rename = "type")]
    pub kind: InteractiveKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<WireHeader>,
    pub body: WireInteractiveText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<WireInteractiveText>,
    pub action: WireAction,
}

#[derive(Serialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "snake_case")]
pub enum InteractiveKind {
    CtaUrl,
    List,
    Button,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireInteractiveText {
    pub text: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireHeader {
    Document { document: WireMedia },
    Image { image: WireMedia },
    Text { text: String },
    Video { video: WireMedia },
}

/// Serialized as the bare action object of the matching interactive kind.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(untagged)]
pub enum WireAction {
    CtaUrl {
        name: &'static str,
        parameters: WireCtaParameters,
    },
    List {
        button: String,
        sections: Vec<WireSection>,
    },
    Buttons {
        buttons: Vec<WireButton>,
    },
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireCtaParameters {
    pub display_text: String,
    pub url: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireSection {
    pub title: String,
    pub rows: Vec<WireRow>,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireRow {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireButton {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub reply: WireReply,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct WireReply {
    pub id: String,
    pub title: String,
}

/// Body of the read-receipt and typing-indicator calls.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct StatusRequest {
    pub messaging_product: &'static str,
    pub status: &'static str,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_indicator: Option<TypingIndicator>,
}

#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
pub struct TypingIndicator {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// What the caller gets back from a successful send.
#[derive(Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    /// The recipient's WhatsApp id as resolved by the provider.
    pub recipient_phone_number: String,
    /// The provider id of the sent message (`wamid...`).
    pub external_id: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SendMessageResponse {
    #[serde(default)]
    contacts: Vec<ResponseContact>,
    #[serde(default)]
    messages: Vec<ResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ResponseContact {
    wa_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    id: Option<String>,
}

impl FromResponse for SendOutcome {
    type Response = SendMessageResponse;

    fn from_response(response: Self::Response) -> Result<Self, ServiceErrorKind> {
        let recipient_phone_number = response
            .contacts
            .into_iter()
            .next()
            .and_then(|contact| contact.wa_id)
            .ok_or_else(|| ServiceError::payload("No contacts[0].wa_id in response".into()))?;

        let external_id = response
            .messages
            .into_iter()
            .next()
            .and_then(|message| message.id)
            .ok_or_else(|| ServiceError::payload("No messages[0].id in response".into()))?;

        Ok(Self {
            recipient_phone_number,
            external_id,
        })
    }
}

/// Status calls only care about success; the body is not inspected.
impl FromResponse for () {
    type Response = serde::de::IgnoredAny;

    #[inline]
    fn from_response(_: Self::Response) -> Result<Self, ServiceErrorKind> {
        Ok(())
    }
}

pub(crate) async fn handle_response<T: FromResponse>(
    response: Response,
    endpoint: &str,
) -> Result<T, Error> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        match serde_json::from_slice(&body) {
            Ok(response) => {
                T::from_response(response).map_err(|err| err.service(endpoint, status).into())
            }
            Err(err) => Err(ServiceError::parse(
                err.into(),
                String::from_utf8_lossy(&body).to_string(),
            )
            .service(endpoint, status)
            .into()),
        }
    } else {
        Err(handle_not_ok(&body).service(endpoint, status).into())
    }
}

#[inline(always)]
fn handle_not_ok(body: &[u8]) -> ServiceErrorKind {
    // double error
    #[derive(Deserialize, Debug)]
    struct Error {
        error: MetaError,
    }
    match serde_json::from_slice::<Error>(body) {
        Ok(structured_error) => ServiceError::api(structured_error.error),
        Err(structured_parse) => ServiceError::parse(
            structured_parse.into(),
            String::from_utf8_lossy(body).to_string(),
        ),
    }
}
