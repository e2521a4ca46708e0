//! Error Handling
//!
//! This module defines the crate's error types. Errors are split by where they
//! originate:
//!
//! - [`ExtractError`]: an inbound webhook payload that cannot be processed at all
//!   (wrong envelope object, content that is missing a field it must carry, an
//!   unknown message type).
//! - [`BuildError`]: an outbound message whose parameters fail validation before
//!   any network call is attempted.
//! - [`ServiceError`]: the Cloud API answered, but with an error (or with a body we
//!   could not understand).
//! - [`ConfigError`]: the process configuration is incomplete.
//!
//! Soft validation failures (a stale entry id, a message without a timestamp, ...)
//! are *not* errors: the extractor logs them and drops the offending item.

use std::{error::Error as StdError, fmt};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// The **top-level error enum** for the crate.
///
/// It aggregates every category of failure so callers can use a single
/// `Result<_, Error>` across extraction, building and sending.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An inbound payload was rejected as a whole.
    #[error("Failed to extract webhook payload: {0}")]
    Extract(#[from] ExtractError),

    /// Outbound parameters failed validation.
    #[error("Invalid outbound message: {0}")]
    Build(#[from] BuildError),

    /// A network error occurred (connection refused, DNS, TLS, timeout...).
    #[error("A network error occurred: {0}")]
    Network(#[from] BoxError),

    /// The Cloud API responded with an error, or with a body that could not be
    /// mapped to the expected shape.
    #[error("An API service error occurred: {0}")]
    Service(#[from] ServiceError),

    /// The configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An internal error, typically a request that could not be assembled.
    #[error("An internal library error occurred: {0}")]
    Internal(BoxError),
}

impl Error {
    pub(crate) fn network(err: BoxError) -> Self {
        Self::Network(err)
    }

    pub(crate) fn internal(err: BoxError) -> Self {
        Self::Internal(err)
    }
}

/// Hard failures raised while walking an inbound webhook payload.
///
/// Any of these aborts the whole extraction call.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ExtractError {
    /// The body was not valid JSON, or not a webhook document at all.
    #[error("Webhook payload could not be decoded: {0}")]
    Parse(#[from] serde_json::Error),

    /// The envelope's `object` was not `whatsapp_business_account`.
    #[error("The object is not a WhatsApp Business Account (found {found:?})")]
    InvalidObject { found: Option<String> },

    /// Change metadata passed validation but lacks a sender field.
    #[error("No {0} found in metadata")]
    MissingSenderField(&'static str),

    /// The first contact of a change has no `wa_id`.
    #[error("No wa_id found in contact")]
    MissingRecipientId,

    /// A content object lacks one of its required fields.
    #[error("No {field} found in {object} object")]
    MissingField {
        object: &'static str,
        field: &'static str,
    },

    /// A message carries a `type` this crate does not know how to read.
    #[error("Unsupported message type {found:?} in message {index}")]
    UnsupportedMessageType { found: Option<String>, index: usize },

    /// An interactive reply carries an unknown sub-type.
    #[error("Unsupported interactive type {found:?}")]
    UnsupportedInteractiveType { found: Option<String> },
}

impl ExtractError {
    pub(crate) fn missing(object: &'static str, field: &'static str) -> Self {
        Self::MissingField { object, field }
    }
}

/// Validation failures raised while building an outbound request.
///
/// These are always detected before any network call.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BuildError {
    #[error("Missing \"recipientPhoneNumber\" parameter")]
    MissingRecipient,

    #[error("Missing \"type\" parameter")]
    MissingType,

    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),

    /// `params` did not decode into the parameter shape of the requested type.
    #[error("Invalid parameters for {message} message: {source}")]
    InvalidParams {
        message: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A required parameter is absent or empty.
    #[error("Missing \"{field}\" parameter for {message}")]
    MissingParameter {
        message: &'static str,
        field: &'static str,
    },

    /// A parameter exceeds the provider's character ceiling.
    #[error("{field} must be {max} characters or less (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("Interactive list messages must have a text header (found {found:?})")]
    ListHeaderNotText { found: String },

    #[error("Unsupported header type: {0}")]
    UnsupportedHeaderType(String),
}

impl BuildError {
    pub(crate) fn missing(message: &'static str, field: &'static str) -> Self {
        Self::MissingParameter { message, field }
    }
}

/// Configuration loading failures.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("Environment variable {name} has an invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Represents **service-level errors**: the request reached the Cloud API but did
/// not succeed.
#[derive(thiserror::Error, Debug)]
#[error("Service error at endpoint '{endpoint}': {kind} (HTTP status {status})")]
#[non_exhaustive]
pub struct ServiceError {
    pub(crate) status: StatusCode,
    pub(crate) kind: ServiceErrorKind,
    pub(crate) endpoint: String,
}

impl ServiceError {
    /// Returns the HTTP status code associated with this service error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the endpoint the request was sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the specific kind of service error.
    pub fn kind(&self) -> &ServiceErrorKind {
        &self.kind
    }

    /// Returns the provider's structured error, if the body carried one.
    pub fn meta_error(&self) -> Option<&MetaError> {
        match &self.kind {
            ServiceErrorKind::Api(api) => Some(&api.error),
            _ => None,
        }
    }

    pub(crate) fn api(error: MetaError) -> ServiceErrorKind {
        ServiceErrorKind::Api(ApiError {
            error: Box::new(error),
        })
    }

    pub(crate) fn parse(source: BoxError, body: String) -> ServiceErrorKind {
        ServiceErrorKind::Parse(ParseError {
            source: Some(source),
            body,
        })
    }

    pub(crate) fn payload(source: BoxError) -> ServiceErrorKind {
        ServiceErrorKind::InvalidPayload(Some(source))
    }
}

/// Sub-category of [`ServiceError`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ServiceErrorKind {
    /// The API returned a structured `{"error": {...}}` body.
    #[error("The API returned an error: {0}")]
    Api(#[from] ApiError),

    /// The body could not be deserialized at all.
    #[error("Failed to parse the API response: {0}")]
    Parse(#[from] ParseError),

    /// The body parsed but lacked data we rely on.
    #[error("The API response had an invalid or unexpected payload structure.")]
    InvalidPayload(#[source] Option<BoxError>),
}

impl ServiceErrorKind {
    pub(crate) fn service(self, endpoint: impl Into<String>, status: StatusCode) -> ServiceError {
        ServiceError {
            status,
            kind: self,
            endpoint: endpoint.into(),
        }
    }
}

/// An API error together with the provider's error object.
#[derive(thiserror::Error, Debug)]
#[error("Meta API error: {error}")]
#[non_exhaustive]
pub struct ApiError {
    pub error: Box<MetaError>,
}

/// A response body that could not be parsed; the raw body is kept for logs.
#[derive(thiserror::Error, Debug)]
#[error("Failed to parse the response body. Raw body content was: '{}'.", body)]
#[non_exhaustive]
pub struct ParseError {
    #[source]
    pub(crate) source: Option<BoxError>,
    pub body: String,
}

/// The **error object returned by the Graph API** in a failed response.
///
/// ```json
/// {
///   "error": {
///     "message": "(#100) Parameter missing",
///     "type": "OAuthException",
///     "code": 100,
///     "fbtrace_id": "A4K...",
///     "error_data": {
///       "messaging_product": "whatsapp",
///       "details": "The recipient phone number is not valid."
///     }
///   }
/// }
/// ```
#[derive(thiserror::Error, Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct MetaError {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fbtrace_id: Option<String>,
    #[serde(
        rename = "error_data",
        default,
        skip_serializing_if = "MetaErrorMetadata::is_none"
    )]
    pub error_metadata: MetaErrorMetadata,
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(code: {})", self.code)?;

        if let Some(title) = &self.title {
            write!(f, " - {title}")?;
        }

        if let Some(r#type) = &self.r#type {
            write!(f, " (type: {type})")?;
        }

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(details) = &self.error_metadata.details {
            write!(f, " [details: {details}]")?;
        }

        if let Some(id) = &self.fbtrace_id {
            write!(f, " [trace: {id}]")?;
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[non_exhaustive]
pub struct MetaErrorMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl MetaErrorMetadata {
    fn is_none(&self) -> bool {
        self.details.is_none()
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_builder() || value.is_redirect() {
            Self::internal(value.into())
        } else {
            Self::network(value.into())
        }
    }
}

/// A boxed, thread-safe trait-object error.
pub type BoxError = Box<dyn StdError + Send + Sync>;
