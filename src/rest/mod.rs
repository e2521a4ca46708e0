//! Wire-level plumbing shared by the inbound and outbound paths: lenient
//! scalar decoding for webhook payloads, the provider request/response shapes,
//! and (with the `server` feature) the axum webhook handlers.

use std::{fmt::Display, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Deserializer};

use crate::error::ServiceErrorKind;

pub(crate) mod client;
#[cfg(feature = "server")]
pub(crate) mod server;

/// A type that can be created from a deserialized API response.
pub(crate) trait FromResponse: Sized {
    /// The raw response type that will be deserialized
    type Response: DeserializeOwned;

    /// Converts the raw response into the final type.
    fn from_response(response: Self::Response) -> Result<Self, ServiceErrorKind>;
}

/// Returns the string if it is present and non-empty.
///
/// Webhook payloads and outbound params treat `""` the same as an absent
/// field.
#[inline]
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOr<T> {
    Raw(String),
    Tee(T),
}

/// Deserializes an optional `T` that the provider may send either as a JSON
/// value or as its string rendering (`"3"` vs `3`).
pub(crate) fn deserialize_str_opt<'de, T, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<T>, D::Error>
where
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    let v = <Option<RawOr<T>>>::deserialize(deserializer)?;
    if let Some(v) = v {
        Ok(match v {
            RawOr::Raw(s) => Some(T::from_str(&s).map_err(|err| {
                <D::Error as serde::de::Error>::custom(format!("parsing value: {err}"))
            })?),
            RawOr::Tee(n) => Some(n),
        })
    } else {
        Ok(None)
    }
}

/// Deserializes an optional string that may also arrive as a bare number
/// (timestamps are documented as strings but not always sent as such).
pub(crate) fn deserialize_string_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(
        match <Option<RawOr<serde_json::Number>>>::deserialize(deserializer)? {
            Some(RawOr::Raw(s)) => Some(s),
            Some(RawOr::Tee(n)) => Some(n.to_string()),
            None => None,
        },
    )
}
