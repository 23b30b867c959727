//! Typed wrappers over the backend's REST endpoints.

pub mod auth;
pub mod diaries;
pub mod endpoints;
pub mod upload;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

pub use auth::AuthApi;
pub use diaries::DiaryApi;
pub use upload::UploadApi;

/// Decode a response body, looking inside a `data` envelope when the body
/// itself does not match.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(e) => match value {
            Value::Object(mut map) if map.contains_key("data") => {
                let inner = map.remove("data").unwrap_or(Value::Null);
                Ok(serde_json::from_value(inner)?)
            }
            _ => Err(e.into()),
        },
    }
}

/// Like [`decode`], but a body that does not describe a `T` yields `None`.
pub(crate) fn decode_optional<T: DeserializeOwned>(value: Value) -> Option<T> {
    decode(value).ok()
}
