/// Request extractors
///
/// Thin wrappers around axum's `Json`, `Query` and `Path` whose rejections
/// become [`ApiError`] so malformed input gets the same JSON error body as
/// everything else.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Deserializes a field that may be absent, `null`, or a value
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent stays `None`, `null` becomes `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Number(i64),
    Text(String),
}

/// Deserializes an optional id sent as a number or a numeric string
///
/// The dashboard forms post unset ids as `""`, which reads as `None`
/// just like `null` or an absent field.
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LooseId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LooseId::Number(id)) => Ok(Some(id)),
        Some(LooseId::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid id: {:?}", text)))
        }
    }
}

/// [`nullable`] for ids; `""` clears the column like `null`
pub fn nullable_id<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    empty_as_none(deserializer).map(Some)
}
