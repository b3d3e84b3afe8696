//! Raw embedded JSON column type

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type, TypeInfo, ValueRef};
use std::fmt;

/// Serialized sub-object text exactly as the store returned it
///
/// Scans from `json`, `jsonb` and text columns without validating the content;
/// malformed text is only detected when it is bound into a typed field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonText(String);

impl JsonText {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for empty text and SQL/JSON `null`
    pub fn is_empty(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed == "null"
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for JsonText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for JsonText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl AsRef<str> for JsonText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsonText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Type<Postgres> for JsonText {
    fn type_info() -> PgTypeInfo {
        <serde_json::Value as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <serde_json::Value as Type<Postgres>>::compatible(ty)
            || <String as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for JsonText {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        // SQL NULL is an absent sub-object, e.g. `json_agg` over no rows
        if value.is_null() {
            return Ok(Self::default());
        }
        let is_jsonb = value.type_info().name() == "JSONB";
        let binary = matches!(value.format(), PgValueFormat::Binary);
        let mut bytes = value.as_bytes()?;
        // Binary jsonb carries a one byte format version ahead of the text
        if is_jsonb && binary && bytes.first() == Some(&1) {
            bytes = &bytes[1..];
        }
        Ok(Self(std::str::from_utf8(bytes)?.to_owned()))
    }
}

impl Encode<'_, Postgres> for JsonText {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        // jsonb binary format: version byte followed by the text
        buf.push(1);
        buf.extend_from_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }
}
