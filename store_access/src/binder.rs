//! Result binder
//!
//! Scanned records may carry sub-objects as raw JSON text (typically produced by
//! `json_build_object` in the fetch query). After scanning, every registered
//! [`EmbeddedField`] deserializes that text into its typed sibling field.
//!
//! Binding is best effort: a field that fails to deserialize is logged and left
//! untouched, and the enclosing call still succeeds. Callers cannot tell a
//! missing sub-object from a malformed one by the call result alone; the
//! [`BindReport`] returned by [`bind_record`] carries that distinction.

use crate::errors::DataError;
use crate::traits::Embedded;
use serde::de::DeserializeOwned;
use type_mapping::{normalize_timestamps, JsonText};

pub type BindResult = Result<(), serde_json::Error>;

/// One raw JSON source and the typed field it is materialized into
pub struct EmbeddedField<M: 'static> {
    /// Persistence tag of the raw column
    pub source: &'static str,
    /// Name of the typed target field
    pub target: &'static str,
    pub raw: fn(&M) -> Option<&str>,
    pub assign: fn(&mut M, &str) -> BindResult,
}

impl<M> EmbeddedField<M> {
    pub const fn new(
        source: &'static str,
        target: &'static str,
        raw: fn(&M) -> Option<&str>,
        assign: fn(&mut M, &str) -> BindResult,
    ) -> Self {
        Self {
            source,
            target,
            raw,
            assign,
        }
    }
}

impl<M> std::fmt::Debug for EmbeddedField<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedField")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

/// A field type holding raw embedded JSON
pub trait RawSource {
    /// The JSON text, `None` when absent, blank or `null`
    fn raw_json(&self) -> Option<&str>;
}

impl RawSource for JsonText {
    fn raw_json(&self) -> Option<&str> {
        if self.is_empty() {
            None
        } else {
            Some(self.as_str())
        }
    }
}

impl RawSource for Option<JsonText> {
    fn raw_json(&self) -> Option<&str> {
        self.as_ref().and_then(RawSource::raw_json)
    }
}

/// A field type that embedded JSON can be materialized into
///
/// The target is only written once deserialization has succeeded.
pub trait BindTarget {
    fn bind_json(&mut self, raw: &str) -> BindResult;
}

/// Single related object
impl<T: DeserializeOwned> BindTarget for Option<T> {
    fn bind_json(&mut self, raw: &str) -> BindResult {
        *self = Some(serde_json::from_str(raw)?);
        Ok(())
    }
}

/// Sequence of related objects, replacing any previous content
impl<T: DeserializeOwned> BindTarget for Vec<T> {
    fn bind_json(&mut self, raw: &str) -> BindResult {
        *self = serde_json::from_str(raw)?;
        Ok(())
    }
}

/// Outcome of binding one or more records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: Vec<&'static str>,
    /// Targets whose source was empty
    pub skipped: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl BindReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: BindReport) {
        self.bound.extend(other.bound);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

/// Materialize every embedded field of `record`
pub fn bind_record<M: Embedded>(record: &mut M) -> BindReport {
    let mut report = BindReport::default();

    for field in M::embedded_fields() {
        let Some(raw) = (field.raw)(record) else {
            report.skipped.push(field.target);
            continue;
        };
        let normalized = normalize_timestamps(raw).into_owned();

        match (field.assign)(record, &normalized) {
            Ok(()) => report.bound.push(field.target),
            Err(source) => {
                let error = DataError::Bind {
                    field: field.target.to_string(),
                    source,
                };
                tracing::warn!(
                    source_field = field.source,
                    target_field = field.target,
                    error = %error,
                    "skipping embedded field"
                );
                report.failed.push(field.target);
            }
        }
    }

    report
}

/// Materialize the embedded fields of each record independently
pub fn bind_all<M: Embedded>(records: &mut [M]) -> BindReport {
    let mut report = BindReport::default();
    for record in records.iter_mut() {
        report.merge(bind_record(record));
    }
    report
}
