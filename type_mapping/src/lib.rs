//! Mapping between embedded JSON columns and Rust types
//!
//! Views and joins return related rows as serialized JSON (`json_build_object`,
//! `json_agg`, ...). This crate provides the column type holding that raw text and the
//! timestamp normalization applied before it is deserialized into typed fields.

pub mod json_text;
pub mod normalize;

pub use json_text::JsonText;
pub use normalize::{normalize_timestamps, TIME_FIELD_SUFFIX};
