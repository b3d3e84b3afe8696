//! Traits describing what the executor can read and bind

pub mod fetch_target;
pub mod keys;
pub mod model;

pub use fetch_target::FetchTarget;
pub use keys::FetchKey;
pub use model::{Embedded, Model, Record};
