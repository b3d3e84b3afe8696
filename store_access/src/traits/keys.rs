//! Key types accepted by `fetch`

use crate::args::Args;
use uuid::Uuid;

/// A primary key that can be sent as one Postgres array argument
///
/// Fetch queries receive the whole key set as `$1`, e.g. `WHERE id = ANY($1)`.
pub trait FetchKey: Clone + Send + Sync + 'static {
    fn bind_keys(keys: &[Self]) -> Args;
}

macro_rules! impl_fetch_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FetchKey for $ty {
                fn bind_keys(keys: &[Self]) -> Args {
                    Args::new().bind(keys.to_vec())
                }
            }
        )*
    };
}

impl_fetch_key!(Uuid, i16, i32, i64, String);
