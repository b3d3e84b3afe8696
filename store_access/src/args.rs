//! Positional query arguments

use crate::errors::DataError;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, Encode, Postgres, Type};

/// Ordered `$n` arguments of a named query
///
/// Encoding happens on `bind`; the first failure is kept and reported when the
/// arguments are handed to the driver.
#[derive(Default)]
pub struct Args {
    inner: PgArguments,
    len: usize,
    error: Option<String>,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("len", &self.len)
            .field("error", &self.error)
            .finish()
    }
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next positional argument
    pub fn bind<'q, T>(mut self, value: T) -> Self
    where
        T: 'q + Encode<'q, Postgres> + Type<Postgres>,
    {
        self.push(value);
        self
    }

    pub fn push<'q, T>(&mut self, value: T)
    where
        T: 'q + Encode<'q, Postgres> + Type<Postgres>,
    {
        self.len += 1;
        if let Err(e) = <PgArguments as Arguments<'q>>::add(&mut self.inner, value) {
            if self.error.is_none() {
                self.error = Some(format!("argument ${}: {}", self.len, e));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn into_arguments(self) -> Result<PgArguments, DataError> {
        match self.error {
            Some(error) => Err(DataError::Argument(error)),
            None => Ok(self.inner),
        }
    }
}

/// Build [`Args`] from a list of values
///
/// ```ignore
/// let args = args![identity_id, page.limit, page.offset];
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::Args::new() };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.bind($value))+
    };
}

/// Payload of a named write
#[derive(Debug)]
pub enum Params {
    /// Run the statement once
    Positional(Args),
    /// Run the statement once per argument set
    Batch(Vec<Args>),
}

impl Params {
    pub fn is_batch(&self) -> bool {
        matches!(self, Params::Batch(_))
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Args::new())
    }
}

impl From<Args> for Params {
    fn from(args: Args) -> Self {
        Params::Positional(args)
    }
}

impl From<Vec<Args>> for Params {
    fn from(batch: Vec<Args>) -> Self {
        Params::Batch(batch)
    }
}
