//! Database bootstrap utilities
//!
//! This module creates the target database before the pool connects, and drops it
//! again for test teardown.

use crate::errors::QueryHausError;
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgConnectOptions;
use sqlx::Postgres;

/// Create the database named in `url` if it does not exist; returns whether it was created
pub async fn ensure_database(url: &str) -> Result<bool, QueryHausError> {
    let name = database_name(url)?;
    if Postgres::database_exists(url).await? {
        crate::debug_log!(database = %name, "database already exists");
        return Ok(false);
    }

    Postgres::create_database(url).await?;
    tracing::info!(database = %name, "database created");
    Ok(true)
}

/// Drop the database named in `url`, terminating its open connections first
pub async fn drop_database(url: &str) -> Result<(), QueryHausError> {
    let name = database_name(url)?;
    Postgres::force_drop_database(url).await?;
    tracing::info!(database = %name, "database dropped");
    Ok(())
}

/// Database name of a connection url
pub fn database_name(url: &str) -> Result<String, QueryHausError> {
    let options: PgConnectOptions = url
        .parse()
        .map_err(|e| QueryHausError::InvalidUrl(format!("{}: {}", redact(url), e)))?;
    options
        .get_database()
        .map(str::to_string)
        .ok_or_else(|| QueryHausError::InvalidUrl(format!("{}: no database name", redact(url))))
}

/// The url without credentials, for error messages
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => format!("{}***{}", &url[..scheme + 3], &url[at..]),
        _ => url.to_string(),
    }
}
