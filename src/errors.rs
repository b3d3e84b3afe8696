//! Error types for the QueryHaus crate
//!
//! This module contains the errors returned while connecting and bootstrapping;
//! data access itself fails with `store_access::DataError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryHausError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Data access error: {0}")]
    Data(#[from] store_access::DataError),

    #[error("Invalid database url: {0}")]
    InvalidUrl(String),
}
