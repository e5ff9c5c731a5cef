//! Database errors.
//!
//! This module contains the [Database errors](crate::core::databases::error::Error).
use std::panic::Location;

use r2d2_sqlite::rusqlite;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The query unexpectedly returned nothing.
    #[error("The query unexpectedly returned nothing: {source}")]
    QueryReturnedNoRows { source: rusqlite::Error },

    /// The query was malformed.
    #[error("The query was malformed: {source}")]
    InvalidQuery { source: rusqlite::Error },

    /// A row with the same unique key already exists.
    #[error("A unique constraint was violated, {location}")]
    UniqueViolation { location: &'static Location<'static> },

    /// Unable to insert a record into the database.
    #[error("Unable to insert record into the database, {location}")]
    InsertFailed { location: &'static Location<'static> },

    /// An update matched no rows.
    #[error("Unable to update record in the database, {location}")]
    UpdateFailed { location: &'static Location<'static> },

    /// Unable to delete a record from the database.
    #[error("Failed to remove record from the database, error-code: {error_code}, {location}")]
    DeleteFailed {
        location: &'static Location<'static>,
        error_code: usize,
    },

    /// Unable to create a connection pool.
    #[error("Failed to create r2d2 connection pool: {source}")]
    ConnectionPool { source: r2d2::Error },
}

impl From<rusqlite::Error> for Error {
    #[track_caller]
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => Error::QueryReturnedNoRows { source: err },
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
                Error::UniqueViolation {
                    location: Location::caller(),
                }
            }
            _ => Error::InvalidQuery { source: err },
        }
    }
}

impl From<r2d2::Error> for Error {
    #[track_caller]
    fn from(source: r2d2::Error) -> Self {
        Self::ConnectionPool { source }
    }
}
