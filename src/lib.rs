//! A personal finance tracker for recording expenses and portfolio entries.
//!
//! This library provides a JSON API over a single SQLite table of records,
//! and a client controller that drives the API from the terminal.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod app_state;
pub mod client;
mod db;
mod endpoints;
mod logging;
pub mod record;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware};
pub use routing::{CorsPolicy, build_router};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The classes of failure that are reported to API clients.
///
/// This is a closed set: store diagnostics are mapped onto one of these kinds
/// and never sent to the client verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was missing a field or was malformed. The client can fix
    /// the request and try again.
    Validation,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with a constraint on the stored data.
    Conflict,
    /// The store could not be reached or is busy.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// The HTTP status code used to report this kind of error.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The JSON body sent when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// The class of failure.
    pub error: ErrorKind,
    /// A message that is safe to show to the user.
    pub message: String,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was absent (or null) in the request body.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The request body or query string could not be parsed.
    ///
    /// The string should describe what was wrong in terms the client can act on.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The route exists but does not handle the request's method.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The amount would make the stored totals too large to summarize.
    #[error("invalid request: amount is too large, the totals would overflow")]
    AmountTooLarge,

    /// The stored amounts add up to more than can be summarized.
    #[error("the stored amounts are too large to summarize")]
    StatsOverflow,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete a record that does not exist.
    #[error("tried to delete a record that is not in the database")]
    DeleteMissingRecord,

    /// A constraint on the record table was violated.
    ///
    /// The string holds the store's diagnostic and should only be logged.
    #[error("a database constraint was violated: {0}")]
    Conflict(String),

    /// The database is busy, locked or could not be opened.
    ///
    /// The string holds the store's diagnostic and should only be logged.
    #[error("the database is unavailable: {0}")]
    StoreUnavailable(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A stored value could not be converted to its Rust type.
    #[error("could not read stored value: {0}")]
    InvalidStoredValue(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, ref desc)
                if sql_error.code == ErrorCode::ConstraintViolation =>
            {
                Error::Conflict(desc.clone().unwrap_or_else(|| sql_error.to_string()))
            }
            rusqlite::Error::SqliteFailure(sql_error, ref desc)
                if matches!(
                    sql_error.code,
                    ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::CannotOpen
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::ReadOnly
                ) =>
            {
                Error::StoreUnavailable(desc.clone().unwrap_or_else(|| sql_error.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<record::StatsOverflow> for Error {
    fn from(_: record::StatsOverflow) -> Self {
        Error::StatsOverflow
    }
}

impl Error {
    /// The class of failure reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_)
            | Error::InvalidRequest(_)
            | Error::MethodNotAllowed(_)
            | Error::AmountTooLarge => ErrorKind::Validation,
            Error::NotFound | Error::DeleteMissingRecord => ErrorKind::NotFound,
            Error::Conflict(_) | Error::StatsOverflow => ErrorKind::Conflict,
            Error::StoreUnavailable(_) | Error::DatabaseLockError => ErrorKind::Unavailable,
            Error::SqlError(_)
            | Error::InvalidStoredValue(_)
            | Error::InvalidTimezoneError(_)
            | Error::CsvError(_) => ErrorKind::Internal,
        }
    }

    /// The message shown to the client.
    ///
    /// Validation errors describe what to fix. Every other error gets a fixed
    /// message for its kind so that store internals are not leaked.
    fn public_message(&self) -> String {
        match self {
            Error::MissingField(_)
            | Error::InvalidRequest(_)
            | Error::MethodNotAllowed(_)
            | Error::AmountTooLarge => self.to_string(),
            Error::NotFound => "The requested resource could not be found.".to_owned(),
            Error::DeleteMissingRecord => "The record could not be found. \
                Try refreshing to see if the record has already been deleted."
                .to_owned(),
            Error::Conflict(_) => "The request conflicts with the stored data.".to_owned(),
            Error::StatsOverflow => "The stored amounts are too large to summarize. \
                Delete the records with the largest amounts and try again."
                .to_owned(),
            Error::StoreUnavailable(_) | Error::DatabaseLockError => {
                "The database is unavailable, try again later.".to_owned()
            }
            _ => "An unexpected error occurred, check the server logs for more details.".to_owned(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();

        match kind {
            ErrorKind::Validation | ErrorKind::NotFound => {
                tracing::debug!("Rejected request: {self}");
            }
            _ => tracing::error!("An unexpected error occurred: {self}"),
        }

        (
            kind.status_code(),
            Json(ErrorResponse {
                success: false,
                error: kind,
                message: self.public_message(),
            }),
        )
            .into_response()
    }
}
