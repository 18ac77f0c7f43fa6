//! Defines the endpoint for deleting a record.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    record::{RecordId, delete_record},
};

/// The state needed to delete a record.
#[derive(Debug, Clone)]
pub struct DeleteRecordState {
    /// The database connection for managing records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteRecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for deleting a record.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DeleteRecordForm {
    /// The ID of the record to delete.
    pub id: Option<RecordId>,
}

/// The response body for a successful delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedRecord {
    /// Always `true`.
    pub success: bool,
}

/// A route handler for deleting a record.
///
/// Responds with a validation error if the ID is missing and a not found
/// error if no record has the ID.
pub async fn delete_record_endpoint(
    State(state): State<DeleteRecordState>,
    payload: Result<Json<DeleteRecordForm>, JsonRejection>,
) -> Result<Json<DeletedRecord>, Error> {
    let Json(form) = payload.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let record_id = form.id.ok_or(Error::MissingField("id"))?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match delete_record(record_id, &connection) {
        Ok(rows_affected) if rows_affected != 0 => Ok(Json(DeletedRecord { success: true })),
        Ok(_) => Err(Error::DeleteMissingRecord),
        Err(error) => {
            tracing::error!("Could not delete record {record_id}: {error}");
            Err(error)
        }
    }
}
