//! Defines the endpoint for listing records together with summary statistics.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    record::{Record, Stats, select_all_records},
    timezone::local_now,
};

/// The state needed to list records.
#[derive(Debug, Clone)]
pub struct ListRecordsState {
    /// The database connection for reading records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used to decide the current month.
    pub local_timezone: String,
}

impl FromRef<AppState> for ListRecordsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The response body for a successful list request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordList {
    /// Always `true`.
    pub success: bool,
    /// Every record, newest first.
    ///
    /// Named `expenses` for compatibility, but holds records of both types.
    pub expenses: Vec<Record>,
    /// Statistics over every record in the database.
    pub stats: Stats,
}

/// A route handler that responds with every record and the summary statistics.
pub async fn list_records_endpoint(
    State(state): State<ListRecordsState>,
) -> Result<Json<RecordList>, Error> {
    let now = local_now(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let records = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        select_all_records(&connection)?
    };

    let stats = Stats::from_records(&records, now)?;

    Ok(Json(RecordList {
        success: true,
        expenses: records,
        stats,
    }))
}
