//! Defines the endpoint for creating a new record.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    record::{NewRecord, Record, RecordId, RecordType, Stats, insert_record, select_all_records},
    timezone::local_now,
};

/// The state needed to create a record.
#[derive(Debug, Clone)]
pub struct CreateRecordState {
    /// The database connection for managing records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used to decide the current month.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateRecordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating a record.
///
/// Every field is optional here so that a missing field can be reported by
/// name instead of as a generic parse failure.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RecordForm {
    /// A short description, e.g. "Coffee".
    pub title: Option<String>,
    /// The amount of money, as a JSON number or a decimal string.
    pub amount: Option<Decimal>,
    /// Free text category.
    pub category: Option<String>,
    /// Either "expense" or "portfolio".
    pub record_type: Option<RecordType>,
}

impl TryFrom<RecordForm> for NewRecord {
    type Error = Error;

    fn try_from(form: RecordForm) -> Result<Self, Self::Error> {
        Ok(NewRecord {
            title: form.title.ok_or(Error::MissingField("title"))?,
            amount: form.amount.ok_or(Error::MissingField("amount"))?,
            category: form.category.ok_or(Error::MissingField("category"))?,
            record_type: form.record_type.ok_or(Error::MissingField("record_type"))?,
        })
    }
}

/// The response body for a successfully created record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRecord {
    /// Always `true`.
    pub success: bool,
    /// The ID assigned to the new record.
    pub id: RecordId,
}

/// A route handler for creating a new record, responds with the new record's ID.
pub async fn create_record_endpoint(
    State(state): State<CreateRecordState>,
    payload: Result<Json<RecordForm>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedRecord>), Error> {
    let Json(form) = payload.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let new_record = NewRecord::try_from(form)?;
    let now = local_now(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    check_totals_fit(&new_record, now, &connection)?;

    let record = insert_record(&new_record, now, &connection)
        .inspect_err(|error| {
            tracing::error!("Could not create record with {new_record:?}: {error}");
        })?;

    tracing::debug!("Created record {}", record.id);

    Ok((
        StatusCode::CREATED,
        Json(CreatedRecord {
            success: true,
            id: record.id,
        }),
    ))
}

/// Reject `new_record` if adding it would make the statistics overflow.
///
/// Records that already overflow are left for the list endpoint to report.
fn check_totals_fit(
    new_record: &NewRecord,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let mut records = select_all_records(connection)?;

    if Stats::from_records(&records, now).is_err() {
        return Ok(());
    }

    records.push(Record {
        id: RecordId::MAX,
        title: new_record.title.clone(),
        amount: new_record.amount,
        category: new_record.category.clone(),
        record_type: new_record.record_type,
        created_at: now,
    });

    match Stats::from_records(&records, now) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::AmountTooLarge),
    }
}
