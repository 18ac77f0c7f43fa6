//! Defines the endpoint for downloading records as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State, rejection::QueryRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    AppState, Error,
    record::{Record, RecordType, format_amount, select_records},
    timezone::local_now,
};

/// The header row of an exported CSV file.
pub const CSV_HEADER: [&str; 5] = ["Title", "Amount", "Category", "Type", "Date"];

/// The state needed to export records.
#[derive(Debug, Clone)]
pub struct ExportRecordsState {
    /// The database connection for reading records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used to date the file name.
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportRecordsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string for an export.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Only export records of this type. Exports every record if absent.
    pub record_type: Option<RecordType>,
}

/// A route handler that responds with the stored records as a CSV attachment, newest first.
pub async fn export_records_endpoint(
    State(state): State<ExportRecordsState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let now = local_now(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let records = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        select_records(query.record_type, &connection)?
    };

    let csv = write_csv(&records)?;
    let content_disposition = format!("attachment; filename=\"{}\"", export_file_name(now));
    let content_disposition = HeaderValue::from_str(&content_disposition)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        csv,
    )
        .into_response())
}

/// The suggested file name for an export made at `now`.
fn export_file_name(now: OffsetDateTime) -> String {
    format!("records-{}.csv", now.date())
}

/// Write `records` as CSV with a header row.
///
/// # Errors
/// Returns [Error::CsvError] if a row cannot be written.
pub fn write_csv(records: &[Record]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let to_csv_error = |error: csv::Error| Error::CsvError(error.to_string());

    writer.write_record(CSV_HEADER).map_err(to_csv_error)?;

    for record in records {
        let amount = format_amount(record.amount);
        let created_at = record
            .created_at
            .format(&Rfc3339)
            .map_err(|error| Error::CsvError(error.to_string()))?;

        writer
            .write_record([
                record.title.as_str(),
                amount.as_str(),
                record.category.as_str(),
                record.record_type.as_str(),
                created_at.as_str(),
            ])
            .map_err(to_csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
