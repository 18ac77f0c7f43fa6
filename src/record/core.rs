use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{
    Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::Error;

/// The ID of a record, assigned by the database.
pub type RecordId = i64;

/// Which accounting bucket a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Money spent.
    Expense,
    /// Money put into investments.
    Portfolio,
}

impl RecordType {
    /// The name used in JSON, CSV and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Expense => "expense",
            RecordType::Portfolio => "portfolio",
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unknown record type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown record type \"{0}\", expected \"expense\" or \"portfolio\"")]
pub struct UnknownRecordType(pub String);

impl FromStr for RecordType {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(RecordType::Expense),
            "portfolio" => Ok(RecordType::Portfolio),
            other => Err(UnknownRecordType(other.to_owned())),
        }
    }
}

impl ToSql for RecordType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for RecordType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or portfolio entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The ID of the record.
    pub id: RecordId,
    /// A short description, e.g. "Coffee".
    pub title: String,
    /// The amount of money.
    pub amount: Decimal,
    /// Free text category, e.g. "Food & Dining".
    pub category: String,
    /// The bucket the record is counted in.
    pub record_type: RecordType,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A record that has passed validation and is ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// A short description, e.g. "Coffee".
    pub title: String,
    /// The amount of money.
    pub amount: Decimal,
    /// Free text category, e.g. "Food & Dining".
    pub category: String,
    /// The bucket the record is counted in.
    pub record_type: RecordType,
}

/// Timestamps are stored as UTC text with a fixed width so that sorting the
/// text sorts by time.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

/// Create the record table and its index if they do not exist.
pub fn create_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            record_type TEXT NOT NULL CHECK (record_type IN ('expense', 'portfolio')),
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_record_created_at ON record(created_at)",
        (),
    )?;

    Ok(())
}

/// Map a row with the columns id, title, amount, category, record_type and
/// created_at (in that order) to a [Record].
pub fn map_row_to_record(row: &Row) -> Result<Record, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount: String = row.get(2)?;
    let category = row.get(3)?;
    let record_type = row.get(4)?;
    let created_at: String = row.get(5)?;

    let amount = amount
        .parse::<Decimal>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;
    let created_at = parse_timestamp(&created_at)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(Record {
        id,
        title,
        amount,
        category,
        record_type,
        created_at,
    })
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, Error> {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|error| Error::InvalidStoredValue(error.to_string()))
}

fn parse_timestamp(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT).map(PrimitiveDateTime::assume_utc)
}

/// Drop the sub-microsecond part of `timestamp`, which the database does not store.
fn truncate_to_micros(timestamp: OffsetDateTime) -> OffsetDateTime {
    timestamp - Duration::nanoseconds((timestamp.nanosecond() % 1_000) as i64)
}

/// Insert `record` into the database with the creation time `created_at`.
///
/// # Errors
/// Returns an [Error] if the insert fails.
pub fn insert_record(
    record: &NewRecord,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Record, Error> {
    let created_at = truncate_to_micros(created_at.to_offset(UtcOffset::UTC));

    connection.execute(
        "INSERT INTO record (title, amount, category, record_type, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.title,
            record.amount.to_string(),
            record.category,
            record.record_type,
            format_timestamp(created_at)?,
        ],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Record {
        id,
        title: record.title.clone(),
        amount: record.amount,
        category: record.category.clone(),
        record_type: record.record_type,
        created_at,
    })
}

/// Get every record, newest first.
///
/// Records created at the same instant are ordered by descending ID.
///
/// # Errors
/// Returns an [Error] if the query fails or a stored value cannot be read.
pub fn select_all_records(connection: &Connection) -> Result<Vec<Record>, Error> {
    select_records(None, connection)
}

/// Get the records of one type, or all records if `record_type` is `None`, newest first.
///
/// # Errors
/// Returns an [Error] if the query fails or a stored value cannot be read.
pub fn select_records(
    record_type: Option<RecordType>,
    connection: &Connection,
) -> Result<Vec<Record>, Error> {
    let mut stmt = connection.prepare(
        "SELECT id, title, amount, category, record_type, created_at
        FROM record
        WHERE ?1 IS NULL OR record_type = ?1
        ORDER BY created_at DESC, id DESC",
    )?;

    stmt.query_map(params![record_type], map_row_to_record)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// The number of rows changed by a statement.
pub type RowsAffected = usize;

/// Delete the record with `id`, returning the number of rows deleted.
///
/// # Errors
/// Returns an [Error] if the statement fails.
pub fn delete_record(id: RecordId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM record WHERE id = :id", &[(":id", &id)])
        .map_err(Error::from)
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_record_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_record_table(&connection));
    }

    #[test]
    fn rejects_unknown_record_type() {
        let connection = Connection::open_in_memory().unwrap();
        create_record_table(&connection).unwrap();

        let result = connection.execute(
            "INSERT INTO record (title, amount, category, record_type, created_at)
            VALUES ('foo', '1', 'Other', 'loan', '2025-01-01T00:00:00.000000Z')",
            (),
        );

        assert!(result.is_err());
    }
}
