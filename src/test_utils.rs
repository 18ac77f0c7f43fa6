use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    AppState, initialize_db,
    record::{NewRecord, Record, RecordType, insert_record},
};

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize_db(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn get_test_app_state() -> AppState {
    AppState {
        local_timezone: "Etc/UTC".to_owned(),
        db_connection: Arc::new(Mutex::new(get_test_connection())),
    }
}

pub(crate) fn new_record(
    title: &str,
    amount: Decimal,
    category: &str,
    record_type: RecordType,
) -> NewRecord {
    NewRecord {
        title: title.to_owned(),
        amount,
        category: category.to_owned(),
        record_type,
    }
}

#[track_caller]
pub(crate) fn must_insert_record(
    record: NewRecord,
    created_at: OffsetDateTime,
    state: &AppState,
) -> Record {
    let connection = state.db_connection.lock().unwrap();
    insert_record(&record, created_at, &connection).expect("Could not insert test record")
}

#[track_caller]
pub(crate) fn count_records(state: &AppState) -> i64 {
    state
        .db_connection
        .lock()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM record", [], |row| row.get(0))
        .expect("Could not count records")
}
