//! Expense and portfolio records: storage, statistics and the API endpoints.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod export_endpoint;
mod list_endpoint;
mod stats;

pub use self::core::{
    NewRecord, Record, RecordId, RecordType, RowsAffected, UnknownRecordType, create_record_table,
    delete_record, insert_record, map_row_to_record, select_all_records, select_records,
};
pub use create_endpoint::{CreatedRecord, RecordForm, create_record_endpoint};
pub use delete_endpoint::{DeleteRecordForm, DeletedRecord, delete_record_endpoint};
pub use export_endpoint::{CSV_HEADER, ExportQuery, export_records_endpoint, write_csv};
pub use list_endpoint::{RecordList, list_records_endpoint};
pub use stats::{AVERAGE_WINDOW, NO_TOP_CATEGORY, Stats, StatsOverflow, format_amount};
