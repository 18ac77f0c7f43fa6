//! The API endpoints URIs.

/// The route to list, create and delete records.
pub const RECORDS: &str = "/records";
/// The route to download records as a CSV file.
pub const RECORDS_EXPORT: &str = "/records/export";
