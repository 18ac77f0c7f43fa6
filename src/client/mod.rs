//! The client side of the tracker: an HTTP client for the record API, a view
//! model of the fetched records, and a controller that ties them together.

mod api;
mod controller;
mod render;
mod view_model;

pub use api::{ApiError, CsvExport, HttpRecordsApi, RecordsApi};
pub use controller::{Controller, Notification, NotificationKind};
pub use render::{EMPTY_FILTER_STATE, EMPTY_STATE, render_records, render_stats, render_view};
pub use view_model::{Filter, ViewModel};

/// The categories offered when adding a record. Any other text is accepted too.
pub const SUGGESTED_CATEGORIES: [&str; 9] = [
    "Transportation",
    "Food & Dining",
    "Shopping",
    "Entertainment",
    "Bills",
    "Healthcare",
    "Education",
    "Investment",
    "Other",
];
