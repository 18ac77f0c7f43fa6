//! Drives the record API on behalf of a user interface.

use std::fmt::Display;

use crate::{
    client::{ApiError, CsvExport, Filter, RecordsApi, ViewModel},
    record::{NewRecord, RecordId},
};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// An action completed.
    Success,
    /// An action failed.
    Error,
    /// An action was skipped or needs the user's attention.
    Warning,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Warning => write!(f, "warning"),
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// How the message should be presented.
    pub kind: NotificationKind,
    /// The message text.
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }
}

/// Keeps the view model in sync with the server and queues notifications
/// for the user interface.
///
/// Every mutation is followed by a fresh list from the server. Failed
/// requests are reported once and never retried.
#[derive(Debug)]
pub struct Controller<A> {
    api: A,
    view: ViewModel,
    notifications: Vec<Notification>,
}

impl<A: RecordsApi> Controller<A> {
    /// Create a controller with an empty view and `filter` active.
    pub fn new(api: A, filter: Filter) -> Self {
        Self {
            api,
            view: ViewModel::new(filter),
            notifications: Vec::new(),
        }
    }

    /// The current view model.
    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    /// Remove and return the queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Fetch every record and the statistics from the server.
    ///
    /// On failure the view keeps its previous contents.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        match self.api.list().await {
            Ok(list) => {
                self.view.apply_list(list);
                Ok(())
            }
            Err(error) => {
                tracing::error!("Could not load records: {error}");
                self.notifications
                    .push(Notification::error(format!("Error loading data: {error}")));
                Err(error)
            }
        }
    }

    /// Create a record and reload the view.
    ///
    /// A failed reload is reported as a notification and leaves the view stale.
    pub async fn submit(&mut self, record: NewRecord) -> Result<RecordId, ApiError> {
        let id = match self.api.create(&record).await {
            Ok(id) => id,
            Err(error) => {
                tracing::error!("Could not add record: {error}");
                self.notifications
                    .push(Notification::error(format!("Error adding record: {error}")));
                return Err(error);
            }
        };

        tracing::debug!("Created record {id}");
        self.notifications
            .push(Notification::success("Record added successfully!"));
        self.reload_after_change().await;

        Ok(id)
    }

    /// Delete the record with `id` if `confirm` agrees, then reload the view.
    ///
    /// Returns `Ok(false)` and does nothing if the user declined. A failed
    /// reload is reported as a notification and does not undo the delete.
    pub async fn delete<F>(&mut self, id: RecordId, confirm: F) -> Result<bool, ApiError>
    where
        F: FnOnce(RecordId) -> bool,
    {
        if !confirm(id) {
            return Ok(false);
        }

        if let Err(error) = self.api.delete(id).await {
            tracing::error!("Could not delete record {id}: {error}");
            self.notifications
                .push(Notification::error(format!("Error deleting record: {error}")));
            return Err(error);
        }

        self.view.records.retain(|record| record.id != id);
        self.notifications
            .push(Notification::success("Record deleted successfully!"));
        self.reload_after_change().await;

        Ok(true)
    }

    async fn reload_after_change(&mut self) {
        if self.load().await.is_err() {
            tracing::warn!("The change was saved but the view could not be refreshed.");
        }
    }

    /// Change which records are visible. Does not contact the server.
    pub fn set_filter(&mut self, filter: Filter) {
        self.view.set_filter(filter);
    }

    /// Download the records visible under the active filter as CSV.
    ///
    /// Returns `Ok(None)` with a warning queued if nothing is visible.
    pub async fn export(&mut self) -> Result<Option<CsvExport>, ApiError> {
        if self.view.is_empty() {
            self.notifications
                .push(Notification::warning("No data to export"));
            return Ok(None);
        }

        match self.api.export_csv(self.view.filter).await {
            Ok(export) => {
                self.notifications
                    .push(Notification::success("Data exported successfully!"));
                Ok(Some(export))
            }
            Err(error) => {
                tracing::error!("Could not export records: {error}");
                self.notifications
                    .push(Notification::error(format!("Error exporting data: {error}")));
                Err(error)
            }
        }
    }
}
