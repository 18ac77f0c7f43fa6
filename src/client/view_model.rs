//! The client's view of the stored records.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId, RecordList, RecordType, Stats, UnknownRecordType};

/// Which records the client shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every record.
    #[default]
    All,
    /// Only expenses.
    Expense,
    /// Only portfolio entries.
    Portfolio,
}

impl Filter {
    /// The record type this filter selects, or `None` for [Filter::All].
    pub fn record_type(self) -> Option<RecordType> {
        match self {
            Filter::All => None,
            Filter::Expense => Some(RecordType::Expense),
            Filter::Portfolio => Some(RecordType::Portfolio),
        }
    }

    /// Whether `record` is shown under this filter.
    pub fn matches(self, record: &Record) -> bool {
        self.record_type()
            .is_none_or(|record_type| record.record_type == record_type)
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Expense => write!(f, "expense"),
            Filter::Portfolio => write!(f, "portfolio"),
        }
    }
}

impl FromStr for Filter {
    type Err = UnknownRecordType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            other => match other.parse::<RecordType>()? {
                RecordType::Expense => Ok(Filter::Expense),
                RecordType::Portfolio => Ok(Filter::Portfolio),
            },
        }
    }
}

/// What the client shows: the active filter, the last list fetched from the
/// server, and the statistics that came with it.
///
/// Statistics always describe every stored record, regardless of the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    /// The active filter.
    pub filter: Filter,
    /// Every record from the last list, newest first.
    pub records: Vec<Record>,
    /// The statistics from the last list.
    pub stats: Option<Stats>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new(Filter::All)
    }
}

impl ViewModel {
    /// An empty view with `filter` active.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            records: Vec::new(),
            stats: None,
        }
    }

    /// Replace the records and statistics with a fresh list from the server.
    pub fn apply_list(&mut self, list: RecordList) {
        self.records = list.expenses;
        self.stats = Some(list.stats);
    }

    /// Change the active filter. Does not touch the records or statistics.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// The records shown under the active filter, newest first.
    pub fn visible_records(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(move |record| self.filter.matches(record))
    }

    /// Whether the active filter hides every record.
    pub fn is_empty(&self) -> bool {
        self.visible_records().next().is_none()
    }

    /// The number of records shown under `filter`.
    pub fn count(&self, filter: Filter) -> usize {
        self.records
            .iter()
            .filter(|record| filter.matches(record))
            .count()
    }

    /// Find a record by ID among all fetched records.
    pub fn find(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }
}
