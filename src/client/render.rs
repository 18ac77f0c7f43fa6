//! Renders the view model as text tables for the terminal.

use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    client::{Filter, ViewModel},
    record::{Record, format_amount},
};

/// Shown in place of the record table when there are no records at all.
pub const EMPTY_STATE: &str = "No records yet. Add your first expense or portfolio entry!";

/// Shown in place of the record table when the filter hides every record.
pub const EMPTY_FILTER_STATE: &str = "No records match the current filter.";

const CURRENCY_SYMBOL: &str = "\u{20ac}";

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(headers.iter().map(|header| Cell::new(*header)));
    table
}

fn money(amount: &str) -> String {
    format!("{CURRENCY_SYMBOL}{amount}")
}

/// Render the statistics, or nothing if the view has not been loaded.
pub fn render_stats(view: &ViewModel) -> Option<String> {
    let stats = view.stats.as_ref()?;
    let mut table = new_table(&["Statistic", "Value"]);

    for (label, value) in [
        ("Total expenses", money(&stats.total)),
        ("This month", money(&stats.month_total)),
        ("30 day average", money(&stats.avg)),
        ("Top category", stats.top.clone()),
        ("Portfolio", money(&stats.portfolio)),
    ] {
        table.add_row([
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    Some(table.to_string())
}

fn record_row(record: &Record) -> [Cell; 6] {
    let date = record
        .created_at
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| record.created_at.to_string());

    [
        Cell::new(record.id),
        Cell::new(&record.title),
        Cell::new(&record.category),
        Cell::new(record.record_type),
        Cell::new(money(&format_amount(record.amount))).set_alignment(CellAlignment::Right),
        Cell::new(date),
    ]
}

/// Render the records visible under the active filter, newest first.
pub fn render_records(view: &ViewModel) -> String {
    if view.records.is_empty() {
        return EMPTY_STATE.to_owned();
    }

    if view.is_empty() {
        return EMPTY_FILTER_STATE.to_owned();
    }

    let mut table = new_table(&["ID", "Title", "Category", "Type", "Amount", "Date"]);

    for record in view.visible_records() {
        table.add_row(record_row(record));
    }

    format!(
        "{table}\nShowing {} of {} records ({})",
        view.count(view.filter),
        view.count(Filter::All),
        view.filter
    )
}

/// Render the whole view: statistics first, then the records.
pub fn render_view(view: &ViewModel) -> String {
    match render_stats(view) {
        Some(stats) => format!("{stats}\n{}", render_records(view)),
        None => render_records(view),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        client::{Filter, ViewModel},
        record::{Record, RecordList, RecordType, Stats},
    };

    use super::{EMPTY_FILTER_STATE, EMPTY_STATE, render_records, render_stats, render_view};

    fn loaded_view(filter: Filter) -> ViewModel {
        let records = vec![
            Record {
                id: 2,
                title: "Shares".to_owned(),
                amount: dec!(100),
                category: "Investment".to_owned(),
                record_type: RecordType::Portfolio,
                created_at: datetime!(2025-06-15 12:30 UTC),
            },
            Record {
                id: 1,
                title: "Coffee".to_owned(),
                amount: dec!(3.5),
                category: "Food & Dining".to_owned(),
                record_type: RecordType::Expense,
                created_at: datetime!(2025-06-14 08:05 UTC),
            },
        ];
        let stats = Stats::from_records(&records, datetime!(2025-06-15 13:00 UTC)).unwrap();
        let mut view = ViewModel::new(filter);
        view.apply_list(RecordList {
            success: true,
            expenses: records,
            stats,
        });
        view
    }

    #[test]
    fn unloaded_view_has_no_stats() {
        let view = ViewModel::default();

        assert_eq!(render_stats(&view), None);
        assert_eq!(render_view(&view), EMPTY_STATE);
    }

    #[test]
    fn stats_show_every_value() {
        let rendered = render_stats(&loaded_view(Filter::All)).unwrap();

        assert!(rendered.contains("\u{20ac}3.50"), "{rendered}");
        assert!(rendered.contains("\u{20ac}100.00"), "{rendered}");
        assert!(rendered.contains("Food & Dining"), "{rendered}");
    }

    #[test]
    fn records_are_rendered_newest_first() {
        let rendered = render_records(&loaded_view(Filter::All));

        let shares = rendered.find("Shares").unwrap();
        let coffee = rendered.find("Coffee").unwrap();
        assert!(shares < coffee, "{rendered}");
        assert!(rendered.contains("2025-06-14 08:05"), "{rendered}");
        assert!(rendered.contains("\u{20ac}3.50"), "{rendered}");
        assert!(rendered.ends_with("Showing 2 of 2 records (all)"));
    }

    #[test]
    fn filter_hides_other_type() {
        let rendered = render_records(&loaded_view(Filter::Expense));

        assert!(rendered.contains("Coffee"));
        assert!(!rendered.contains("Shares"));
        assert!(rendered.ends_with("Showing 1 of 2 records (expense)"));
    }

    #[test]
    fn filter_that_hides_everything_shows_message() {
        let mut view = loaded_view(Filter::Portfolio);
        view.records.retain(|record| record.record_type == RecordType::Expense);

        assert_eq!(render_records(&view), EMPTY_FILTER_STATE);
    }

    #[test]
    fn rendering_is_deterministic() {
        let view = loaded_view(Filter::All);

        assert_eq!(render_view(&view), render_view(&view));
    }
}
