use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    initialize_db,
    record::{NewRecord, RecordType, insert_record},
};

/// A utility for creating a test database for the JSON API server of finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Sample records as (title, amount in cents, category, type, age in days).
const SAMPLE_RECORDS: [(&str, i64, &str, RecordType, i64); 10] = [
    ("Coffee", 350, "Food & Dining", RecordType::Expense, 0),
    ("Bus fare", 420, "Transportation", RecordType::Expense, 1),
    ("Groceries", 8_765, "Food & Dining", RecordType::Expense, 3),
    ("Power bill", 14_200, "Bills", RecordType::Expense, 5),
    ("Index fund", 50_000, "Investment", RecordType::Portfolio, 7),
    ("Cinema", 1_850, "Entertainment", RecordType::Expense, 12),
    ("Textbook", 6_499, "Education", RecordType::Expense, 20),
    ("Doctor", 4_500, "Healthcare", RecordType::Expense, 31),
    ("Shares", 25_000, "Investment", RecordType::Portfolio, 40),
    ("Jacket", 12_999, "Shopping", RecordType::Expense, 45),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating {} sample records...", SAMPLE_RECORDS.len());

    let now = OffsetDateTime::now_utc();

    for (title, cents, category, record_type, age_days) in SAMPLE_RECORDS {
        let record = NewRecord {
            title: title.to_owned(),
            amount: Decimal::new(cents, 2),
            category: category.to_owned(),
            record_type,
        };

        insert_record(&record, now - Duration::days(age_days), &conn)?;
    }

    println!("Success!");

    Ok(())
}
