//! Sets up the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, record::create_record_table};

/// Create the tables for the domain models if they do not already exist.
///
/// The tables are created inside an exclusive transaction so a partially
/// initialised database is never left behind.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_record_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
