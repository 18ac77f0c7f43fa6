use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::exit,
};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    client::{
        Controller, Filter, HttpRecordsApi, Notification, NotificationKind, SUGGESTED_CATEGORIES,
        render_records, render_view,
    },
    record::{NewRecord, RecordId, RecordType},
};

/// A terminal client for the finance_tracker API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the API server.
    #[arg(long, env = "TRACKER_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the statistics and the records, newest first.
    List {
        /// Only show records of this type.
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Add an expense or portfolio entry.
    Add {
        /// A short description, e.g. "Coffee".
        #[arg(long)]
        title: String,
        /// The amount of money, e.g. 3.50 or -12 for a refund.
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,
        /// The category, e.g. "Food & Dining". See `categories` for suggestions.
        #[arg(long)]
        category: String,
        /// Either "expense" or "portfolio".
        #[arg(long = "type", default_value = "expense")]
        record_type: RecordType,
    },
    /// Delete a record.
    Delete {
        /// The ID of the record to delete.
        id: RecordId,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
    /// Download the records as a CSV file.
    Export {
        /// Only export records of this type.
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// Where to save the file. Defaults to the name suggested by the server.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List the suggested categories.
    Categories,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let api = HttpRecordsApi::new(&args.server)?;

    let succeeded = match args.command {
        Command::List { filter } => {
            let mut controller = Controller::new(api, filter);
            let loaded = controller.load().await.is_ok();
            print_notifications(controller.take_notifications());

            if loaded {
                println!("{}", render_view(controller.view()));
            }

            loaded
        }
        Command::Add {
            title,
            amount,
            category,
            record_type,
        } => {
            let mut controller = Controller::new(api, Filter::All);
            let record = NewRecord {
                title,
                amount,
                category,
                record_type,
            };
            let result = controller.submit(record).await;
            print_notifications(controller.take_notifications());

            if let Ok(id) = result {
                println!("Created record {id}");
                println!("{}", render_view(controller.view()));
            }

            result.is_ok()
        }
        Command::Delete { id, yes } => {
            let mut controller = Controller::new(api, Filter::All);
            let result = controller.delete(id, |_| yes || ask_to_delete()).await;
            print_notifications(controller.take_notifications());

            match result {
                Ok(true) => {
                    println!("{}", render_records(controller.view()));
                    true
                }
                Ok(false) => {
                    println!("Cancelled.");
                    true
                }
                Err(_) => false,
            }
        }
        Command::Export { filter, output } => {
            let mut controller = Controller::new(api, filter);
            let exported = match controller.load().await {
                Ok(()) => controller.export().await,
                Err(error) => Err(error),
            };
            print_notifications(controller.take_notifications());

            match exported {
                Ok(Some(export)) => {
                    let path = output.unwrap_or_else(|| PathBuf::from(&export.file_name));
                    std::fs::write(&path, export.contents)?;
                    println!("Saved {}", path.display());
                    true
                }
                Ok(None) => true,
                Err(_) => false,
            }
        }
        Command::Categories => {
            for category in SUGGESTED_CATEGORIES {
                println!("{category}");
            }

            true
        }
    };

    if !succeeded {
        exit(1);
    }

    Ok(())
}

fn ask_to_delete() -> bool {
    print!("Are you sure you want to delete this record? [y/N] ");

    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();

    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(error) => {
            tracing::error!("Could not read confirmation: {error}");
            false
        }
    }
}

fn print_notifications(notifications: Vec<Notification>) {
    for notification in notifications {
        match notification.kind {
            NotificationKind::Success => println!("{}", notification.message),
            NotificationKind::Error | NotificationKind::Warning => {
                eprintln!("{}: {}", notification.kind, notification.message)
            }
        }
    }
}
