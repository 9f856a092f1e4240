//! Command-line dumper for ESE database files.
//!
//! Usage:
//!   esedump <db_path> header
//!   esedump <db_path> tables
//!   esedump <db_path> schema <table>
//!   esedump <db_path> dump <table>
//!
//! Output is JSON, one object per line for `tables` and `dump`.

use ese_reader::{Config, EseDb, EseError, TraceConfig};
use serde::Serialize;
use std::env;
use std::process::exit;
use tracing_subscriber::EnvFilter;

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            exit(1);
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: esedump <db_path> <command> [args...]");
    eprintln!("Commands:");
    eprintln!("  header          - Show file header fields");
    eprintln!("  tables          - List tables");
    eprintln!("  schema <table>  - Show a table's columns, indexes and long-value trees");
    eprintln!("  dump <table>    - Print every row of a table");
    eprintln!("Set ESEDUMP_TRACE to a JSON object such as {{\"pages\":true}} for verbose tracing.");
    eprintln!("RUST_LOG overrides the log filter (default: warn, or ese_reader=debug with ESEDUMP_TRACE).");
    exit(1);
}

/// Log filter used when RUST_LOG is unset
fn default_filter(tracing_requested: bool) -> &'static str {
    if tracing_requested {
        "ese_reader=debug"
    } else {
        "warn"
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        usage();
    }

    let db_path = &args[1];
    let command = &args[2];

    let trace_json = env::var("ESEDUMP_TRACE").ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(trace_json.is_some()))),
        )
        .with_writer(std::io::stderr)
        .init();

    let trace = match trace_json {
        Some(json) => match serde_json::from_str::<TraceConfig>(&json) {
            Ok(trace) => trace,
            Err(e) => {
                eprintln!("ERROR: Invalid ESEDUMP_TRACE: {}", e);
                exit(1);
            }
        },
        None => TraceConfig::default(),
    };

    let db = match EseDb::open(Config::new(db_path).trace(trace)) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("ERROR: Failed to open database: {}", e);
            exit(1);
        }
    };

    match command.as_str() {
        "header" => {
            let header = db.context().header();
            println!("format_version: {:#x}", header.format_version);
            println!("format_revision: {:#x}", header.format_revision);
            println!("page_size: {}", header.page_size);
            println!("file_type: {}", header.file_type);
            println!("database_state: {:?}", header.database_state);
            println!("page_count: {}", db.stats().page_count);
            println!("table_count: {}", db.stats().table_count);
        }

        "tables" => {
            for summary in db.summaries() {
                print_json(&summary);
            }
        }

        "schema" => {
            let Some(name) = args.get(3) else {
                eprintln!("Usage: esedump <db_path> schema <table>");
                exit(1);
            };
            match db.catalog().table(name) {
                Some(table) => print_json(table),
                None => {
                    eprintln!("ERROR: {}", EseError::TableNotFound(name.clone()));
                    exit(1);
                }
            }
        }

        "dump" => {
            let Some(name) = args.get(3) else {
                eprintln!("Usage: esedump <db_path> dump <table>");
                exit(1);
            };

            let result = db.dump_table(name, |row| {
                for warning in row.warnings() {
                    eprintln!("WARNING: {}", warning);
                }
                print_json(&row);
                Ok(())
            });

            match result {
                Ok(stats) => {
                    eprintln!("ROWS: {}", stats.rows);
                    eprintln!("WARNINGS: {}", stats.warnings);
                }
                Err(EseError::RowErrors { decoded, errors }) => {
                    eprintln!("ROWS: {}", decoded);
                    for error in &errors {
                        eprintln!("ERROR: {}", error);
                    }
                    exit(2);
                }
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    exit(1);
                }
            }
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            exit(1);
        }
    }
}
