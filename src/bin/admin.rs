//! cellstore admin binary
//!
//! Diagnostic and maintenance commands against a data directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use cellstore::bootstrap;
use cellstore::wal::WalRecovery;
use cellstore::Storage;

/// cellstore administration tool
#[derive(Parser, Debug)]
#[command(name = "cellstore-admin")]
#[command(about = "Inspect and maintain a cellstore data directory")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./cellstore_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump every column family and its keys
    Scan,

    /// Dump one row across all families of a table
    Row { table: String, row: String },

    /// List the tables recorded in the manifest
    Tables,

    /// Verify WAL integrity without modifying it
    Verify,

    /// Destroy the data directory and everything in it
    Clear,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cellstore=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        tracing::error!("admin command failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> cellstore::Result<()> {
    match args.command {
        Command::Scan => {
            let storage = Storage::open_path(&args.data_dir)?;
            for dump in storage.scan_database() {
                println!("Column Family: [{}]", dump.family);
                for (key, value) in dump.entries {
                    println!(
                        "  {} => {}",
                        String::from_utf8_lossy(&key),
                        String::from_utf8_lossy(&value)
                    );
                }
            }
        }
        Command::Row { table, row } => {
            let storage = Storage::open_path(&args.data_dir)?;
            for dump in storage.row_data(&table, &row) {
                for (key, value) in dump.entries {
                    println!(
                        "[{}] {} | Value: {}",
                        dump.family,
                        String::from_utf8_lossy(&key),
                        String::from_utf8_lossy(&value)
                    );
                }
            }
        }
        Command::Tables => {
            let storage = Storage::open_path(&args.data_dir)?;
            for table in bootstrap::load_persisted_tables(&storage)? {
                println!("{} ({} schema bytes)", table.name, table.schema.len());
            }
        }
        Command::Verify => {
            let wal_path = args.data_dir.join("wal.log");
            let result = WalRecovery::verify(&wal_path)?;
            println!(
                "entries: {}, corrupted: {}, last lsn: {}",
                result.entries_recovered, result.entries_corrupted, result.last_lsn
            );
        }
        Command::Clear => {
            if args.data_dir.exists() {
                std::fs::remove_dir_all(&args.data_dir)?;
                println!("removed {}", args.data_dir.display());
            } else {
                println!("nothing to remove at {}", args.data_dir.display());
            }
        }
    }
    Ok(())
}
