//! bucketkv CLI
//!
//! Command-line interface over a local directory bucket.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use bucketkv::{Config, KvError, KvStore, ObjectKvStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// bucketkv CLI
#[derive(Parser, Debug)]
#[command(name = "bucketkv")]
#[command(about = "Key-value store over a local object bucket")]
#[command(version)]
struct Args {
    /// Bucket directory
    #[arg(short, long, default_value = "./bucketkv_data")]
    root: PathBuf,

    /// Base path prepended to every key
    #[arg(short, long, default_value = "bucketkv/")]
    basepath: String,

    /// Objects per listing page
    #[arg(short, long, default_value = "1000")]
    page_size: usize,

    /// Create the bucket directory if it does not exist
    #[arg(long)]
    create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Count keys
    Size,

    /// List keys in [prefix+start, prefix+end)
    Scan {
        prefix: String,
        start: String,
        end: String,
    },

    /// List keys starting with a prefix
    Keys {
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Delete every key
    Clear,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,bucketkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let builder = Config::builder()
        .basepath(&args.basepath)
        .list_page_size(args.page_size);
    let config = if args.create {
        builder.local_root_create(&args.root).build()
    } else {
        builder.local_root(&args.root).build()
    };

    let store = match ObjectKvStore::open(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open bucket {}: {}", args.root.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(&store, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = write_keys(&mut io::stdout().lock(), e.partial_keys());
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(store: &ObjectKvStore, command: Commands) -> Result<(), KvError> {
    match command {
        Commands::Get { key } => {
            let value = store.get(&key)?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Set { key, value } => store.set(&key, value.as_bytes())?,
        Commands::Del { key } => store.del(&key)?,
        Commands::Size => println!("{}", store.size()?),
        Commands::Scan { prefix, start, end } => {
            let keys = store.scan(&prefix, &start, &end)?;
            write_keys(&mut io::stdout().lock(), &keys)?;
        }
        Commands::Keys { prefix } => {
            let keys = store.scan_prefix(&prefix)?;
            write_keys(&mut io::stdout().lock(), &keys)?;
        }
        Commands::Clear => store.clear()?,
    }
    Ok(())
}

/// One key per line; a failed scan prints what it collected the same way
fn write_keys(out: &mut impl Write, keys: &[String]) -> Result<(), KvError> {
    for key in keys {
        writeln!(out, "{}", key).map_err(|e| KvError::Write(format!("stdout: {}", e)))?;
    }
    Ok(())
}
