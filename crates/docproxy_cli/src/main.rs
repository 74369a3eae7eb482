//! docproxy CLI
//!
//! Command-line tools for persisted docproxy frames.
//!
//! # Commands
//!
//! - `inspect` - Display the checksum layout of a frame
//! - `verify` - Check a frame's integrity and structure
//! - `decode` - Print the document held in a frame
//! - `encode` - Frame a JSON document
//! - `rewrite` - Re-frame a document with the current checksum generation

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::rewrite::RewriteOptions;
use commands::verify::VerifyOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// docproxy command-line frame tools.
#[derive(Parser)]
#[command(name = "docproxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Salt mixed into every checksum
    #[arg(global = true, short, long, default_value = "")]
    salt: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the checksum layout of a frame
    Inspect {
        /// Frame file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Check a frame's integrity and structure
    Verify {
        /// Frame file
        file: PathBuf,

        /// Accept uncompressed raw JSON
        #[arg(long)]
        raw: bool,

        /// The frame uses key-table compaction
        #[arg(short, long)]
        compact: bool,

        /// Fail if the stored version is newer than this
        #[arg(long)]
        expect_version: Option<u64>,
    },

    /// Print the document held in a frame
    Decode {
        /// Frame file
        file: PathBuf,

        /// The frame uses key-table compaction
        #[arg(short, long)]
        compact: bool,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Frame a JSON document
    Encode {
        /// JSON input file
        input: PathBuf,

        /// Frame output file
        output: PathBuf,

        /// Use key-table compaction
        #[arg(short, long)]
        compact: bool,

        /// Write a legacy SHA-1 checksum
        #[arg(long)]
        legacy: bool,
    },

    /// Re-frame a document with the current checksum generation
    Rewrite {
        /// Frame file
        file: PathBuf,

        /// Salt to write with (defaults to --salt)
        #[arg(long)]
        new_salt: Option<String>,

        /// The input uses key-table compaction
        #[arg(long)]
        compacted: bool,

        /// Write with key-table compaction
        #[arg(short, long)]
        compact: bool,

        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { file, format } => {
            let format = match format {
                Format::Text => "text",
                Format::Json => "json",
            };
            commands::inspect::run(&file, &cli.salt, format).await?;
        }
        Commands::Verify {
            file,
            raw,
            compact,
            expect_version,
        } => {
            let options = VerifyOptions {
                allow_raw: raw,
                compact,
                expect_version,
            };
            commands::verify::run(&file, &cli.salt, options).await?;
        }
        Commands::Decode {
            file,
            compact,
            pretty,
        } => {
            commands::decode::run(&file, &cli.salt, compact, pretty).await?;
        }
        Commands::Encode {
            input,
            output,
            compact,
            legacy,
        } => {
            commands::encode::run(&input, &output, &cli.salt, compact, legacy).await?;
        }
        Commands::Rewrite {
            file,
            new_salt,
            compacted,
            compact,
            dry_run,
        } => {
            let options = RewriteOptions {
                new_salt,
                compacted,
                compact,
                dry_run,
            };
            commands::rewrite::run(&file, &cli.salt, options).await?;
        }
        Commands::Version => {
            println!("docproxy CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("docproxy Core v{}", docproxy_core::VERSION);
        }
    }

    Ok(())
}
