//! traceblock Inspect Tool
//!
//! Lists and reads block files on disk.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use traceblock::{BlockDir, CompleteBlock, Config, MembershipFilter, ReplayBlock, UnsealedBlock};
use tracing_subscriber::{fmt, EnvFilter};

/// traceblock Inspect
#[derive(Parser, Debug)]
#[command(name = "traceblock-inspect")]
#[command(about = "Inspect traceblock block files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the block files in a directory
    List {
        /// Block directory
        dir: PathBuf,
    },

    /// Print every object in a block file
    Dump {
        /// Block file
        file: PathBuf,
    },

    /// Look up one identifier in a block file
    Find {
        /// Block file
        file: PathBuf,

        /// Identifier, hex encoded
        id: String,

        /// Objects per index record used for the in-memory index
        #[arg(long, default_value = "100")]
        records_per_span: usize,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,traceblock=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> traceblock::Result<()> {
    match command {
        Commands::List { dir } => {
            let blocks = BlockDir::open_existing(Config::builder().data_dir(dir).build())?;
            for block in blocks.replay_blocks()? {
                let size = std::fs::metadata(block.path())?.len();
                println!("{}\t{}\t{} bytes", block.block_id(), block.tenant_id(), size);
            }
        }
        Commands::Dump { file } => {
            let block = UnsealedBlock::open(&file)?;
            let mut count = 0u64;
            block.iterate(&mut |id: &[u8], payload: &[u8]| {
                println!("{}\t{} bytes", hex::encode(id), payload.len());
                count += 1;
                Ok(true)
            })?;
            println!("{} objects", count);
        }
        Commands::Find {
            file,
            id,
            records_per_span,
        } => {
            let id = hex::decode(&id).map_err(|e| {
                traceblock::BlockError::Config(format!("identifier is not valid hex: {}", e))
            })?;

            let config = Config::builder()
                .records_per_span(records_per_span)
                .build();
            let unsealed = UnsealedBlock::open(&file)?;
            tracing::info!(block_id = %unsealed.block_id(), tenant_id = unsealed.tenant_id(), "resealing block in memory");
            let block = unsealed.reseal(&config)?;

            if !block.filter().may_contain(&id) {
                println!("absent (filter)");
                return Ok(());
            }
            match block.find(&id)? {
                Some(payload) => println!("found: {} bytes", payload.len()),
                None => println!("absent"),
            }
        }
    }
    Ok(())
}
