use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use onebrc::{Config, Pipeline};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to measurements file
    input: PathBuf,

    /// Where to write the summary
    output: PathBuf,

    /// Number of byte ranges read in parallel
    #[arg(long)]
    readers: Option<usize>,

    /// Number of parsing threads
    #[arg(long)]
    workers: Option<usize>,

    /// Initial read block size in bytes
    #[arg(long)]
    block_size: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = Config::default();
    if let Some(readers) = args.readers {
        config = config.with_readers(readers);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(block_size) = args.block_size {
        config = config.with_block_size(block_size);
    }

    let summary = Pipeline::new(config)
        .run_to_file(&args.input, &args.output)
        .with_context(|| format!("aggregating {}", args.input.display()))?;
    log::info!("{} names written to {}", summary.len(), args.output.display());
    Ok(())
}
