use std::io;

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use pawnsmith::search::{SearchConfig, DEFAULT_DEPTH};
use pawnsmith::uci::UciHandler;

#[derive(Debug, Parser)]
#[command(name = "pawnsmith", version, about = "A fixed depth alpha-beta chess engine speaking UCI")]
struct Args {
    /// Plies searched for every `go` without an explicit depth
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    depth: u32,

    /// Seed for the quiet move shuffle; a random seed is drawn when omitted
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // stdout is the UCI channel, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());

    let mut uci = UciHandler::new(SearchConfig { depth: args.depth }, seed);
    uci.run(io::stdin().lock(), io::stdout())
}
