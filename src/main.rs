//! Lode CLI — cadence-scheduled topic mining.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "lode",
    version,
    about = "Cadence-scheduled topic mining — declarative tasks, date-partitioned datastore, external collectors"
)]
struct Cli {
    #[command(subcommand)]
    command: lode::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = lode::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
