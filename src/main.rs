use clap::Parser;
use tokenshield::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Estimate(args) => cli::estimate::run(args),
        Command::Models => cli::models::run(),
        Command::Similarity(args) => cli::similarity::run(args),
    }
}
