//! CLI module for TokenShield
//!
//! Operator commands around the pricing table and similarity scorer:
//! - `estimate`: price a request
//! - `models`: list the pricing table
//! - `similarity`: score two prompts the way the cache does

pub mod estimate;
pub mod models;
pub mod similarity;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// TokenShield - response caching and cost tracking for LLM clients
#[derive(Parser)]
#[command(name = "tokenshield")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Estimate the cost of a request
    Estimate(estimate::EstimateArgs),

    /// List known models and their pricing
    Models,

    /// Score the similarity of two prompts
    Similarity(similarity::SimilarityArgs),
}

/// Load configuration and initialize logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
