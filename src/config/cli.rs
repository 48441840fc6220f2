use crate::domain::model::Market;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    Home,
    Target,
}

impl From<MarketArg> for Market {
    fn from(arg: MarketArg) -> Self {
        match arg {
            MarketArg::Home => Market::Home,
            MarketArg::Target => Market::Target,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "market-gap")]
#[command(about = "Find keywords with strong home demand and weak competition in a target market")]
pub struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a single keyword
    Scan { keyword: String },

    /// Scan every keyword in a file, one per line
    Batch {
        input_file: PathBuf,

        /// Write results as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show related searches for a keyword in one market
    Related {
        keyword: String,

        #[arg(short, long, value_enum, default_value = "target")]
        market: MarketArg,
    },

    /// Show the selected search backend and paid account usage
    Status,
}

/// 批次檔：一行一個關鍵字，略過空行與 `#` 註解
pub fn parse_keyword_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
