//! CLI definition using clap derive.

use clap::{Parser, ValueEnum};
use exmon_link::Endpoint;

/// Endpoint used when neither `--endpoint` nor `EXMON_ENDPOINT` is set.
pub const DEFAULT_ENDPOINT: &str = "wss://localhost:8004/ws";

#[derive(Parser)]
#[command(name = "exmon", about = "Live view of state pushed by a monitoring server")]
pub struct Cli {
    /// WebSocket endpoint pushing partial state updates (ws:// or wss://)
    #[arg(
        long,
        env = "EXMON_ENDPOINT",
        default_value = DEFAULT_ENDPOINT,
        value_parser = Endpoint::parse
    )]
    pub endpoint: Endpoint,

    /// Seconds to wait before reconnecting after the link drops
    #[arg(long, env = "EXMON_RETRY_DELAY_SECS", default_value_t = 5)]
    pub retry_delay_secs: u64,

    /// Output style for each state change
    #[arg(long, value_enum, default_value_t = Format::Line)]
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One compact line per change
    Line,
    /// Status header followed by the indented tree
    Pretty,
}
