use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "server",
    version,
    about = "Arithmetic practice game server",
    long_about = "Serves level play, time challenges, skill practice and the \
                  mistake notebook as JSON endpoints for a single player."
)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "MQ_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Fixed RNG seed, for reproducible question sequences.
    #[arg(long, env = "MQ_SEED")]
    pub seed: Option<u64>,

    /// Default log filter when RUST_LOG is not set.
    #[arg(long = "log-level", env = "MQ_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(
        long = "log-format",
        env = "MQ_LOG_FORMAT",
        value_enum,
        default_value = "compact"
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human readable.
    Pretty,
    /// Single line per event.
    Compact,
    /// One JSON object per event.
    Json,
}
