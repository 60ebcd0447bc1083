use clap::{Parser, Subcommand};
use shortkey_core::Key;
use std::path::PathBuf;

pub const REPLICA_COUNT_ENV: &str = "SHORTKEY_REPLICA_COUNT";
pub const REPLICA_INDEX_ENV: &str = "SHORTKEY_REPLICA_INDEX";
pub const HOSTNAME_ENV: &str = "SHORTKEY_HOSTNAME";
pub const INITIAL_LENGTH_ENV: &str = "SHORTKEY_INITIAL_LENGTH";
pub const SNAPSHOT_PATH_ENV: &str = "SHORTKEY_SNAPSHOT_PATH";
pub const JSON_LOGS_ENV: &str = "SHORTKEY_JSON_LOGS";

pub const DEFAULT_INITIAL_LENGTH: &str = "2";

#[derive(Debug, Parser)]
#[command(name = "shortkey", about = "Mint and recycle cluster-unique short keys")]
pub struct CLI {
    /// Total number of replicas sharing the key space.
    #[arg(long, env = REPLICA_COUNT_ENV)]
    pub replica_count: u64,

    /// This replica's ordinal, in `0..replica-count`.
    #[arg(long, env = REPLICA_INDEX_ENV, conflicts_with = "hostname")]
    pub replica_index: Option<u64>,

    /// Hostname whose trailing digits give this replica's ordinal.
    #[arg(long, env = HOSTNAME_ENV)]
    pub hostname: Option<String>,

    #[arg(long, env = INITIAL_LENGTH_ENV, default_value = DEFAULT_INITIAL_LENGTH)]
    pub initial_length: usize,

    /// Where allocator state is restored from and saved to.
    #[arg(long, env = SNAPSHOT_PATH_ENV)]
    pub snapshot_path: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, env = JSON_LOGS_ENV)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate keys and print one per line.
    Mint {
        #[arg(long, default_value_t = 1)]
        count: u64,
    },
    /// Return keys to the recycle pool. Every key is validated before any
    /// of them is released.
    Release {
        #[arg(required = true)]
        keys: Vec<Key>,
    },
    /// Print the block every replica owns at a key length.
    Partitions {
        #[arg(long, default_value = DEFAULT_INITIAL_LENGTH)]
        length: usize,
    },
}
