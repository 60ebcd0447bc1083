mod cli;

use crate::cli::{Command, CLI};
use anyhow::bail;
use clap::Parser;
use shortkey_allocator::{
    compute_epoch, Allocator, AllocatorSettings, Release, ReplicaIdentity,
};
use shortkey_core::encode;
use shortkey_shortener::snapshot_file;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.json_logs);

    match &config.command {
        Command::Partitions { length } => print_partitions(config.replica_count, *length),
        Command::Mint { count } => {
            let keys = run_allocator(&config, |allocator| {
                (0..*count).map(|_| allocator.allocate()).collect::<Vec<_>>()
            })?;
            for key in keys {
                println!("{key}");
            }
            Ok(())
        }
        Command::Release { keys } => {
            let outcomes = run_allocator(&config, |allocator| {
                keys.iter()
                    .map(|key| (key, allocator.release(key)))
                    .collect::<Vec<_>>()
            })?;
            for (key, outcome) in outcomes {
                let outcome = match outcome {
                    Release::Recycled => "recycled",
                    Release::AlreadyReleased => "already-released",
                    Release::NotIssued => "not-issued",
                };
                println!("{key}\t{outcome}");
            }
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_identity(config: &CLI) -> anyhow::Result<ReplicaIdentity> {
    let identity = match (config.replica_index, config.hostname.as_deref()) {
        (Some(index), _) => ReplicaIdentity::new(index, config.replica_count)?,
        (None, Some(hostname)) => ReplicaIdentity::from_hostname(hostname, config.replica_count)?,
        (None, None) => bail!("either --replica-index or --hostname is required"),
    };
    Ok(identity)
}

/// Runs `f` against this replica's allocator. With a snapshot path the
/// whole cycle holds the snapshot lock and the result is only returned after
/// the new state is saved.
fn run_allocator<T>(config: &CLI, f: impl FnOnce(&Allocator) -> T) -> anyhow::Result<T> {
    let identity = resolve_identity(config)?;
    let settings = AllocatorSettings::builder()
        .identity(identity)
        .initial_length(config.initial_length)
        .build();

    info!(
        identity = %identity,
        initial_length = config.initial_length,
        snapshot_path = ?config.snapshot_path,
        "starting key allocator"
    );

    let output = match &config.snapshot_path {
        Some(path) => snapshot_file::with_allocator(path, settings, f)?,
        None => f(&Allocator::new(settings)?),
    };
    Ok(output)
}

fn print_partitions(count: u64, length: usize) -> anyhow::Result<()> {
    println!("index\tanchor\tlimit\tfirst\tlast");
    for index in 0..count {
        let epoch = compute_epoch(ReplicaIdentity::new(index, count)?, length)?;
        if epoch.is_empty() {
            println!("{index}\t{}\t{}\t-\t-", epoch.anchor, epoch.limit);
            continue;
        }
        let first = encode(epoch.anchor, length)?;
        let last = encode(epoch.limit - 1, length)?;
        println!(
            "{index}\t{}\t{}\t{first}\t{last}",
            epoch.anchor, epoch.limit
        );
    }
    Ok(())
}
