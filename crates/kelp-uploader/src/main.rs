// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line upload tool for a kelp blob store.
//!
//! Uploads the given files (and, with `--recursive`, directories) under
//! time-keyed self-describing identifiers, one upload per file, strictly
//! sequentially. Per-item failures are reported and do not abort the
//! remaining items.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use kelp_client::{ClientError, StorageClient, config, config::ClientConfig};
use kelp_core::FileIdentifier;

#[derive(Parser, Debug)]
#[command(
    author,
    about = "Upload files to a kelp blob store",
    name = env!("CARGO_BIN_NAME"),
    rename_all = "kebab-case",
)]
struct Args {
    /// The master endpoint.
    #[arg(long, default_value = config::DEFAULT_MASTER)]
    server: String,
    /// Optional collection for the uploaded blobs.
    #[arg(long)]
    collection: Option<String>,
    /// Replication placement to request at assign time (e.g. "001").
    #[arg(long)]
    replication: Option<String>,
    /// Time-to-live of the uploaded blobs (e.g. "1d").
    #[arg(long)]
    ttl: Option<String>,
    /// The path to a YAML client configuration file; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Walk directories recursively.
    #[arg(long, short)]
    recursive: bool,
    /// Verbose debug output.
    #[arg(long)]
    debug: bool,
    /// Files or directories to upload.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

/// The per-item outcome of a batch upload.
#[derive(Debug)]
struct UploadRecord {
    path: PathBuf,
    outcome: Result<FileIdentifier, ClientError>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let client = StorageClient::with_config(build_config(&args)?);
    client
        .master()
        .health_check()
        .await
        .with_context(|| format!("master at '{}' is not healthy", args.server))?;

    let files = collect_files(&args)?;
    let mut records = Vec::with_capacity(files.len());
    for path in files {
        tracing::info!(path = %path.display(), "uploading");
        let outcome = client.assign_and_upload_time_keyed(&path).await;
        if let Err(error) = &outcome {
            tracing::error!(path = %path.display(), %error, "upload failed");
        }
        records.push(UploadRecord { path, outcome });
    }

    let mut failures = 0usize;
    for record in &records {
        match &record.outcome {
            Ok(fid) => println!("{fid}\t{}", record.path.display()),
            Err(error) => {
                failures += 1;
                println!("ERROR\t{}\t{error}", record.path.display());
            }
        }
    }
    tracing::info!(
        uploaded = records.len() - failures,
        failed = failures,
        "done"
    );

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => config::load_configuration(path)?,
        None => ClientConfig::default(),
    };
    if args.server != config::DEFAULT_MASTER || config.master.is_empty() {
        config.master = args.server.clone();
    }
    if args.collection.is_some() {
        config.collection = args.collection.clone();
    }
    if args.replication.is_some() {
        config.replication = args.replication.clone();
    }
    if args.ttl.is_some() {
        config.ttl = args.ttl.clone();
    }
    Ok(config)
}

/// Expands the argument paths into the list of files to upload, in a
/// deterministic order.
fn collect_files(args: &Args) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in &args.paths {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("unable to stat '{}'", path.display()))?;
        if metadata.is_dir() {
            if !args.recursive {
                anyhow::bail!(
                    "'{}' is a directory; pass --recursive to upload it",
                    path.display()
                );
            }
            walk_directory(path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn walk_directory(root: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut pending = vec![root.to_path_buf()];
    while let Some(directory) = pending.pop() {
        let mut entries: Vec<_> = std::fs::read_dir(&directory)
            .with_context(|| format!("unable to read directory '{}'", directory.display()))?
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("unable to read directory '{}'", directory.display()))?;
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            let path = entry.path();
            if entry
                .file_type()
                .with_context(|| format!("unable to stat '{}'", path.display()))?
                .is_dir()
            {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    Ok(())
}
