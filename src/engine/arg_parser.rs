use clap::Parser;
use std::path::PathBuf;

/// Inventory network shares into rotating pipe-delimited files.
#[derive(Clone, Parser)]
#[command(name = "shareinv")]
#[command(
    about = "Walk share roots (or a manifest of them) and write one record per file; inaccessible roots are retried once."
)]
pub struct Cli {
    /// Roots to inventory directly. Labeled with --server.
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Manifest of targets (header row with label and path columns).
    #[arg(long, short = 'M')]
    pub manifest: Option<PathBuf>,

    /// Label written to the ServerName column for PATHS.
    #[arg(long, short = 's')]
    pub server: Option<String>,

    /// Prefix for manifest logical paths (e.g. \\server01 or a mount point).
    #[arg(long)]
    pub network_root: Option<PathBuf>,

    /// Directory for output segments (created if missing).
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Output segment base name: <BASE>_001.csv, <BASE>_002.csv, ...
    #[arg(long)]
    pub base: Option<String>,

    /// Rotate output segments at this size (MB).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_size_mb: Option<u64>,

    /// Metadata worker threads. Default: min(available, 8), capped by the open-file limit.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Use the parallel directory walker.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub parallel_walk: Option<bool>,

    /// Follow symbolic links (loops are skipped).
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Skip reading Authors / LastSavedBy from Office documents.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub no_doc_props: Option<bool>,

    /// Append structured events (JSON lines) to this file.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Config file. Default: .shareinv.toml in the current directory.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging and a progress counter).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
