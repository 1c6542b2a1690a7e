//! CLI command handler: build opts (defaults < .shareinv.toml < flags), run the batch, print a summary.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::batch::BatchRunner;
use crate::engine::arg_parser::Cli;
use crate::engine::progress::{create_counter, finish_bar};
use crate::events::{EventSink, FanOut, JsonLinesEvents, LogEvents};
use crate::manifest::{read_manifest, targets_from_rows};
use crate::utils::inventory_toml::{apply_file_to_opts, load_inventory_toml};
use crate::utils::{Colors, running_as_root, setup_logging};
use crate::{BatchReport, Opts, ScanTarget, TargetStatus};

/// Opts plus the CLI-only settings resolved alongside them.
struct RunSettings {
    opts: Opts,
    manifest: Option<PathBuf>,
    events_file: Option<PathBuf>,
    output_given: bool,
}

fn setup_opts(cli: &Cli) -> RunSettings {
    let mut opts = Opts::default();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let file = load_inventory_toml(&cwd, cli.config.as_deref())
        .map(|f| apply_file_to_opts(&f, &mut opts))
        .unwrap_or_default();

    if let Some(ref server) = cli.server {
        opts.server = server.clone();
    }
    if cli.network_root.is_some() {
        opts.network_root = cli.network_root.clone();
    }
    if let Some(ref dir) = cli.output_dir {
        opts.sink.output_dir = dir.clone();
    }
    if let Some(ref base) = cli.base {
        opts.sink.base_name = base.clone();
    }
    if let Some(mb) = cli.max_size_mb {
        opts.sink.max_segment_bytes = mb.saturating_mul(1024 * 1024);
    }
    if cli.threads.is_some() {
        opts.num_threads = cli.threads;
    }
    if let Some(v) = cli.parallel_walk {
        opts.parallel_walk = v;
    }
    if let Some(v) = cli.follow_links {
        opts.follow_links = v;
    }
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    if let Some(no) = cli.no_doc_props {
        opts.document_properties = !no;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    setup_logging(opts.verbose);
    for pattern in opts.exclude.iter().filter(|p| p.starts_with('!')) {
        warn!(
            "Exclude pattern {:?}: negation is not supported, '!' matches literally",
            pattern
        );
    }

    RunSettings {
        output_given: cli.output_dir.is_some() || file.output_dir.is_some(),
        manifest: cli.manifest.clone().or(file.manifest),
        events_file: cli.events.clone().or(file.events_file),
        opts,
    }
}

fn event_sinks(events_file: Option<&PathBuf>) -> Result<Arc<dyn EventSink>> {
    let mut fan = FanOut::new().with(LogEvents);
    if let Some(path) = events_file {
        let json = JsonLinesEvents::create(path)
            .with_context(|| format!("open event log {}", path.display()))?;
        fan = fan.with(json);
    }
    Ok(Arc::new(fan))
}

/// Manifest targets first (row order), then PATHS.
fn collect_targets(cli: &Cli, settings: &RunSettings, events: &dyn EventSink) -> Result<Vec<ScanTarget>> {
    let opts = &settings.opts;
    let mut targets = Vec::new();
    if let Some(ref manifest) = settings.manifest {
        let rows = read_manifest(manifest, opts.manifest_delimiter, events)?;
        debug!("{} row(s) in {}", rows.len(), manifest.display());
        targets.extend(targets_from_rows(rows, opts.network_root.as_deref()));
    }
    for path in &cli.paths {
        let label = if opts.server.is_empty() {
            path.display().to_string()
        } else {
            opts.server.clone()
        };
        targets.push(ScanTarget::from_path(label, path.clone()));
    }
    Ok(targets)
}

fn print_summary(report: &BatchReport) {
    for t in &report.targets {
        let (color, tag) = match t.target.status {
            TargetStatus::Succeeded => (Colors::OK, "OK"),
            TargetStatus::RetryExhausted | TargetStatus::Failed => (Colors::FAILED, "FAILED"),
            TargetStatus::Pending => (Colors::SKIPPED, "NOT RUN"),
        };
        let counts = t
            .last_outcome()
            .map(|o| {
                format!(
                    "{} files, {} files skipped, {} dirs skipped",
                    o.files_visited, o.files_skipped, o.dirs_skipped
                )
            })
            .unwrap_or_default();
        println!(
            "{:>8}  [{}] {}  {}",
            Colors::colorize(color, tag),
            t.target.label,
            t.target.display_root(),
            counts
        );
    }
    let skipped = report.files_skipped + report.dirs_skipped;
    let skipped_str = format!("{} skipped", skipped);
    println!(
        "{} files written to {} segment(s) in {:?}; {}",
        report.files_visited,
        report.segments.len(),
        report.elapsed,
        if skipped > 0 {
            Colors::colorize(Colors::SKIPPED, &skipped_str)
        } else {
            Colors::colorize(Colors::OK, &skipped_str)
        }
    );
    for seg in &report.segments {
        println!("  {}", seg.display());
    }
}

/// Run the inventory described by `cli`. Errors (non-zero exit) on bad arguments or output failure.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let settings = setup_opts(cli);
    if settings.manifest.is_none() && cli.paths.is_empty() {
        bail!("nothing to inventory: give PATHS or --manifest");
    }
    if !settings.output_given {
        bail!("no output directory: give --output-dir or set output_dir in the config file");
    }
    if running_as_root() {
        info!("Running as root: access failures in the output reflect root's view of the share.");
    }

    let events = event_sinks(settings.events_file.as_ref())?;
    let targets = collect_targets(cli, &settings, events.as_ref())?;
    if targets.is_empty() {
        bail!("manifest has no usable rows");
    }

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let mut runner =
        BatchRunner::new(&settings.opts, Arc::clone(&events))?.with_cancel(cancel_requested);
    let bar = settings.opts.verbose.then(|| create_counter("Inventory"));
    if let Some(ref bar) = bar {
        runner = runner.with_progress(Arc::clone(bar));
    }
    let report = runner.run(targets)?;
    if let Some(ref bar) = bar {
        finish_bar(bar);
    }

    print_summary(&report);
    if report.cancelled {
        warn!("Cancelled; output holds the records written before Ctrl+C.");
    }
    Ok(())
}
