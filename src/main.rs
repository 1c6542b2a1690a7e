//! Shareinv CLI: inventory share roots or a manifest of them.

use anyhow::Result;
use clap::Parser;
use shareinv::engine::arg_parser::Cli;
use shareinv::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
