//! Scan command - reload once and print the report.

use std::path::PathBuf;
use std::sync::Arc;

use rigcache::reload::{AsyncReloader, ImmediateStage, InlineExecutor, ReloadReport};
use rigcache::ConfigFile;

use super::common::prepare;
use crate::error::CliError;

/// Run the scan command.
pub fn run(config: &ConfigFile, packs: Option<PathBuf>, concurrent: bool) -> Result<(), CliError> {
    let (cache, overlays) = prepare(packs, config)?;

    let report = if concurrent {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("rigcache-parse")
            .enable_all()
            .build()?;
        let reloader = AsyncReloader::new(
            Arc::clone(&cache),
            runtime.handle().clone(),
            Arc::new(InlineExecutor),
        );
        runtime.block_on(reloader.reload(overlays, &ImmediateStage))?
    } else {
        cache.reload(&overlays)?
    };

    print_report(&report);
    println!();
    println!("{}", cache.metrics());
    Ok(())
}

/// Print a reload report with its failures and skipped packs.
pub fn print_report(report: &ReloadReport) {
    println!("{}", report);

    if !report.skipped.is_empty() {
        println!();
        println!("Skipped packs:");
        for name in &report.skipped {
            println!("  {}", name);
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failed files:");
        for failure in &report.failures {
            println!(
                "  [{}] {} ({}): {}",
                failure.kind, failure.id, failure.overlay, failure.reason
            );
        }
    }
}
