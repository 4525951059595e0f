use crate::cli::MapArgs;
use crate::config::build_config;
use crate::data::DataManager;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use cgforge::engine::diagnostics::Severity;
use cgforge::engine::progress::ProgressReporter;
use cgforge::workflows::coarsen::{self, RunSummary};
use std::path::Path;
use tracing::info;

pub fn run(args: MapArgs, data_manager: &DataManager, show_progress: bool) -> Result<()> {
    let registry = data_manager.load_registry()?;

    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;

    let progress_handler = CliProgressHandler::new(show_progress);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Mapping {} ({} -> {})...",
        config.input.path.display(),
        config.source_force_field,
        config.target_force_field
    );
    let summary = coarsen::run(&config, &registry, &reporter)?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("✓ Structure written to: {}", summary.structure_path.display());
    println!("✓ Topology written to: {}", summary.topology_path.display());
    for path in &summary.itp_paths {
        println!("  {}", file_name(path));
    }

    let warnings = summary.diagnostics.summary(Severity::Warning);
    if !warnings.is_empty() {
        println!(
            "{} warning(s) were issued:",
            summary.diagnostics.count(Severity::Warning)
        );
        for (category, count) in warnings {
            println!("  {:<28} {}", category, count);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
