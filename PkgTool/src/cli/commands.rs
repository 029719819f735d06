//! CLI commands for package extraction

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::bail;
use console::style;
use indicatif::ProgressBar;

use super::{EXIT_USAGE, Invocation};
use super::progress::{LOOKING_GLASS, PACKAGE, entry_bar, print_done, print_step};
use crate::error::PackageError;
use crate::extract::{
    BatchReporter, ExtractOptions, ExtractPhase, ExtractProgress, PackageSummary, PackageTask,
    RunSummary, directory_tasks, run_batch, single_task,
};
use crate::package::{OrbisBackend, PackageBackend};

/// Extract the work set described by `invocation`
///
/// Fails only when the input path is unusable; package and entry failures
/// are reported as they happen and counted in the returned summary.
pub fn extract(
    invocation: &Invocation,
    options: &ExtractOptions,
    quiet: bool,
) -> anyhow::Result<RunSummary> {
    let backend = OrbisBackend;
    let start = Instant::now();

    let tasks = match invocation {
        Invocation::Single { pkg, output } => {
            if !pkg.is_file() {
                bail!("package file not found: {}", pkg.display());
            }
            vec![single_task(pkg, output.as_deref())]
        }
        Invocation::Directory { source, output } => {
            if !source.is_dir() {
                bail!("not a directory: {}", source.display());
            }
            discover(source, output.as_deref(), &backend, quiet)
        }
    };

    let reporter = CliReporter::new(quiet);
    let summary = run_batch(&tasks, &backend, options, &reporter);
    print_tally(&summary, start.elapsed());

    Ok(summary)
}

/// Process exit status for the outcome of [`extract`]
///
/// An unusable input path maps to [`EXIT_USAGE`]; otherwise the run summary
/// decides.
pub fn exit_code(result: &anyhow::Result<RunSummary>) -> u8 {
    match result {
        Ok(summary) => summary.exit_code(),
        Err(_) => EXIT_USAGE,
    }
}

fn discover(
    source: &Path,
    output: Option<&Path>,
    backend: &dyn PackageBackend,
    quiet: bool,
) -> Vec<PackageTask> {
    if !quiet {
        println!("{}Scanning {}", LOOKING_GLASS, source.display());
    }

    let tasks = directory_tasks(source, output, backend);
    if tasks.is_empty() {
        println!("No .{} files found in: {}", backend.extension(), source.display());
    } else {
        println!("Found {} package(s) to extract", tasks.len());
    }
    tasks
}

/// Prints result lines and drives the entry progress bar
struct CliReporter {
    quiet: bool,
    bar: Mutex<BarState>,
}

/// Entry bar of the package being processed
#[derive(Default)]
struct BarState {
    /// Title id announced by the header step
    title: Option<String>,
    bar: Option<ProgressBar>,
}

impl CliReporter {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            bar: Mutex::new(BarState::default()),
        }
    }

    fn clear_bar(&self) {
        let pb = match self.bar.lock() {
            Ok(mut state) => {
                state.title = None;
                state.bar.take()
            }
            Err(_) => None,
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    }
}

impl BatchReporter for CliReporter {
    fn package_started(&self, task: &PackageTask, position: usize, total: usize) {
        if !self.quiet {
            let msg = format!("Extracting {}", task.source_path.display());
            print_step(position, total, PACKAGE, &msg);
        }
    }

    fn progress(&self, progress: &ExtractProgress) {
        if self.quiet {
            return;
        }
        let Ok(mut state) = self.bar.lock() else {
            return;
        };
        match progress.phase {
            ExtractPhase::ExtractingHeader => state.title.clone_from(&progress.current_file),
            ExtractPhase::ExtractingEntries => {
                let BarState { title, bar } = &mut *state;
                let pb = bar.get_or_insert_with(|| {
                    entry_bar(progress.total as u64, title.as_deref().unwrap_or("entries"))
                });
                pb.set_position(progress.current as u64);
            }
            ExtractPhase::Complete => {
                state.title = None;
                if let Some(pb) = state.bar.take() {
                    pb.finish_and_clear();
                }
            }
            ExtractPhase::Opening => {}
        }
    }

    fn package_finished(&self, task: &PackageTask, result: &Result<PackageSummary, PackageError>) {
        self.clear_bar();
        match result {
            Ok(summary) => print_summary(summary),
            Err(e) => print_package_error(task, e),
        }
    }
}

fn print_summary(summary: &PackageSummary) {
    if summary.is_success() {
        println!(
            "{} {} {}/{} entries -> {}",
            style("OK  ").green().bold(),
            summary.title_id,
            summary.succeeded_count,
            summary.total_entries,
            summary.output_directory.display()
        );
        return;
    }

    eprintln!(
        "{} {} {} of {} entries failed",
        style("FAIL").red().bold(),
        summary.title_id,
        summary.failed_count,
        summary.total_entries
    );
    for failure in &summary.failures {
        eprintln!(
            "     entry {}: {}",
            failure.entry_index,
            failure.error_message.as_deref().unwrap_or("unknown error")
        );
    }
}

fn print_package_error(task: &PackageTask, error: &PackageError) {
    eprintln!(
        "{} {}: {} failed: {}",
        style("FAIL").red().bold(),
        task.source_path.display(),
        error.stage,
        error.source
    );
}

fn print_tally(summary: &RunSummary, elapsed: Duration) {
    println!();
    println!(
        "Packages: {} attempted, {} succeeded, {} failed",
        summary.packages_attempted,
        style(summary.packages_succeeded).green(),
        if summary.packages_failed > 0 {
            style(summary.packages_failed).red()
        } else {
            style(summary.packages_failed).dim()
        }
    );
    print_done(elapsed);
}
