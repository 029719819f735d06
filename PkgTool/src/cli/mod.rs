//! ps4-pkg-tool CLI - batch extraction of PS4 packages

pub mod commands;
pub mod progress;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::bail;
use clap::{ArgAction, CommandFactory, Parser};
use console::style;
use tracing_subscriber::EnvFilter;

use crate::extract::{Executor, ExtractOptions};

/// Exit status for invalid invocations and unusable input paths
pub const EXIT_USAGE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "ps4-pkg-tool", version)]
#[command(about = "Extract PS4 .pkg files, one at a time or a whole directory tree", long_about = None)]
pub struct Cli {
    /// Package file and optional output directory (with --dir: output directory only)
    #[arg(value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Extract every .pkg file found recursively under this directory
    #[arg(long, value_name = "SOURCE_DIR")]
    dir: Option<PathBuf>,

    /// Extract the entries of each package on a worker pool
    #[arg(long)]
    parallel: bool,

    /// Worker thread count (implies --parallel)
    #[arg(short, long, value_name = "N")]
    jobs: Option<NonZeroUsize>,

    /// Hide progress output
    #[arg(short, long)]
    quiet: bool,

    /// More log output (-v info, -vv debug); `RUST_LOG` takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// What a command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `ps4-pkg-tool <pkg> [output]`
    Single {
        pkg: PathBuf,
        output: Option<PathBuf>,
    },
    /// `ps4-pkg-tool --dir <source> [output]`
    Directory {
        source: PathBuf,
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Map the positional arguments onto one of the two modes.
    pub fn invocation(&self) -> anyhow::Result<Invocation> {
        let mut inputs = self.inputs.iter().cloned();
        let first = inputs.next();
        let second = inputs.next();
        if inputs.next().is_some() {
            bail!("too many arguments");
        }

        match (&self.dir, first, second) {
            (Some(source), output, None) => Ok(Invocation::Directory {
                source: source.clone(),
                output,
            }),
            (Some(_), Some(_), Some(_)) => bail!("--dir takes at most one output directory"),
            (None, Some(pkg), output) => Ok(Invocation::Single { pkg, output }),
            (None, None, _) => bail!("no package file or --dir given"),
            // a second positional without a first cannot happen
            (Some(_), None, Some(_)) => bail!("too many arguments"),
        }
    }

    /// Extraction options selected by the flags.
    pub fn options(&self) -> ExtractOptions {
        let executor = match (self.parallel, self.jobs) {
            (_, Some(jobs)) => Executor::Parallel {
                threads: Some(jobs.get()),
            },
            (true, None) => Executor::Parallel { threads: None },
            (false, None) => Executor::Sequential,
        };
        ExtractOptions::new().with_executor(executor)
    }
}

/// Run the ps4-pkg-tool CLI
///
/// Exit status: 0 when every package extracted cleanly, [`EXIT_USAGE`] for
/// invalid invocations or missing inputs, and
/// [`EXIT_EXTRACTION_FAILED`](crate::extract::EXIT_EXTRACTION_FAILED) when any
/// package or entry failed.
pub fn run_cli() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version go to stdout and are not failures
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);

    let invocation = match cli.invocation() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            eprintln!();
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let result = commands::extract(&invocation, &cli.options(), cli.quiet);
    if let Err(e) = &result {
        eprintln!("{} {e:#}", style("error:").red().bold());
    }
    ExitCode::from(commands::exit_code(&result))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
