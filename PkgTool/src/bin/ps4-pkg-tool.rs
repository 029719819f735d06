//! ps4-pkg-tool - batch PS4 package extractor

use std::process::ExitCode;

fn main() -> ExitCode {
    pkgtool::cli::run_cli()
}
