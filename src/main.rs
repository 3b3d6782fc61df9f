//! statusflow - task checkbox cycling and lifecycle dates for markdown files

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = statusflow::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
