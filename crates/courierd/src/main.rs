//! Courier daemon binary.

use std::process::ExitCode;

fn main() -> ExitCode {
    courierd::run(std::env::args_os())
}
