//! lc - linkcode command-line entry point

use std::process::ExitCode;

fn main() -> ExitCode {
    match linkcode::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            linkcode::ui::output::error(format!("{:#}", err));
            linkcode::ui::output::annotate_error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
