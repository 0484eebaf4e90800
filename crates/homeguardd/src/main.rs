//! Entry point for the HomeGuard command server.

use std::process::ExitCode;

fn main() -> ExitCode {
    match homeguardd::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error);
            ExitCode::FAILURE
        }
    }
}

#[expect(
    clippy::print_stderr,
    reason = "telemetry may not be installed when startup fails"
)]
fn report(error: &homeguardd::LaunchError) {
    eprintln!("homeguardd: {error}");
}
