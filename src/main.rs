use std::process::ExitCode;

fn main() -> ExitCode {
    match ocrvault_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ocrvault stopped");
            eprintln!("ocrvault: {e}");
            ExitCode::FAILURE
        }
    }
}
