use std::process::ExitCode;

fn main() -> ExitCode {
    labelsync::logging::init_logging();

    match labelsync::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
