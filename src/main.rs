use std::process::ExitCode;

fn main() -> ExitCode {
    // .env is optional; missing files are fine, only load errors matter.
    let _ = dotenvy::dotenv();
    matchpoint::init_tracing();

    match matchpoint::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
