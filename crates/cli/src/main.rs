use std::process::ExitCode;

mod args;
mod run;

#[tokio::main]
async fn main() -> ExitCode {
    match run::run(std::env::args()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
