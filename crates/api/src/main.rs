use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match api::start_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("interview-prep: {e}");
            ExitCode::FAILURE
        }
    }
}
