use model::Venue;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    runner::launch(Venue::Kraken).await
}
