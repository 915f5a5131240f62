use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    toolpilot_cli::run().await
}
