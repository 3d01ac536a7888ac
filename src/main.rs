/// Chatbar console demo
///
/// Plays the demo workflows against an in-memory chat bar and logs every visible change.

use chatbar::{config::Config, run_console};

/// Application entry point
///
/// Loads configuration from the environment and drives the demo from stdin:
/// - start / stop / next / prev control the engine
/// - bg <index|url> and nextbg control the background
/// - any other line counts as user interaction
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (built-in workflows and auto-loop unless overridden)
    let config = Config::default();

    run_console(config).await?;

    Ok(())
}
