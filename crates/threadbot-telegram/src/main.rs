// ABOUTME: Entry point for threadbot-telegram binary.
// ABOUTME: Loads config, connects to Telegram and the completion API, runs Long Polling event loop.

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "threadbot-telegram")]
#[command(about = "Threaded GPT conversations over Telegram Long Polling")]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "THREADBOT_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    threadbot_log::init_for(&["threadbot_telegram", "threadbot_core"]);

    let cli = Cli::parse();
    threadbot_telegram::run(cli.config).await
}
