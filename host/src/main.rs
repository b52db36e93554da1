use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod commands;
mod config;
mod loader;
mod logging;
mod party;
mod session;

use crate::config::HostConfig;
use crate::party::{Outcome, Party};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::setup();
    dotenvy::from_path(".env").ok();

    let config = HostConfig::from_env();
    info!(
        "Starting party host with content from {} (set PARTY_CONTENT_PATH to change)",
        config.content_path.display()
    );

    let document = loader::load_content(&config.content_path).await;
    let mut party = Party::new(config, document);

    println!("🎉 Party games ready. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match party.execute(command).await {
            Outcome::Reply(reply) => {
                for line in reply {
                    println!("{}", line);
                }
            }
            Outcome::Quit => break,
        }
    }

    info!("Party host shutting down");
    Ok(())
}
