use std::sync::Arc;

use quickbite_core::application::order_board::OrderBoard;
use quickbite_core::application::polling::spawn_polling;
use quickbite_core::config::Config;
use quickbite_core::inbound::console::{Console, Reply, HELP};
use quickbite_core::outbound::notifier::TracingNotifier;
use quickbite_types::ports::credentials::{CredentialProvider, StaticCredentials};
use tokio::io::{AsyncBufReadExt, BufReader};

mod gateway;

use gateway::build_gateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for API_BASE_URL / ADMIN_TOKEN / SESSION_ID when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let credentials: Arc<dyn CredentialProvider> = Arc::new(StaticCredentials::new(
        config.session_id.clone(),
        config.admin_token.clone(),
    ));
    let gateway = Arc::new(build_gateway(&config, credentials.clone())?);
    let board = Arc::new(OrderBoard::new(gateway.clone(), Arc::new(TracingNotifier)));
    let polling = spawn_polling(board.clone(), config.poll_interval);
    let console = Console::new(board, gateway, credentials, config.stepper_density);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match console.handle_line(&line).await {
            Ok(Reply::Quit) => break,
            Ok(Reply::Text(text)) if text.is_empty() => {}
            Ok(Reply::Text(text)) => println!("{text}"),
            Err(err) => println!("error: {err}"),
        }
    }

    polling.stop();
    tracing::info!("bye");
    Ok(())
}
