mod channel;
mod config;
mod quiz;
mod server;
mod session;

use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info};
use tokio::net::TcpListener;

use config::Config;
use quiz::store::QuizStore;

type MainResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult {
    // The .env file is optional, plain environment variables work too.
    dotenv().ok();

    pretty_env_logger::init();
    info!("Starting quiz server...");

    let config = Config::from_env()?;

    info!("Opening the quiz store at {}", config.store_path.display());
    let store = Arc::new(QuizStore::open(&config.store_path).await?);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    tokio::select! {
        result = server::serve(listener, store) => {
            if let Err(e) = &result {
                error!("Server stopped: {e}");
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }
    Ok(())
}
