use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3030";
const DEFAULT_STORE_PATH: &str = "quizzes.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("QUIZ_LISTEN_ADDR is not a valid socket address: {0}")]
    InvalidAddr(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub store_path: PathBuf,
}

impl Config {
    /// Reads the configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("QUIZ_LISTEN_ADDR").ok(),
            std::env::var("QUIZ_STORE_PATH").ok(),
        )
    }

    fn from_vars(
        listen_addr: Option<String>,
        store_path: Option<String>,
    ) -> Result<Self, ConfigError> {
        let listen_addr = listen_addr.unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(listen_addr.clone()))?;

        let store_path = store_path
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());

        Ok(Self {
            listen_addr,
            store_path: PathBuf::from(store_path),
        })
    }
}
