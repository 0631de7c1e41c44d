use std::io;
use std::sync::Arc;

use log::{info, warn};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

use crate::channel::{Channel, ChannelError};
use crate::quiz::store::QuizStore;
use crate::session::Session;

/// Accepts clients forever, one independent session per connection.
pub async fn serve(listener: TcpListener, store: Arc<QuizStore>) -> io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Client connected from {addr}");

        let store = store.clone();
        tokio::spawn(async move {
            if let Err(e) = handle(stream, store).await {
                warn!("Session with {addr} ended abruptly: {e}");
            }
            info!("Client {addr} disconnected");
        });
    }
}

async fn handle(stream: TcpStream, store: Arc<QuizStore>) -> Result<(), ChannelError> {
    let (reader, writer) = stream.into_split();
    let channel = Channel::new(BufReader::new(reader), writer);
    Session::new(channel, store).run().await
}
