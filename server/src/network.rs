//! TCP listener accepting clients and spawning one worker per connection.

use crate::connection;
use crate::lobby::Lobby;
use log::info;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The listening server. All workers share one [`Lobby`].
pub struct Server {
    listener: TcpListener,
    lobby: Arc<Lobby>,
}

impl Server {
    /// Binds the listening socket. This is the only fatal error path the
    /// server has; everything after bind is per-connection.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Server {
            listener,
            lobby: Arc::new(Lobby::new()),
        })
    }

    /// The actual bound address, useful when binding port 0 in tests.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop; runs until the process stops.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("{} has connected", peer);
            let lobby = Arc::clone(&self.lobby);
            tokio::spawn(connection::handle_connection(stream, peer, lobby));
        }
    }
}
