pub mod directory;
pub mod game;
pub mod session;

use directory::Directory;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// The relay server: one UDP socket, one receive loop, one directory.
pub struct Server {
    socket: Arc<UdpSocket>,
    directory: Directory,
}

impl Server {
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let directory = Directory::new(socket.clone());
        Ok(Self { socket, directory })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive loop. Datagrams are dispatched sequentially into the
    /// directory; per-datagram problems are handled (and logged) there.
    /// Only a socket error ends the loop.
    pub async fn run(self) -> std::io::Result<()> {
        let mut buf = vec![0; nim::MAX_DATAGRAM_LEN];
        loop {
            let (n, from) = self.socket.recv_from(&mut buf).await?;
            if n == 0 {
                tracing::debug!("received empty packet, skipping");
                continue;
            }
            self.directory.handle_datagram(from, &buf[..n]).await;
        }
    }
}
