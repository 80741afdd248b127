use crate::mirror::{Applied, Mirror};
use crate::view::View;
use nim::wire::{ToClient, ToServer};
use nim::MAX_DATAGRAM_LEN;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::UdpSocket;

/// The single server-facing endpoint of the client process.
#[derive(Debug, Clone)]
pub struct Session {
    socket: Arc<UdpSocket>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
}

impl Session {
    /// Bind the configured local address, connect to the server, and send
    /// the join request. The id assignment arrives on the receive loop like
    /// every other notification.
    #[tracing::instrument]
    pub async fn create(local: SocketAddr, server: SocketAddr, name: &str) -> Result<Self, Error> {
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        let session = Self {
            socket: Arc::new(socket),
        };
        session
            .send(ToServer::Join {
                name: name.to_string(),
            })
            .await?;
        Ok(session)
    }

    pub async fn send(&self, message: ToServer) -> Result<(), Error> {
        tracing::debug!("Sending: {:?}", message);
        self.socket.send(&message.to_vec()).await?;
        Ok(())
    }

    /// Receive loop: decode each server datagram and apply it to the mirror.
    /// Malformed datagrams are logged and skipped; a termination notice ends
    /// the loop.
    pub async fn run<V: View>(&self, mut mirror: Mirror<V>) -> Result<(), Error> {
        let mut buf = vec![0; MAX_DATAGRAM_LEN];
        loop {
            let n = self.socket.recv(&mut buf).await?;
            let message = match ToClient::deserialize(&buf[..n]) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!("discarding malformed datagram: {}", err);
                    continue;
                }
            };
            tracing::debug!("Received: {:?}", message);
            if mirror.apply(message) == Applied::Terminated {
                return Ok(());
            }
        }
    }
}
