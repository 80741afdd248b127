use crate::game::GameState;
use nim::{wire::ToClient, PlayerId};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::UdpSocket;

pub type Id = uuid::Uuid;

/// A send to a peer failed. Treated exactly like a `Quit` from that peer:
/// the directory tears the session down.
#[derive(Debug, thiserror::Error)]
#[error("peer {player} at {addr} unreachable: {source}")]
pub struct PeerUnreachable {
    pub player: PlayerId,
    pub addr: SocketAddr,
    source: std::io::Error,
}

/// One remote participant: its transport address plus the shared server
/// socket its notifications go out on.
pub struct Endpoint {
    pub addr: SocketAddr,
    pub name: String,
    socket: Arc<UdpSocket>,
}

impl Endpoint {
    pub fn new(socket: Arc<UdpSocket>, addr: SocketAddr, name: String) -> Self {
        Self { addr, name, socket }
    }

    pub async fn notify(&self, message: &ToClient) -> std::io::Result<()> {
        tracing::debug!(to = %self.addr, "sending {:?}", message);
        self.socket.send_to(&message.to_vec(), self.addr).await?;
        Ok(())
    }
}

/// One matched pair of players (or a single player awaiting a match) plus
/// the authoritative game state they share. The fixed two-seat array makes
/// the "never more than two players" invariant structural.
pub struct Session {
    pub id: Id,
    pub game: GameState,
    seats: [Option<Endpoint>; 2],
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Id::new_v4(),
            game: GameState::new(),
            seats: [None, None],
        }
    }

    /// Seat a player at the first free seat and return its player id, or
    /// `None` if the session is already full.
    pub fn seat(&mut self, endpoint: Endpoint) -> Option<PlayerId> {
        let free = self.seats.iter().position(|seat| seat.is_none())?;
        self.seats[free] = Some(endpoint);
        Some(free as PlayerId)
    }

    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_some()).count()
    }

    pub fn is_waiting(&self) -> bool {
        self.player_count() == 1
    }

    pub fn player_at(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.seats
            .iter()
            .position(|seat| seat.as_ref().map(|e| e.addr) == Some(addr))
            .map(|seat| seat as PlayerId)
    }

    pub fn endpoint(&self, player: PlayerId) -> Option<&Endpoint> {
        self.seats.get(player as usize)?.as_ref()
    }

    pub fn addresses(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.seats.iter().flatten().map(|endpoint| endpoint.addr)
    }

    /// Send `message` to one seat.
    pub async fn notify(&self, player: PlayerId, message: &ToClient) -> Result<(), PeerUnreachable> {
        let endpoint = match self.endpoint(player) {
            Some(endpoint) => endpoint,
            None => return Ok(()),
        };
        endpoint
            .notify(message)
            .await
            .map_err(|source| PeerUnreachable {
                player,
                addr: endpoint.addr,
                source,
            })
    }

    /// Send `message` to both seats, stopping at the first unreachable peer.
    pub async fn broadcast(&self, message: &ToClient) -> Result<(), PeerUnreachable> {
        for player in 0..2 {
            self.notify(player, message).await?;
        }
        Ok(())
    }

    /// The ordered join handshake. The joiner learns its id and hears its own
    /// name back; when the second seat fills, both sides learn the other's
    /// name before the opening turn report arrives.
    pub async fn welcome(&self, player: PlayerId) -> Result<(), PeerUnreachable> {
        self.notify(player, &ToClient::Id { player }).await?;
        if let Some(endpoint) = self.endpoint(player) {
            let name = endpoint.name.clone();
            self.notify(player, &ToClient::Name { player, name }).await?;
        }
        if player == 1 {
            if let Some(existing) = self.endpoint(0) {
                let name = existing.name.clone();
                self.notify(1, &ToClient::Name { player: 0, name }).await?;
            }
            if let Some(joined) = self.endpoint(1) {
                let name = joined.name.clone();
                self.notify(0, &ToClient::Name { player: 1, name }).await?;
            }
            self.broadcast(&ToClient::Turn { player: 0 }).await?;
        }
        Ok(())
    }

    /// Report an applied move to both seats: the new heap count first so
    /// clients repaint before re-enabling input on the turn report, then the
    /// winner and score on the closing move.
    pub async fn announce(&self, mv: &crate::game::Move) -> Result<(), PeerUnreachable> {
        self.broadcast(&ToClient::Heap {
            heap: mv.heap,
            count: mv.remaining,
        })
        .await?;
        self.broadcast(&ToClient::Turn { player: mv.turn }).await?;
        if let Some(win) = &mv.winner {
            self.broadcast(&ToClient::Winner { player: win.player })
                .await?;
            self.broadcast(&ToClient::Score {
                player: win.player,
                score: win.score,
            })
            .await?;
        }
        Ok(())
    }
}
