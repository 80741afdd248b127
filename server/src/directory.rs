//! The session directory: demultiplexes inbound datagrams by peer address
//! into per-session state machines, pairs unmatched players FIFO, and tears
//! sessions down on quit or peer failure.

use crate::session::{Endpoint, Session};
use dashmap::DashMap;
use nim::wire::{ToClient, ToServer};
use nim::PlayerId;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

type Shared = Arc<Mutex<Session>>;

pub struct Directory {
    socket: Arc<UdpSocket>,
    /// Dispatch table: every seated peer address points at its session.
    by_addr: DashMap<SocketAddr, Shared>,
    /// All live sessions in creation order; the pairing scan walks this
    /// front to back.
    sessions: Mutex<Vec<Shared>>,
}

enum After {
    Nothing,
    Teardown(PlayerId),
}

impl Directory {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self {
            socket,
            by_addr: DashMap::new(),
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Entry point for every inbound datagram.
    #[tracing::instrument(skip(self, bytes))]
    pub async fn handle_datagram(&self, from: SocketAddr, bytes: &[u8]) {
        let message = match ToServer::deserialize(bytes) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(%from, "discarding malformed datagram: {}", err);
                return;
            }
        };
        tracing::debug!(%from, "received {:?}", message);

        // Clone out of the map so no shard guard is held across an await.
        let known = self.by_addr.get(&from).map(|entry| entry.value().clone());
        match known {
            Some(session) => self.handle_seated(&session, from, message).await,
            None => match message {
                ToServer::Join { name } => self.join(from, name).await,
                other => {
                    tracing::warn!(%from, "first message from unknown peer was {:?}, discarding", other);
                }
            },
        }
    }

    /// Seat a joining player: the first session waiting for a second player
    /// takes them (FIFO, no other tie-break), otherwise a fresh session is
    /// created with them as player 0.
    async fn join(&self, from: SocketAddr, name: String) {
        let endpoint = Endpoint::new(self.socket.clone(), from, name);
        let (session, player) = {
            let mut sessions = self.sessions.lock().await;
            let mut waiting = None;
            for candidate in sessions.iter() {
                if candidate.lock().await.is_waiting() {
                    waiting = Some(candidate.clone());
                    break;
                }
            }
            match waiting {
                Some(candidate) => {
                    let mut guard = candidate.lock().await;
                    let player = match guard.seat(endpoint) {
                        Some(player) => player,
                        None => return,
                    };
                    tracing::info!(id = %guard.id, %from, player, "paired into waiting session");
                    drop(guard);
                    (candidate, player)
                }
                None => {
                    let mut session = Session::new();
                    let player = match session.seat(endpoint) {
                        Some(player) => player,
                        None => return,
                    };
                    tracing::info!(id = %session.id, %from, player, "created new session");
                    let shared = Arc::new(Mutex::new(session));
                    sessions.push(shared.clone());
                    (shared, player)
                }
            }
        };
        self.by_addr.insert(from, session.clone());

        let handshake = {
            let guard = session.lock().await;
            guard.welcome(player).await
        };
        if let Err(err) = handshake {
            tracing::warn!("handshake failed: {}", err);
            self.teardown(&session, err.player).await;
        }
    }

    async fn handle_seated(&self, session: &Shared, from: SocketAddr, message: ToServer) {
        let after = {
            let mut guard = session.lock().await;
            let player = match guard.player_at(from) {
                Some(player) => player,
                None => return,
            };
            match message {
                ToServer::Join { .. } => {
                    tracing::debug!(%from, "repeat join from seated peer, ignoring");
                    After::Nothing
                }
                ToServer::Take { heap, count } => match guard.game.take(player, heap, count) {
                    Some(mv) => match guard.announce(&mv).await {
                        Ok(()) => After::Nothing,
                        Err(err) => {
                            tracing::warn!("{}", err);
                            After::Teardown(err.player)
                        }
                    },
                    None => {
                        tracing::debug!(%from, player, heap, count, "out-of-turn or invalid move, ignoring");
                        After::Nothing
                    }
                },
                ToServer::NewGame => {
                    let turn = guard.game.reset();
                    tracing::info!(id = %guard.id, "new game");
                    match guard.broadcast(&ToClient::Turn { player: turn }).await {
                        Ok(()) => After::Nothing,
                        Err(err) => {
                            tracing::warn!("{}", err);
                            After::Teardown(err.player)
                        }
                    }
                }
                ToServer::Quit => After::Teardown(player),
            }
        };
        if let After::Teardown(leaver) = after {
            self.teardown(session, leaver).await;
        }
    }

    /// Remove a session from the directory, notifying the remaining seat.
    /// The remaining player is unpaired, not rematched; rejoining produces a
    /// fresh session.
    async fn teardown(&self, session: &Shared, leaver: PlayerId) {
        {
            let guard = session.lock().await;
            for addr in guard.addresses() {
                self.by_addr.remove(&addr);
            }
            let other = 1 - leaver;
            if let Err(err) = guard.notify(other, &ToClient::Quit).await {
                tracing::debug!("could not deliver quit: {}", err);
            }
            tracing::info!(id = %guard.id, leaver, "session closed");
        }
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|other| !Arc::ptr_eq(other, session));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn directory() -> Directory {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Directory::new(Arc::new(socket))
    }

    /// A bound socket standing in for a client; keeps the address valid as a
    /// send target.
    async fn peer() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    fn join(name: &str) -> Vec<u8> {
        ToServer::Join {
            name: name.to_string(),
        }
        .to_vec()
    }

    #[tokio::test]
    async fn first_join_creates_a_waiting_session() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        directory.handle_datagram(addr_a, &join("Alice")).await;

        let sessions = directory.sessions.lock().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].lock().await.is_waiting());
        assert!(directory.by_addr.contains_key(&addr_a));
    }

    #[tokio::test]
    async fn second_join_fills_the_waiting_session() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        let (_b, addr_b) = peer().await;
        directory.handle_datagram(addr_a, &join("Alice")).await;
        directory.handle_datagram(addr_b, &join("Bob")).await;

        let sessions = directory.sessions.lock().await;
        assert_eq!(sessions.len(), 1);
        let guard = sessions[0].lock().await;
        assert_eq!(guard.player_count(), 2);
        assert_eq!(guard.player_at(addr_a), Some(0));
        assert_eq!(guard.player_at(addr_b), Some(1));
    }

    #[tokio::test]
    async fn third_join_opens_a_new_session() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        let (_b, addr_b) = peer().await;
        let (_c, addr_c) = peer().await;
        directory.handle_datagram(addr_a, &join("Alice")).await;
        directory.handle_datagram(addr_b, &join("Bob")).await;
        directory.handle_datagram(addr_c, &join("Carol")).await;

        let sessions = directory.sessions.lock().await;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].lock().await.player_count(), 2);
        assert!(sessions[1].lock().await.is_waiting());
    }

    #[tokio::test]
    async fn pairing_is_fifo_across_waiting_sessions() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        let (_b, addr_b) = peer().await;

        // Seed two waiting sessions directly, in order.
        let first = Arc::new(Mutex::new(Session::new()));
        let second = Arc::new(Mutex::new(Session::new()));
        first
            .lock()
            .await
            .seat(Endpoint::new(directory.socket.clone(), addr_a, "A".into()))
            .unwrap();
        second
            .lock()
            .await
            .seat(Endpoint::new(directory.socket.clone(), addr_b, "B".into()))
            .unwrap();
        directory.by_addr.insert(addr_a, first.clone());
        directory.by_addr.insert(addr_b, second.clone());
        {
            let mut sessions = directory.sessions.lock().await;
            sessions.push(first.clone());
            sessions.push(second.clone());
        }

        let (_c, addr_c) = peer().await;
        directory.handle_datagram(addr_c, &join("Carol")).await;

        assert_eq!(first.lock().await.player_count(), 2);
        assert_eq!(first.lock().await.player_at(addr_c), Some(1));
        assert!(second.lock().await.is_waiting());
    }

    #[tokio::test]
    async fn non_join_from_unknown_peer_is_discarded() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        directory
            .handle_datagram(addr_a, &ToServer::Take { heap: 0, count: 1 }.to_vec())
            .await;

        assert!(directory.sessions.lock().await.is_empty());
        assert!(!directory.by_addr.contains_key(&addr_a));
    }

    #[tokio::test]
    async fn repeat_join_does_not_reseat() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        directory.handle_datagram(addr_a, &join("Alice")).await;
        directory.handle_datagram(addr_a, &join("Alice")).await;

        let sessions = directory.sessions.lock().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].lock().await.player_count(), 1);
    }

    #[tokio::test]
    async fn quit_removes_the_session() {
        let directory = directory().await;
        let (_a, addr_a) = peer().await;
        let (_b, addr_b) = peer().await;
        directory.handle_datagram(addr_a, &join("Alice")).await;
        directory.handle_datagram(addr_b, &join("Bob")).await;
        directory
            .handle_datagram(addr_a, &ToServer::Quit.to_vec())
            .await;

        assert!(directory.sessions.lock().await.is_empty());
        assert!(!directory.by_addr.contains_key(&addr_a));
        assert!(!directory.by_addr.contains_key(&addr_b));
    }
}
