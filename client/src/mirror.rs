//! Non-authoritative replica of the server-held state. Purely reactive:
//! nothing here changes until the server says so — a removal request does
//! not touch the displayed heaps until the authoritative echo arrives.

use crate::view::View;
use nim::{wire::ToClient, PlayerId};
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    Continue,
    /// The server terminated the session.
    Terminated,
}

pub struct Mirror<V> {
    my_id: Option<PlayerId>,
    players: HashMap<PlayerId, String>,
    /// Set by a winner report, consumed by the next turn report: that turn
    /// opens a fresh game, so the view resets before it re-enables input.
    new_game_pending: bool,
    view: V,
}

impl<V: View> Mirror<V> {
    pub fn new(view: V) -> Self {
        Self {
            my_id: None,
            players: HashMap::new(),
            new_game_pending: false,
            view,
        }
    }

    pub fn apply(&mut self, message: ToClient) -> Applied {
        match message {
            ToClient::Id { player } => {
                self.my_id = Some(player);
                self.view.id_assigned(player);
            }
            ToClient::Name { player, name } => {
                self.players.insert(player, name.clone());
                self.view.name_announced(player, &name);
                // Player 1's name only ever arrives once both seats are
                // filled.
                if player == 1 {
                    self.view.match_started();
                }
            }
            ToClient::Score { player, score } => {
                let name = self.name_of(player);
                self.view
                    .score_updated(player, &name, score, self.is_me(player));
            }
            ToClient::Heap { heap, count } => {
                self.new_game_pending = false;
                self.view.heap_updated(heap, count);
            }
            ToClient::Turn { player } => {
                if self.new_game_pending {
                    self.new_game_pending = false;
                    self.view.game_reset();
                }
                self.view.turn_changed(player, self.is_me(player));
            }
            ToClient::Winner { player } => {
                self.new_game_pending = true;
                let name = self.name_of(player);
                self.view.winner_announced(player, &name);
            }
            ToClient::Quit => {
                self.view.session_terminated();
                return Applied::Terminated;
            }
        }
        Applied::Continue
    }

    fn is_me(&self, player: PlayerId) -> bool {
        self.my_id == Some(player)
    }

    fn name_of(&self, player: PlayerId) -> String {
        self.players
            .get(&player)
            .cloned()
            .unwrap_or_else(|| format!("player {}", player))
    }
}
