//! Authoritative per-session game state. Clients only ever send intents;
//! every heap, turn, and score mutation happens here.

use nim::{PlayerId, INITIAL_HEAPS, NUM_HEAPS};

/// Outcome of a valid marker removal, in notification order: the new heap
/// count first, then the turn, then (on the winning move) the winner and
/// their updated score.
#[derive(Debug, PartialEq, Eq)]
pub struct Move {
    pub heap: u8,
    pub remaining: u8,
    pub turn: PlayerId,
    pub winner: Option<Win>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Win {
    pub player: PlayerId,
    pub score: u8,
}

#[derive(Debug)]
pub struct GameState {
    heaps: [u8; NUM_HEAPS],
    scores: [u8; 2],
    turn: PlayerId,
    over: bool,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            heaps: INITIAL_HEAPS,
            scores: [0, 0],
            turn: 0,
            over: false,
        }
    }

    /// Apply a marker-removal request from `player`. Returns `None` when the
    /// request is out of turn or the move is invalid; the caller sends no
    /// rejection, it simply drops the request.
    pub fn take(&mut self, player: PlayerId, heap: u8, count: u8) -> Option<Move> {
        if self.over || player != self.turn {
            return None;
        }
        let markers = *self.heaps.get(heap as usize)?;
        if count == 0 || count > markers {
            return None;
        }

        self.heaps[heap as usize] = markers - count;
        self.turn = 1 - self.turn;

        // The mover took the last marker: the turn already flipped, so the
        // winner is the player who does NOT hold the new turn.
        let winner = if self.heaps.iter().all(|&h| h == 0) {
            self.over = true;
            let player = 1 - self.turn;
            self.scores[player as usize] += 1;
            Some(Win {
                player,
                score: self.scores[player as usize],
            })
        } else {
            None
        };

        Some(Move {
            heap,
            remaining: markers - count,
            turn: self.turn,
            winner,
        })
    }

    /// Restore the heaps and hand the turn back to player 0. Scores persist
    /// across games.
    pub fn reset(&mut self) -> PlayerId {
        self.heaps = INITIAL_HEAPS;
        self.turn = 0;
        self.over = false;
        self.turn
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    #[cfg(test)]
    fn heap_sum(&self) -> u32 {
        self.heaps.iter().map(|&h| u32::from(h)).sum()
    }
}
