//! Presentation layer. The mirror drives a [`View`] through the game event
//! vocabulary; [`TerminalView`] renders it to the terminal.

use console::style;
use nim::{PlayerId, INITIAL_HEAPS, NUM_HEAPS};

/// Everything the state mirror can tell the presentation layer.
pub trait View {
    fn id_assigned(&mut self, player: PlayerId);
    fn name_announced(&mut self, player: PlayerId, name: &str);
    /// Both seats are filled; the game is about to start.
    fn match_started(&mut self);
    fn score_updated(&mut self, player: PlayerId, name: &str, score: u8, is_me: bool);
    /// `count` is the heap's new remaining count, not a delta.
    fn heap_updated(&mut self, heap: u8, count: u8);
    fn turn_changed(&mut self, player: PlayerId, is_me: bool);
    /// Clear the winner banner and restore the initial heaps.
    fn game_reset(&mut self);
    fn winner_announced(&mut self, player: PlayerId, name: &str);
    fn session_terminated(&mut self);
}

pub struct TerminalView {
    term: console::Term,
    heaps: [u8; NUM_HEAPS],
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            term: console::Term::stdout(),
            heaps: INITIAL_HEAPS,
        }
    }

    fn line(&self, text: String) {
        // A failed write to the terminal is not worth tearing the game down.
        self.term.write_line(&text).ok();
    }

    fn draw_heaps(&self) {
        let drawn = self
            .heaps
            .iter()
            .enumerate()
            .map(|(i, &count)| format!("heap {}: {}", i, "o".repeat(count as usize)))
            .collect::<Vec<_>>()
            .join("   ");
        self.line(drawn);
    }
}

impl View for TerminalView {
    fn id_assigned(&mut self, player: PlayerId) {
        self.line(format!("Joined as player {}", player));
    }

    fn name_announced(&mut self, player: PlayerId, name: &str) {
        self.line(format!("Player {} is {}", player, name));
    }

    fn match_started(&mut self) {
        self.line(format!("{}", style("Both players seated, game on").green()));
        self.draw_heaps();
    }

    fn score_updated(&mut self, _player: PlayerId, name: &str, score: u8, is_me: bool) {
        let who = if is_me { "You" } else { name };
        self.line(format!("{} now at {} win(s)", who, score));
    }

    fn heap_updated(&mut self, heap: u8, count: u8) {
        if let Some(slot) = self.heaps.get_mut(heap as usize) {
            *slot = count;
        }
        self.draw_heaps();
    }

    fn turn_changed(&mut self, player: PlayerId, is_me: bool) {
        if is_me {
            self.line(format!(
                "{}",
                style("Your turn: take <heap> <count>").cyan()
            ));
        } else {
            self.line(format!("Waiting for player {}...", player));
        }
    }

    fn game_reset(&mut self) {
        self.heaps = INITIAL_HEAPS;
        self.line(format!("{}", style("New game").green()));
        self.draw_heaps();
    }

    fn winner_announced(&mut self, _player: PlayerId, name: &str) {
        self.line(format!(
            "{} (type `new` for a rematch)",
            style(format!("{} wins!", name)).yellow()
        ));
    }

    fn session_terminated(&mut self) {
        self.line("Session ended".to_string());
    }
}
