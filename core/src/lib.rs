pub mod wire;

/// Seat index within a session, always 0 or 1.
pub type PlayerId = u8;

pub const NUM_HEAPS: usize = 3;

/// Heap contents at the start of every game.
pub const INITIAL_HEAPS: [u8; NUM_HEAPS] = [3, 4, 5];

/// Every protocol message fits in a single datagram of this size.
pub const MAX_DATAGRAM_LEN: usize = 128;
