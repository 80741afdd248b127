//! Binary wire codec. One message per datagram: a single opcode byte
//! followed by unsigned-byte fields; player names are u16 big-endian
//! length-prefixed UTF-8.
//!
//! The two directions use separate vocabularies because several opcode
//! bytes mean different things depending on who sent them ('T' is a
//! marker-removal request from a client but a turn report from the
//! server).

use crate::{PlayerId, MAX_DATAGRAM_LEN};
use bytes::{Buf, BufMut};

/// Longest name that still fits a `Name` datagram under
/// [`MAX_DATAGRAM_LEN`]: opcode + player id + 2-byte length prefix.
pub const MAX_NAME_LEN: usize = MAX_DATAGRAM_LEN - 4;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("datagram truncated")]
    Truncated,

    #[error("name is not valid UTF-8: {0}")]
    Name(#[from] std::string::FromUtf8Error),
}

/// Intents sent from a client to the server.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ToServer {
    /// Request to join a session.
    Join { name: String },
    /// Request to remove `count` markers from heap `heap`.
    Take { heap: u8, count: u8 },
    /// Request a new game after a win.
    NewGame,
    /// Terminate the session.
    Quit,
}

/// Notifications sent from the server to a client.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ToClient {
    /// Assign the receiver its player id.
    Id { player: PlayerId },
    /// Announce a seated player's name.
    Name { player: PlayerId, name: String },
    /// Report a player's updated cumulative score.
    Score { player: PlayerId, score: u8 },
    /// Report the new remaining count of one heap.
    Heap { heap: u8, count: u8 },
    /// Report whose turn it is.
    Turn { player: PlayerId },
    /// Announce the winner of the current game.
    Winner { player: PlayerId },
    /// The session has been terminated.
    Quit,
}

fn get_u8(bytes: &mut impl Buf) -> Result<u8, DecodeError> {
    if bytes.remaining() < 1 {
        return Err(DecodeError::Truncated);
    }
    Ok(bytes.get_u8())
}

fn get_name(bytes: &mut impl Buf) -> Result<String, DecodeError> {
    if bytes.remaining() < 2 {
        return Err(DecodeError::Truncated);
    }
    let len = bytes.get_u16() as usize;
    if bytes.remaining() < len {
        return Err(DecodeError::Truncated);
    }
    let raw = bytes.copy_to_bytes(len);
    Ok(String::from_utf8(raw.to_vec())?)
}

fn put_name(buf: &mut impl BufMut, name: &str) {
    // Oversized names are a bug in the caller, not a runtime condition.
    assert!(
        name.len() <= MAX_NAME_LEN,
        "player name exceeds {} bytes",
        MAX_NAME_LEN
    );
    buf.put_u16(name.len() as u16);
    buf.put_slice(name.as_bytes());
}

impl ToServer {
    pub fn deserialize(mut bytes: impl Buf) -> Result<Self, DecodeError> {
        let message = match get_u8(&mut bytes)? {
            b'J' => Self::Join {
                name: get_name(&mut bytes)?,
            },
            b'T' => Self::Take {
                heap: get_u8(&mut bytes)?,
                count: get_u8(&mut bytes)?,
            },
            b'N' => Self::NewGame,
            b'Q' => Self::Quit,
            opcode => return Err(DecodeError::UnknownOpcode(opcode)),
        };
        Ok(message)
    }

    pub fn serialize(&self, mut buf: impl BufMut) {
        match self {
            Self::Join { name } => {
                buf.put_u8(b'J');
                put_name(&mut buf, name);
            }
            Self::Take { heap, count } => {
                buf.put_u8(b'T');
                buf.put_u8(*heap);
                buf.put_u8(*count);
            }
            Self::NewGame => buf.put_u8(b'N'),
            Self::Quit => buf.put_u8(b'Q'),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MAX_DATAGRAM_LEN);
        self.serialize(&mut buf);
        buf
    }
}

impl ToClient {
    pub fn deserialize(mut bytes: impl Buf) -> Result<Self, DecodeError> {
        let message = match get_u8(&mut bytes)? {
            b'I' => Self::Id {
                player: get_u8(&mut bytes)?,
            },
            b'N' => Self::Name {
                player: get_u8(&mut bytes)?,
                name: get_name(&mut bytes)?,
            },
            b'S' => Self::Score {
                player: get_u8(&mut bytes)?,
                score: get_u8(&mut bytes)?,
            },
            b'H' => Self::Heap {
                heap: get_u8(&mut bytes)?,
                count: get_u8(&mut bytes)?,
            },
            b'T' => Self::Turn {
                player: get_u8(&mut bytes)?,
            },
            b'W' => Self::Winner {
                player: get_u8(&mut bytes)?,
            },
            b'Q' => Self::Quit,
            opcode => return Err(DecodeError::UnknownOpcode(opcode)),
        };
        Ok(message)
    }

    pub fn serialize(&self, mut buf: impl BufMut) {
        match self {
            Self::Id { player } => {
                buf.put_u8(b'I');
                buf.put_u8(*player);
            }
            Self::Name { player, name } => {
                buf.put_u8(b'N');
                buf.put_u8(*player);
                put_name(&mut buf, name);
            }
            Self::Score { player, score } => {
                buf.put_u8(b'S');
                buf.put_u8(*player);
                buf.put_u8(*score);
            }
            Self::Heap { heap, count } => {
                buf.put_u8(b'H');
                buf.put_u8(*heap);
                buf.put_u8(*count);
            }
            Self::Turn { player } => {
                buf.put_u8(b'T');
                buf.put_u8(*player);
            }
            Self::Winner { player } => {
                buf.put_u8(b'W');
                buf.put_u8(*player);
            }
            Self::Quit => buf.put_u8(b'Q'),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MAX_DATAGRAM_LEN);
        self.serialize(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_to_server(message: ToServer) {
        let buffer = message.to_vec();
        assert!(buffer.len() <= MAX_DATAGRAM_LEN);
        assert_eq!(ToServer::deserialize(buffer.as_slice()).unwrap(), message);
    }

    fn roundtrip_to_client(message: ToClient) {
        let buffer = message.to_vec();
        assert!(buffer.len() <= MAX_DATAGRAM_LEN);
        assert_eq!(ToClient::deserialize(buffer.as_slice()).unwrap(), message);
    }

    mod join {
        use super::*;

        #[test]
        fn ser() {
            let buffer = ToServer::Join {
                name: "Ab".to_string(),
            }
            .to_vec();
            assert_eq!(buffer, [b'J', 0x00, 0x02, b'A', b'b']);
        }

        #[test]
        fn de() {
            const BYTES: &[u8] = &[b'J', 0x00, 0x03, b'B', b'o', b'b'];
            assert_eq!(
                ToServer::deserialize(BYTES).unwrap(),
                ToServer::Join {
                    name: "Bob".to_string()
                }
            );
        }

        #[test]
        fn empty_name() {
            roundtrip_to_server(ToServer::Join {
                name: String::new(),
            });
        }

        #[test]
        fn max_length_name() {
            roundtrip_to_server(ToServer::Join {
                name: "x".repeat(MAX_NAME_LEN),
            });
        }

        #[test]
        #[should_panic]
        fn oversized_name_panics() {
            ToServer::Join {
                name: "x".repeat(MAX_NAME_LEN + 1),
            }
            .to_vec();
        }
    }

    mod take {
        use super::*;

        #[test]
        fn ser() {
            let buffer = ToServer::Take { heap: 2, count: 5 }.to_vec();
            assert_eq!(buffer, [b'T', 0x02, 0x05]);
        }

        #[test]
        fn boundary_values() {
            roundtrip_to_server(ToServer::Take { heap: 0, count: 0 });
            roundtrip_to_server(ToServer::Take {
                heap: 255,
                count: 255,
            });
        }
    }

    #[test]
    fn bare_intents() {
        assert_eq!(ToServer::NewGame.to_vec(), [b'N']);
        assert_eq!(ToServer::Quit.to_vec(), [b'Q']);
        roundtrip_to_server(ToServer::NewGame);
        roundtrip_to_server(ToServer::Quit);
    }

    #[test]
    fn notifications_roundtrip() {
        roundtrip_to_client(ToClient::Id { player: 0 });
        roundtrip_to_client(ToClient::Id { player: 255 });
        roundtrip_to_client(ToClient::Name {
            player: 1,
            name: "Alice".to_string(),
        });
        roundtrip_to_client(ToClient::Name {
            player: 0,
            name: String::new(),
        });
        roundtrip_to_client(ToClient::Name {
            player: 255,
            name: "y".repeat(MAX_NAME_LEN),
        });
        roundtrip_to_client(ToClient::Score {
            player: 1,
            score: 255,
        });
        roundtrip_to_client(ToClient::Heap { heap: 2, count: 0 });
        roundtrip_to_client(ToClient::Turn { player: 0 });
        roundtrip_to_client(ToClient::Winner { player: 1 });
        roundtrip_to_client(ToClient::Quit);
    }

    #[test]
    fn turn_report_layout() {
        assert_eq!(ToClient::Turn { player: 1 }.to_vec(), [b'T', 0x01]);
    }

    #[test]
    fn unknown_opcode() {
        assert!(matches!(
            ToServer::deserialize(&[0x7f][..]),
            Err(DecodeError::UnknownOpcode(0x7f))
        ));
        assert!(matches!(
            ToClient::deserialize(&[b'J'][..]),
            Err(DecodeError::UnknownOpcode(_))
        ));
    }

    #[test]
    fn truncated() {
        assert!(matches!(
            ToServer::deserialize(&[][..]),
            Err(DecodeError::Truncated)
        ));
        assert!(matches!(
            ToServer::deserialize(&[b'T', 0x01][..]),
            Err(DecodeError::Truncated)
        ));
        // Length prefix promises more bytes than the datagram holds.
        assert!(matches!(
            ToServer::deserialize(&[b'J', 0x00, 0x05, b'a'][..]),
            Err(DecodeError::Truncated)
        ));
        assert!(matches!(
            ToClient::deserialize(&[b'N', 0x00][..]),
            Err(DecodeError::Truncated)
        ));
    }

    #[test]
    fn invalid_utf8_name() {
        assert!(matches!(
            ToServer::deserialize(&[b'J', 0x00, 0x02, 0xff, 0xfe][..]),
            Err(DecodeError::Name(_))
        ));
    }
}
