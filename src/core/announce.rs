//! The domain announce record: what the tracker keeps from a single client
//! announce, after parsing and before persistence.
use std::fmt;
use std::net::Ipv4Addr;

use crate::core::auth::Key;
use crate::shared::bit_torrent::info_hash::InfoHash;

/// The number of bytes `downloaded`, `uploaded` or `left` reported by a
/// client.
pub type NumberOfBytes = i64;

/// The event that the peer is reporting: `started`, `completed` or `stopped`.
///
/// If the event is not present, empty or unknown, the peer is just updating
/// its status on the regular announce interval.
///
/// The enum carries the stable integer representation used by the `event`
/// column: none=0, started=1, stopped=2, completed=3.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum Event {
    #[default]
    None = 0,
    /// Event sent when a download first begins.
    Started = 1,
    /// Event sent when the downloader ceases downloading.
    Stopped = 2,
    /// Event sent when the download is complete.
    /// No `completed` is sent if the file was complete when started.
    Completed = 3,
}

impl Event {
    /// Maps the raw `event` query param. Anything unrecognized counts as a
    /// plain interval announce.
    #[must_use]
    pub fn from_param(raw_param: &str) -> Self {
        match raw_param {
            "started" => Self::Started,
            "stopped" => Self::Stopped,
            "completed" => Self::Completed,
            _ => Self::None,
        }
    }

    /// The integer stored in the `event` column.
    #[must_use]
    pub fn column_value(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::None => write!(f, "none"),
            Event::Started => write!(f, "started"),
            Event::Stopped => write!(f, "stopped"),
            Event::Completed => write!(f, "completed"),
        }
    }
}

/// A peer endpoint in the BEP 23 compact format: 4 bytes of big-endian IPv4
/// followed by 2 bytes of big-endian port.
///
/// The IP comes from the connection's peer address; the port comes from the
/// announce query, because clients behind NAT announce a forwarded port.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Endpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    #[must_use]
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// The 6-byte compact representation stored in the `ip_port` column and
    /// concatenated into the `peers` reply value.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 6] {
        let mut bytes = [0u8; 6];
        bytes[..4].copy_from_slice(&self.ip.octets());
        bytes[4..].copy_from_slice(&self.port.to_be_bytes());
        bytes
    }

    /// The reverse of [`Endpoint::to_bytes`].
    #[must_use]
    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self {
            ip: Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]),
            port: u16::from_be_bytes([bytes[4], bytes[5]]),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// A fully parsed announce, ready for admission, selection and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Announce {
    /// The key taken from the URL path, attributing this announce.
    pub key: Key,
    pub info_hash: InfoHash,
    /// The compact endpoint other peers should contact.
    pub endpoint: Endpoint,
    /// How many peers the client wants, already defaulted and ranged.
    pub numwant: usize,
    pub amount_left: NumberOfBytes,
    /// Bytes downloaded as reported by the client for this session.
    pub downloaded: NumberOfBytes,
    /// Bytes uploaded as reported by the client for this session.
    pub uploaded: NumberOfBytes,
    pub event: Event,
}
