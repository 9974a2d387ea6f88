/// NMEA 0183 to autopilot translation library.
///
/// A GPS receiver's sentences are parsed by [`protocol::nmea`], the fields this bridge cares about
/// are pulled out by [`extract`] and merged into a [`nav::NavigationState`]. Each course sentence
/// (RMC) triggers one outbound frame in the autopilot's own format, produced by an implementation
/// of [`protocol::AutopilotMsg`]. [`bridge`] drives the whole thing over a [`transport::Transport`].
use std::sync::Once;

use thiserror::Error;

use crate::extract::SentenceKind;

pub mod bridge;
pub mod config;
pub mod extract;
pub mod nav;
pub mod protocol;
pub mod transport;

/// Result type for this library
pub type BridgeResult<T> = std::result::Result<T, Error>;

/// Error type for this library
#[derive(Debug, Error)]
pub enum Error {
    #[error("Serial port open failed: {0}")]
    PortOpen(#[from] serialport::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Checksum mismatch: sentence says {expected:02X}, computed {computed:02X}")]
    Checksum { expected: u8, computed: u8 },
    #[error("{0:?} sentence without checksum")]
    MissingChecksum(SentenceKind),
    #[error("Line is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
    #[error("Character {0:?} cannot be encoded in a single byte")]
    Encoding(char),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for malformed sentences, which are routine on a noisy serial line.
    pub fn is_sentence_failure(&self) -> bool {
        matches!(
            self,
            Error::ParseError(_) | Error::Checksum { .. } | Error::MissingChecksum(_)
        )
    }
}

impl From<nom::error::Error<&str>> for Error {
    fn from(err: nom::error::Error<&str>) -> Self {
        Error::ParseError(format!("{:?} at {:?}", err.code, err.input))
    }
}

/// Test binary helper to init tracing. This is usually the responsibility of the consumer of the
/// library crate.
pub fn lazy_init_tracing() {
    {
        static INIT: Once = Once::new();
        &INIT
    }
    .call_once(|| {
        tracing_subscriber::fmt::init();
    });
}
