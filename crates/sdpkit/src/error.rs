//! Error types for the sdpkit library
//!
//! This module defines the error type shared by the data element codec,
//! the service record model, the SDP PDU framing and the spool walker.

use crate::sdp::constants::SdpErrorCode;
use thiserror::Error;

/// Errors that can occur while decoding or encoding SDP data and spool records
#[derive(Error, Debug)]
pub enum Error {
    #[error("Buffer truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid size index {size} for data element type {element_type}")]
    InvalidSize { element_type: u8, size: u8 },

    #[error("Reserved data element type {0}")]
    ReservedType(u8),

    #[error("Sequence children overrun declared length of {declared} bytes")]
    SequenceOverrun { declared: usize },

    #[error("Declared element length {length} exceeds limit of {limit} bytes")]
    LengthTooLarge { length: usize, limit: usize },

    #[error("Data element nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("Value does not fit the requested encoding: {0}")]
    ValueOutOfRange(String),

    #[error("Bad value for attribute 0x{id:04X}")]
    BadValue {
        id: u16,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("Invalid SDP packet: {0}")]
    InvalidPacket(String),

    #[error("SDP error response: {0:?}")]
    Protocol(SdpErrorCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if this error was produced by malformed input bytes
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Truncated { .. }
                | Error::InvalidSize { .. }
                | Error::ReservedType(_)
                | Error::SequenceOverrun { .. }
                | Error::LengthTooLarge { .. }
                | Error::NestingTooDeep(_)
                | Error::InvalidPacket(_)
        )
    }
}
