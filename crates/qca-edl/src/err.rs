use std::time::Duration;

use derive_more::IsVariant;
use thiserror::Error as TError;

/// Failure of the underlying command/response primitive
#[derive(Debug, TError, IsVariant)]
pub enum TransportError {
    /// No completing event within the timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other transport failure
    #[error("{0}")]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a segment response was refused
#[derive(Debug, TError, IsVariant)]
pub enum SegmentFault {
    #[error("response size {actual}, expected {expected}")]
    Size { expected: usize, actual: usize },
    #[error("wrong packet, cresp {cresp:#x} rtype {rtype:#x}")]
    Event { cresp: u8, rtype: u8 },
    #[error("error status {0:#x}")]
    Status(u8),
}

#[derive(Debug, TError, IsVariant)]
pub enum Error {
    /// The command/response exchange itself failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response has the wrong length
    #[error("{what} size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The response carries the wrong command class or response type
    #[error("Wrong packet received: cresp {cresp:#x}, rtype {rtype:#x}")]
    UnexpectedEvent { cresp: u8, rtype: u8 },
    /// A standard command completed with a non-zero status
    #[error("Command {opcode:#06x} failed with status {status:#x}")]
    CommandStatus { opcode: u16, status: u8 },

    /// The controller reported a zero SoC version
    #[error("Invalid SoC version")]
    InvalidVersion,

    /// The controller refused a firmware segment
    #[error("Segment #{index} rejected: {fault}")]
    SegmentRejected { index: usize, fault: SegmentFault },

    /// Caller passed an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Bluetooth address string can't be parsed
    #[error("Invalid Bluetooth address: {0}")]
    InvalidBdAddr(String),

    /// bincode crate error
    #[error("Bincode decode error: {0}")]
    Bincode(#[from] bincode::error::DecodeError),
}
