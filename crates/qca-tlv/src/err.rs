use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    /// The buffer can't even hold the 4-byte TLV header
    #[error("TLV header needs 4 bytes, got {0}")]
    TruncatedHeader(usize),

    /// The header declares more body bytes than the buffer holds
    #[error("TLV body declares {declared} bytes, only {available} available")]
    TruncatedBody { declared: usize, available: usize },

    /// An NVM tag entry doesn't fit inside the declared body
    #[error("Malformed NVM tag at offset {offset} (id {tag_id:?}): needs {needed} bytes, {available} left")]
    MalformedNvmTag {
        offset: usize,
        tag_id: Option<u16>,
        needed: usize,
        available: usize,
    },

    /// bincode crate error
    #[error("Bincode decode error: {0}")]
    Bincode(#[from] bincode::error::DecodeError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error("{0}")]
    Custom(#[from] Box<dyn std::error::Error>),
}
