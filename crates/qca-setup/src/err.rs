use derive_more::IsVariant;
use qca_tlv::RecordType;
use thiserror::Error as TError;

use crate::setup::Stage;

/// Firmware image structure doesn't match its TLV header
#[derive(Debug, TError, IsVariant)]
pub enum Malformed {
    #[error("{0} bytes can't hold the TLV header")]
    TooSmall(usize),
    #[error("header declares {declared} body bytes, image has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("requested as {expected}, header says {found}")]
    TypeMismatch {
        expected: RecordType,
        found: RecordType,
    },
}

#[derive(Debug, TError, IsVariant)]
pub enum Error {
    /// The loader has no image under this name
    #[error("Firmware file not found: {0}")]
    ImageNotFound(String),
    /// Empty image, unsupported record type or unusable file name
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The image exceeds the size allowed for its record type
    #[error("{ty} file of {size} bytes exceeds {max} bytes")]
    ImageTooLarge {
        ty: RecordType,
        size: usize,
        max: usize,
    },
    /// The image doesn't match its TLV header
    #[error("Malformed image: {0}")]
    MalformedImage(#[from] Malformed),

    /// A setup stage failed, the sequence stopped there
    #[error("{stage} failed: {source}")]
    Stage { stage: Stage, source: Box<Error> },

    /// qca-tlv error
    #[error("TLV error: {0}")]
    Tlv(#[from] qca_tlv::err::Error),

    /// qca-edl error
    #[error("EDL error: {0}")]
    Edl(#[from] qca_edl::err::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stage the setup stopped at
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The error behind any stage wrapping
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}
