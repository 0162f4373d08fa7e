use std::{fmt::Display, ops::Range};

use bincode::Decode;
use derive_ctor::ctor;
use derive_more::IsVariant;
use getset::CopyGetters;

use crate::err::Error;

pub mod baud;
pub mod err;
pub mod ll;
pub mod nvm;
pub mod patch;

pub type Result<T> = core::result::Result<T, Error>;

pub use baud::BaudRate;
pub use nvm::{NvmTag, TagWalker, patch_nvm};
pub use patch::PatchRecord;

/// Size of the `type_len` word in front of every TLV record
pub const TLV_HEADER_SIZE: usize = 4;

pub trait LLParser: Decode<()> + Sized {
    fn parse(data: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_little_endian()
            .with_fixed_int_encoding();
        bincode::decode_from_slice(data, config)
            .map(|r| r.0)
            .map_err(|e| e.into())
    }
}

/// TLV record type, the low byte of `type_len`
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum RecordType {
    /// Rampatch firmware
    Patch,
    /// NVM configuration
    Nvm,
    /// Reserved value
    Unknown(u8),
}

impl From<u8> for RecordType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Patch,
            2 => Self::Nvm,
            other => Self::Unknown(other),
        }
    }
}

impl From<RecordType> for u8 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::Patch => 1,
            RecordType::Nvm => 2,
            RecordType::Unknown(other) => other,
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Nvm => write!(f, "NVM"),
            Self::Unknown(ty) => write!(f, "unknown ({ty:#x})"),
        }
    }
}

/// Decoded TLV header
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, ctor)]
pub struct TlvHeader {
    /// Record type
    #[getset(get_copy = "pub")]
    ty: RecordType,

    /// Body length in bytes, header excluded
    #[getset(get_copy = "pub")]
    length: u32,
}

impl TlvHeader {
    /// Largest body length the 24-bit field can describe
    pub const MAX_LENGTH: u32 = 0x00ff_ffff;

    /// Split the raw `type_len` word
    #[must_use]
    pub fn from_type_len(type_len: u32) -> Self {
        Self {
            ty: RecordType::from((type_len & 0xff) as u8),
            length: (type_len >> 8) & Self::MAX_LENGTH,
        }
    }

    /// Pack back into the raw `type_len` word
    #[must_use]
    pub fn type_len(&self) -> u32 {
        ((self.length & Self::MAX_LENGTH) << 8) | u32::from(u8::from(self.ty))
    }

    #[must_use]
    pub fn encode(&self) -> [u8; TLV_HEADER_SIZE] {
        self.type_len().to_le_bytes()
    }

    /// Decode the header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < TLV_HEADER_SIZE {
            return Err(Error::TruncatedHeader(data.len()));
        }

        Ok(Self::from_type_len(ll::Header::parse(data)?.type_len))
    }

    /// Header plus body
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.length as usize + TLV_HEADER_SIZE
    }
}

impl Display for TlvHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TLV type: {} ({:#x})", self.ty, u8::from(self.ty))?;
        write!(f, "Length: {} bytes", self.length)
    }
}

/// What [`check_data`] found in the record body
#[derive(Debug, IsVariant)]
pub enum Record {
    /// Rampatch metadata, `None` when the body is too short to hold it
    Patch(Option<PatchRecord>),
    /// Tags walked (and patched) in the NVM body
    Nvm(Vec<NvmTag>),
    /// Reserved record type, left untouched
    Unknown(u8),
}

fn body_range(image: &[u8], header: &TlvHeader) -> Result<Range<usize>> {
    let end = header.total_size();
    if end > image.len() {
        return Err(Error::TruncatedBody {
            declared: header.length() as usize,
            available: image.len().saturating_sub(TLV_HEADER_SIZE),
        });
    }

    Ok(TLV_HEADER_SIZE..end)
}

/// Borrow the body declared by `header`, never past the end of `image`
pub fn body<'a>(image: &'a [u8], header: &TlvHeader) -> Result<&'a [u8]> {
    Ok(&image[body_range(image, header)?])
}

/// Mutable [`body`]
pub fn body_mut<'a>(image: &'a mut [u8], header: &TlvHeader) -> Result<&'a mut [u8]> {
    let range = body_range(image, header)?;
    Ok(&mut image[range])
}

/// Decode one TLV record and patch it in place when it's an NVM record.
///
/// Rampatch records are only dumped to the log. Unknown record types are not an error here,
/// the caller decides which types it accepts.
pub fn check_data(image: &mut [u8], baud_rate: u8) -> Result<(TlvHeader, Record)> {
    let header = TlvHeader::parse(image)?;
    log::debug!(target: "qca", "TLV Type\t\t : {:#x}", u8::from(header.ty()));
    log::debug!(target: "qca", "Length\t\t : {} bytes", header.length());

    let body = body_mut(image, &header)?;
    let record = match header.ty() {
        RecordType::Patch => match PatchRecord::parse(body) {
            Ok(patch) => {
                for line in patch.to_string().lines() {
                    log::debug!(target: "qca", "{line}");
                }
                Record::Patch(Some(patch))
            }
            Err(e) => {
                log::warn!(target: "qca", "Rampatch metadata unavailable: {e}");
                Record::Patch(None)
            }
        },
        RecordType::Nvm => Record::Nvm(patch_nvm(body, baud_rate)?),
        RecordType::Unknown(ty) => {
            log::error!(target: "qca", "Unknown TLV type {ty}");
            Record::Unknown(ty)
        }
    };

    Ok((header, record))
}
