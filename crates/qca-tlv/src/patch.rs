//! Rampatch record metadata
//!
//! Read-only: the rampatch body is transferred as is.
use std::fmt::Display;

use getset::CopyGetters;

use crate::{LLParser, Result, ll};

/// Metadata block at the start of a rampatch body
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct PatchRecord {
    total_size: u32,
    data_length: u32,
    /// Signing format version
    format_version: u8,
    /// Signature algorithm
    signature: u8,
    reserved1: u16,
    product_id: u16,
    rom_build: u16,
    patch_version: u16,
    reserved2: u16,
    /// Patch entry address
    entry: u32,
}

impl PatchRecord {
    /// Size of the metadata block
    pub const SIZE: usize = size_of::<ll::Patch>();

    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(ll::Patch::parse(body)?.into())
    }
}

impl From<ll::Patch> for PatchRecord {
    fn from(ll: ll::Patch) -> Self {
        Self {
            total_size: ll.total_size,
            data_length: ll.data_length,
            format_version: ll.format_version,
            signature: ll.signature,
            reserved1: ll.reserved1,
            product_id: ll.product_id,
            rom_build: ll.rom_build,
            patch_version: ll.patch_version,
            reserved2: ll.reserved2,
            entry: ll.entry,
        }
    }
}

impl Display for PatchRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total length: {} bytes", self.total_size)?;
        writeln!(f, "Patch data length: {} bytes", self.data_length)?;
        writeln!(f, "Signing format version: {:#x}", self.format_version)?;
        writeln!(f, "Signature algorithm: {:#x}", self.signature)?;
        writeln!(f, "Reserved: {:#x}", self.reserved1)?;
        writeln!(f, "Product ID: {:#06x}", self.product_id)?;
        writeln!(f, "ROM build version: {:#06x}", self.rom_build)?;
        writeln!(f, "Patch version: {:#06x}", self.patch_version)?;
        writeln!(f, "Reserved: {:#x}", self.reserved2)?;
        write!(f, "Patch entry address: {:#x}", self.entry)
    }
}
