//! Low-level representation of the QCA TLV records
//!
//! This matches how the records actually look on the wire, all fields little endian.
use bincode::Decode;

use crate::LLParser;

#[derive(Debug, Decode)]
#[repr(C)]
pub(crate) struct Header {
    pub type_len: u32,
}

impl LLParser for Header {}

#[derive(Debug, Decode)]
#[repr(C)]
pub(crate) struct Patch {
    pub total_size: u32,
    pub data_length: u32,
    pub format_version: u8,
    pub signature: u8,
    pub reserved1: u16,
    pub product_id: u16,
    pub rom_build: u16,
    pub patch_version: u16,
    pub reserved2: u16,
    pub entry: u32,
}

impl LLParser for Patch {}

#[derive(Debug, Decode)]
#[repr(C)]
pub(crate) struct NvmTagHeader {
    pub tag_id: u16,
    pub tag_len: u16,
    _reserved: [u8; 8],
}

impl LLParser for NvmTagHeader {}
