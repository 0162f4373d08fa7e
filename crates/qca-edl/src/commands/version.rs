use std::fmt::Display;

use bincode::Decode;
use getset::CopyGetters;

use crate::{
    EDL_APP_VER_RES_EVT, EDL_PATCH_CMD_OPCODE, EDL_PATCH_VER_REQ_CMD, EdlEvent, Event, Result,
    Transport, commands::Command, decode, err::Error,
};

#[derive(Debug, Decode)]
#[repr(C)]
struct RomeVersion {
    product_id: u32,
    patch_ver: u16,
    rome_ver: u16,
    soc_id: u32,
}

/// Controller version record
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct VersionInfo {
    product_id: u32,
    patch_version: u16,
    rom_version: u16,
    soc_id: u32,
}

impl VersionInfo {
    /// Size of the version record on the wire
    pub const SIZE: usize = size_of::<RomeVersion>();

    pub fn parse(data: &[u8]) -> Result<Self> {
        let ll: RomeVersion = decode(data)?;
        Ok(Self {
            product_id: ll.product_id,
            patch_version: ll.patch_ver,
            rom_version: ll.rome_ver,
            soc_id: ll.soc_id,
        })
    }

    /// Upper half from the SoC id, lower half from the patch version.
    ///
    /// The SoC id bits shifted out of 32 bits are dropped.
    #[must_use]
    pub fn soc_version(&self) -> u32 {
        (self.soc_id << 16) | u32::from(self.patch_version)
    }
}

impl Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Product: {:#010x}", self.product_id)?;
        writeln!(f, "Patch: {:#010x}", self.patch_version)?;
        writeln!(f, "ROM: {:#010x}", self.rom_version)?;
        write!(f, "SoC: {:#010x}", self.soc_id)
    }
}

/// Ask the controller for its version record
#[derive(Default)]
pub struct ReadVersion;

impl Command for ReadVersion {
    type Output = VersionInfo;

    const OPCODE: u16 = EDL_PATCH_CMD_OPCODE;
    const EVENT: Event = Event::Vendor;

    fn payload(&self) -> Vec<u8> {
        vec![EDL_PATCH_VER_REQ_CMD]
    }

    fn parse(&self, response: &[u8]) -> Result<Self::Output> {
        let event = EdlEvent::parse("QCA version", response, VersionInfo::SIZE)?;
        event.expect(EDL_APP_VER_RES_EVT)?;
        VersionInfo::parse(event.data())
    }
}

/// Query the controller and compose its SoC version
pub fn read_soc_version<T: Transport + ?Sized>(transport: &mut T) -> Result<u32> {
    log::debug!(target: "qca", "QCA Version Request");

    let info = ReadVersion.run(transport).inspect_err(|e| {
        log::error!(target: "qca", "QCA Failed to get version: {e}");
    })?;
    for line in info.to_string().lines() {
        log::debug!(target: "qca", "{line}");
    }

    match info.soc_version() {
        0 => {
            log::error!(target: "qca", "QCA Failed to get version: SoC version is zero");
            Err(Error::InvalidVersion)
        }
        soc_version => Ok(soc_version),
    }
}
