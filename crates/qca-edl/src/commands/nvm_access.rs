use std::{fmt::Display, str::FromStr};

use derive_ctor::ctor;

use crate::{
    EDL_NVM_ACCESS_OPCODE, EDL_NVM_ACCESS_SET_REQ_CMD, EDL_TAG_ID_BD_ADDR, Event, Result,
    Transport, commands::Command, err::Error,
};

/// Bluetooth device address, kept in wire order (least significant byte first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BdAddr([u8; 6]);

impl BdAddr {
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for BdAddr {
    type Err = Error;

    /// `00:11:22:33:44:55`, most significant byte first
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let parts = s
            .split(':')
            .map(|p| match p.len() {
                2 => u8::from_str_radix(p, 16).ok(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidBdAddr(s.to_string()))?;

        let mut bytes: [u8; 6] = parts
            .try_into()
            .map_err(|_| Error::InvalidBdAddr(s.to_string()))?;
        bytes.reverse();
        Ok(Self(bytes))
    }
}

impl Display for BdAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [b0, b1, b2, b3, b4, b5] = self.0;
        write!(f, "{b5:02X}:{b4:02X}:{b3:02X}:{b2:02X}:{b1:02X}:{b0:02X}")
    }
}

/// Write the address NVM tag
#[derive(ctor)]
pub struct SetBdAddr {
    addr: BdAddr,
}

impl Command for SetBdAddr {
    type Output = ();

    const OPCODE: u16 = EDL_NVM_ACCESS_OPCODE;
    const EVENT: Event = Event::Vendor;

    fn payload(&self) -> Vec<u8> {
        let mut cmd = vec![EDL_NVM_ACCESS_SET_REQ_CMD, EDL_TAG_ID_BD_ADDR, 6];
        cmd.extend_from_slice(&self.addr.to_le_bytes());
        cmd
    }

    /// Only the exchange itself is checked, the event body isn't inspected
    fn parse(&self, _response: &[u8]) -> Result<Self::Output> {
        Ok(())
    }
}

/// Change the controller's Bluetooth address
pub fn set_bdaddr<T: Transport + ?Sized>(transport: &mut T, addr: BdAddr) -> Result<()> {
    SetBdAddr::new(addr).run(transport).inspect_err(|e| {
        log::error!(target: "qca", "QCA Change address command failed: {e}");
    })
}
