use bincode::Decode;
use derive_more::IsVariant;
use getset::CopyGetters;

use crate::err::{Error, TransportError};

pub mod commands;
pub mod err;

pub type Result<T> = core::result::Result<T, Error>;

pub use commands::{
    Command,
    nvm_access::{BdAddr, SetBdAddr, set_bdaddr},
    reset::{Reset, send_reset},
    segment::{SegmentPlan, SendSegment, send_segments},
    version::{ReadVersion, VersionInfo, read_soc_version},
};

/// Vendor patch command
pub const EDL_PATCH_CMD_OPCODE: u16 = 0xfc00;
/// Vendor NVM access command
pub const EDL_NVM_ACCESS_OPCODE: u16 = 0xfc0b;
/// Standard HCI reset
pub const HCI_OP_RESET: u16 = 0x0c03;

pub const EDL_PATCH_VER_REQ_CMD: u8 = 0x19;
pub const EDL_PATCH_TLV_REQ_CMD: u8 = 0x1e;
pub const EDL_NVM_ACCESS_SET_REQ_CMD: u8 = 0x01;

/// NVM tag holding the Bluetooth address
pub const EDL_TAG_ID_BD_ADDR: u8 = 0x02;

pub const EDL_CMD_REQ_RES_EVT: u8 = 0x00;
pub const EDL_APP_VER_RES_EVT: u8 = 0x02;
pub const EDL_TVL_DNLD_RES_EVT: u8 = 0x04;

/// Largest TLV segment the controller accepts in one command
pub const MAX_SIZE_PER_TLV_SEGMENT: u8 = 243;

/// `cresp` + `rtype`
pub const EDL_EVENT_HEADER_SIZE: usize = 2;

/// Which event completes a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Event {
    /// Vendor-specific event carrying an EDL response
    Vendor,
    /// Standard HCI command complete
    CommandComplete,
}

/// Synchronous command/response primitive of the HCI transport.
///
/// One command is outstanding at a time: `command` blocks until the completing event arrives or
/// the transport gives up.
pub trait Transport {
    /// Send `opcode` with `payload` and wait for `event`, returning the event parameters
    fn command(
        &mut self,
        opcode: u16,
        payload: &[u8],
        event: Event,
    ) -> core::result::Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn command(
        &mut self,
        opcode: u16,
        payload: &[u8],
        event: Event,
    ) -> core::result::Result<Vec<u8>, TransportError> {
        (**self).command(opcode, payload, event)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn command(
        &mut self,
        opcode: u16,
        payload: &[u8],
        event: Event,
    ) -> core::result::Result<Vec<u8>, TransportError> {
        (**self).command(opcode, payload, event)
    }
}

/// EDL response: header plus record data
#[derive(Debug, Clone, Copy, CopyGetters)]
pub struct EdlEvent<'a> {
    /// Command class
    #[getset(get_copy = "pub")]
    cresp: u8,
    /// Response type
    #[getset(get_copy = "pub")]
    rtype: u8,
    /// Record following the header
    #[getset(get_copy = "pub")]
    data: &'a [u8],
}

impl<'a> EdlEvent<'a> {
    /// Split `response`, which must hold exactly `data_len` bytes after the header
    pub fn parse(what: &'static str, response: &'a [u8], data_len: usize) -> Result<Self> {
        let expected = EDL_EVENT_HEADER_SIZE + data_len;
        if response.len() != expected {
            return Err(Error::SizeMismatch {
                what,
                expected,
                actual: response.len(),
            });
        }

        Ok(Self {
            cresp: response[0],
            rtype: response[1],
            data: &response[EDL_EVENT_HEADER_SIZE..],
        })
    }

    /// Check this is the command response of type `rtype`
    pub fn expect(&self, rtype: u8) -> Result<()> {
        if self.cresp != EDL_CMD_REQ_RES_EVT || self.rtype != rtype {
            Err(Error::UnexpectedEvent {
                cresp: self.cresp,
                rtype: self.rtype,
            })
        } else {
            Ok(())
        }
    }
}

pub(crate) fn decode<T: Decode<()>>(data: &[u8]) -> Result<T> {
    let config = bincode::config::standard()
        .with_little_endian()
        .with_fixed_int_encoding();
    bincode::decode_from_slice(data, config)
        .map(|r| r.0)
        .map_err(|e| e.into())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Records every command and answers from a script
    #[derive(Default)]
    pub(crate) struct Scripted {
        pub sent: Vec<(u16, Vec<u8>, Event)>,
        pub replies: VecDeque<core::result::Result<Vec<u8>, TransportError>>,
    }

    impl Scripted {
        pub(crate) fn new(replies: impl IntoIterator<Item = Vec<u8>>) -> Self {
            Self {
                sent: vec![],
                replies: replies.into_iter().map(Ok).collect(),
            }
        }
    }

    impl Transport for Scripted {
        fn command(
            &mut self,
            opcode: u16,
            payload: &[u8],
            event: Event,
        ) -> core::result::Result<Vec<u8>, TransportError> {
            self.sent.push((opcode, payload.to_vec(), event));
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Timeout(std::time::Duration::from_secs(10))))
        }
    }

    #[test]
    fn event_needs_exact_size() {
        assert!(matches!(
            EdlEvent::parse("test", &[0x00, 0x04], 1),
            Err(Error::SizeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        assert!(EdlEvent::parse("test", &[0x00, 0x04, 0x00, 0x00], 1).is_err());
    }

    #[test]
    fn event_checks_class_and_type() {
        let event = EdlEvent::parse("test", &[0x00, 0x04, 0x07], 1).unwrap();
        assert_eq!(event.data(), &[0x07]);
        assert!(event.expect(EDL_TVL_DNLD_RES_EVT).is_ok());
        assert!(matches!(
            event.expect(EDL_APP_VER_RES_EVT),
            Err(Error::UnexpectedEvent {
                cresp: 0x00,
                rtype: 0x04
            })
        ));

        let event = EdlEvent::parse("test", &[0x01, 0x04, 0x00], 1).unwrap();
        assert!(event.expect(EDL_TVL_DNLD_RES_EVT).is_err());
    }

    #[test]
    fn transport_through_reference() {
        fn reset<T: Transport>(mut transport: T) -> Vec<u8> {
            transport
                .command(HCI_OP_RESET, &[], Event::CommandComplete)
                .unwrap()
        }

        let mut scripted = Scripted::new([vec![0x00], vec![0x0c]]);
        assert_eq!(reset(&mut scripted), vec![0x00]);
        assert_eq!(reset(Box::new(&mut scripted)), vec![0x0c]);
        assert_eq!(scripted.sent.len(), 2);
    }
}
