use crate::{Event, HCI_OP_RESET, Result, Transport, commands::Command, err::Error};

/// Standard HCI reset, completed by a status-only command complete
#[derive(Default)]
pub struct Reset;

impl Command for Reset {
    type Output = ();

    const OPCODE: u16 = HCI_OP_RESET;
    const EVENT: Event = Event::CommandComplete;

    fn payload(&self) -> Vec<u8> {
        vec![]
    }

    fn parse(&self, response: &[u8]) -> Result<Self::Output> {
        match response.first() {
            Some(0x00) => Ok(()),
            Some(&status) => Err(Error::CommandStatus {
                opcode: Self::OPCODE,
                status,
            }),
            None => Err(Error::SizeMismatch {
                what: "HCI reset response",
                expected: 1,
                actual: 0,
            }),
        }
    }
}

pub fn send_reset<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    log::debug!(target: "qca", "QCA HCI_RESET");

    Reset.run(transport).inspect_err(|e| {
        log::error!(target: "qca", "QCA Reset failed: {e}");
    })
}
