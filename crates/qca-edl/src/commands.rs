use crate::{Event, Result, Transport};

pub mod nvm_access;
pub mod reset;
pub mod segment;
pub mod version;

/// One command/response exchange
pub trait Command {
    /// What a valid response decodes to
    type Output;

    /// HCI opcode
    const OPCODE: u16;
    /// Event completing the command
    const EVENT: Event;

    /// Command parameters
    fn payload(&self) -> Vec<u8>;

    /// Validate and decode the event parameters
    fn parse(&self, response: &[u8]) -> Result<Self::Output>;

    /// Send the command and wait for its response
    fn run<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Self::Output> {
        let response = transport.command(Self::OPCODE, &self.payload(), Self::EVENT)?;
        self.parse(&response)
    }
}
