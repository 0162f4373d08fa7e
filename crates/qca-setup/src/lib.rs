//! Firmware download for Qualcomm Atheros Bluetooth controllers on UART
//!
//! The rampatch and NVM images go to the controller as TLV records cut into EDL segments, then
//! the controller is reset.
use crate::err::Error;

pub mod config;
pub mod download;
pub mod err;
pub mod loader;
pub mod setup;

pub type Result<T> = core::result::Result<T, Error>;

pub use config::{Limits, SetupConfig};
pub use download::{DownloadConfig, download_firmware, nvm_name, rampatch_name, validate};
pub use loader::{DirLoader, FirmwareLoader, MemoryLoader};
pub use qca_edl::{BdAddr, Event, Transport, err::TransportError, set_bdaddr};
pub use qca_tlv::{BaudRate, RecordType};
pub use setup::{Stage, uart_setup, uart_setup_with_version};
