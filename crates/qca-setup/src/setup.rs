use std::thread::sleep;

use derive_more::IsVariant;
use qca_edl::{Transport, read_soc_version, send_reset};
use qca_tlv::RecordType;
use strum::Display;

use crate::{
    Result,
    config::SetupConfig,
    download::{DownloadConfig, download_firmware, nvm_name, rampatch_name},
    err::Error,
    loader::FirmwareLoader,
};

/// Setup stages, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum Stage {
    #[strum(to_string = "Version query")]
    ReadVersion,
    #[strum(to_string = "Rampatch download")]
    Rampatch,
    #[strum(to_string = "NVM download")]
    Nvm,
    #[strum(to_string = "HCI reset")]
    Reset,
}

fn in_stage<R, E: Into<Error>>(stage: Stage, result: core::result::Result<R, E>) -> Result<R> {
    result.map_err(|e| {
        let source = e.into();
        log::error!(target: "qca", "QCA {stage} failed: {source}");
        Error::Stage {
            stage,
            source: Box::new(source),
        }
    })
}

/// Bring up the controller: query its version, download rampatch and NVM, reset.
///
/// Returns the SoC version the firmware names were built from.
pub fn uart_setup<T, L>(transport: &mut T, loader: &mut L, config: &SetupConfig) -> Result<u32>
where
    T: Transport + ?Sized,
    L: FirmwareLoader + ?Sized,
{
    log::debug!(target: "qca", "QCA setup on UART");

    let soc_version = in_stage(Stage::ReadVersion, read_soc_version(transport))?;
    uart_setup_with_version(transport, loader, config, soc_version)?;
    Ok(soc_version)
}

/// Same as [`uart_setup`] for a controller whose SoC version is already known
pub fn uart_setup_with_version<T, L>(
    transport: &mut T,
    loader: &mut L,
    config: &SetupConfig,
    soc_version: u32,
) -> Result<()>
where
    T: Transport + ?Sized,
    L: FirmwareLoader + ?Sized,
{
    log::info!(target: "qca", "QCA controller version {soc_version:#010x}");

    let limits = config.limits();
    let baud_rate = config.baud_rate().code();

    let patch = DownloadConfig::new(RecordType::Patch, baud_rate, rampatch_name(soc_version));
    in_stage(
        Stage::Rampatch,
        download_firmware(transport, loader, &patch, &limits),
    )?;

    /* The controller needs some idle time before it accepts the NVM */
    sleep(config.settle_delay());

    let nvm = DownloadConfig::new(RecordType::Nvm, baud_rate, nvm_name(soc_version));
    in_stage(
        Stage::Nvm,
        download_firmware(transport, loader, &nvm, &limits),
    )?;

    in_stage(Stage::Reset, send_reset(transport))?;

    log::info!(target: "qca", "QCA setup on UART is completed");
    Ok(())
}
