use derive_ctor::ctor;
use getset::{CopyGetters, Getters};
use qca_edl::{Transport, send_segments};
use qca_tlv::{RecordType, TLV_HEADER_SIZE, TlvHeader, check_data};

use crate::{
    Result,
    config::Limits,
    err::{Error, Malformed},
    loader::FirmwareLoader,
};

/// One firmware download
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, ctor)]
pub struct DownloadConfig {
    /// Record type the image must be downloaded as
    #[getset(get_copy = "pub")]
    ty: RecordType,

    /// Baud rate code patched into NVM images
    #[getset(get_copy = "pub")]
    baud_rate: u8,

    /// Firmware name handed to the loader
    #[getset(get = "pub")]
    #[ctor(into)]
    name: String,
}

#[must_use]
pub fn rampatch_name(soc_version: u32) -> String {
    format!("rampatch_{soc_version:08x}.bin")
}

#[must_use]
pub fn nvm_name(soc_version: u32) -> String {
    format!("nvm_{soc_version:08x}.bin")
}

/// Check `image` against the download policy for `ty`.
///
/// The header must carry `ty` itself, since the patches applied afterwards follow the header.
pub fn validate(image: &[u8], ty: RecordType, limits: &Limits) -> Result<TlvHeader> {
    if image.is_empty() {
        return Err(Error::InvalidArgument("empty firmware image"));
    }

    let max = limits
        .max_size(ty)
        .ok_or(Error::InvalidArgument("wrong config type selected"))?;
    if image.len() > max {
        return Err(Error::ImageTooLarge {
            ty,
            size: image.len(),
            max,
        });
    }

    if image.len() < TLV_HEADER_SIZE {
        return Err(Malformed::TooSmall(image.len()).into());
    }

    let header = TlvHeader::parse(image)?;
    if header.total_size() != image.len() {
        return Err(Malformed::LengthMismatch {
            declared: header.length() as usize,
            actual: image.len() - TLV_HEADER_SIZE,
        }
        .into());
    }

    if header.ty() != ty {
        return Err(Malformed::TypeMismatch {
            expected: ty,
            found: header.ty(),
        }
        .into());
    }

    Ok(header)
}

/// Fetch, validate, patch and transfer one firmware image.
///
/// Nothing is sent unless the image passes [`validate`]. The TLV header is transferred along
/// with the body. Returns the number of segments sent.
pub fn download_firmware<T, L>(
    transport: &mut T,
    loader: &mut L,
    config: &DownloadConfig,
    limits: &Limits,
) -> Result<usize>
where
    T: Transport + ?Sized,
    L: FirmwareLoader + ?Sized,
{
    log::info!(target: "qca", "QCA Downloading file: {}", config.name());

    let mut image = loader.request(config.name()).inspect_err(|e| {
        log::error!(target: "qca", "QCA Failed to request file: {} ({e})", config.name());
    })?;
    let data = image.as_mut();

    let header = validate(data, config.ty(), limits).inspect_err(|e| {
        log::error!(target: "qca", "TLV {} dload: {e}", config.ty());
    })?;
    log::debug!(target: "qca", "{} body {} bytes", header.ty(), header.length());

    check_data(data, config.baud_rate())?;

    send_segments(transport, data, limits.max_segment())
        .inspect_err(|e| log::error!(target: "qca", "Failed to download FW: {e}"))
        .map_err(|e| e.into())
}
