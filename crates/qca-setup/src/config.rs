use std::time::Duration;

use derive_ctor::ctor;
use getset::CopyGetters;
use qca_edl::MAX_SIZE_PER_TLV_SEGMENT;
use qca_tlv::{BaudRate, RecordType};

/// Largest rampatch image accepted
pub const MAX_PATCH_FILE_SIZE: usize = 100 * 1024;
/// Largest NVM image accepted
pub const MAX_NVM_FILE_SIZE: usize = 10 * 1024;
/// Idle time the controller needs between the rampatch and the NVM download
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Size policy for firmware images and their segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, ctor)]
#[getset(get_copy = "pub")]
pub struct Limits {
    max_patch_size: usize,
    max_nvm_size: usize,
    max_segment: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_patch_size: MAX_PATCH_FILE_SIZE,
            max_nvm_size: MAX_NVM_FILE_SIZE,
            max_segment: MAX_SIZE_PER_TLV_SEGMENT,
        }
    }
}

impl Limits {
    /// Size ceiling for `ty`, `None` for record types that can't be downloaded
    #[must_use]
    pub fn max_size(&self, ty: RecordType) -> Option<usize> {
        match ty {
            RecordType::Patch => Some(self.max_patch_size),
            RecordType::Nvm => Some(self.max_nvm_size),
            RecordType::Unknown(_) => None,
        }
    }
}

/// Settings for one setup sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, ctor)]
#[getset(get_copy = "pub")]
pub struct SetupConfig {
    /// UART speed written into the NVM HCI transport tag
    baud_rate: BaudRate,
    /// Pause between the rampatch and NVM downloads
    settle_delay: Duration,
    limits: Limits,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::default(),
            settle_delay: SETTLE_DELAY,
            limits: Limits::default(),
        }
    }
}

impl SetupConfig {
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: BaudRate) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
