use std::fmt::Display;

use strum::{EnumIter, FromRepr, IntoEnumIterator};

/// UART baud rate codes understood by the controller.
///
/// The code byte is what ends up in the HCI transport NVM tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u8)]
pub enum BaudRate {
    #[default]
    B115200 = 0x00,
    B57600,
    B38400,
    B19200,
    B9600,
    B230400,
    B250000,
    B460800,
    B500000,
    B720000,
    B921600,
    B1000000,
    B1250000,
    B2000000,
    B3000000,
    B4000000,
    B1600000,
    B3200000,
    B3500000,
    Auto = 0xfe,
}

impl BaudRate {
    /// Code byte sent to the controller
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Line speed in bits per second, `None` for [`BaudRate::Auto`]
    #[must_use]
    pub fn speed(self) -> Option<u32> {
        Some(match self {
            Self::B115200 => 115_200,
            Self::B57600 => 57_600,
            Self::B38400 => 38_400,
            Self::B19200 => 19_200,
            Self::B9600 => 9_600,
            Self::B230400 => 230_400,
            Self::B250000 => 250_000,
            Self::B460800 => 460_800,
            Self::B500000 => 500_000,
            Self::B720000 => 720_000,
            Self::B921600 => 921_600,
            Self::B1000000 => 1_000_000,
            Self::B1250000 => 1_250_000,
            Self::B2000000 => 2_000_000,
            Self::B3000000 => 3_000_000,
            Self::B4000000 => 4_000_000,
            Self::B1600000 => 1_600_000,
            Self::B3200000 => 3_200_000,
            Self::B3500000 => 3_500_000,
            Self::Auto => return None,
        })
    }

    /// Look up the code for a line speed
    #[must_use]
    pub fn from_speed(speed: u32) -> Option<Self> {
        Self::iter().find(|b| b.speed() == Some(speed))
    }
}

impl Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.speed() {
            Some(speed) => write!(f, "{speed}"),
            None => write!(f, "auto"),
        }
    }
}
