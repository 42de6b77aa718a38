use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default line rate in baud.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout applied to every blocking read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// Settings used when opening a serial line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    /// Line rate in baud. Default: 9600.
    pub baud_rate: u32,
    /// Data bits per character. Default: 8.
    pub data_bits: DataBits,
    /// Parity mode. Default: none.
    pub parity: Parity,
    /// Stop bits per character. Default: 1.
    pub stop_bits: StopBits,
    /// Timeout for each blocking read. Default: 10 ms.
    pub read_timeout: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl LineConfig {
    /// Line settings for the given rate and read timeout, 8N1 framing.
    pub fn new(baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            baud_rate,
            read_timeout,
            ..Self::default()
        }
    }
}

impl fmt::Display for LineConfig {
    /// Renders the conventional short form, e.g. `9600 8N1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{} {data}{parity}{stop}", self.baud_rate)
    }
}

/// Error returned when a line setting cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {setting}: {value}")]
pub struct InvalidSetting {
    pub setting: &'static str,
    pub value: String,
}

impl TryFrom<u8> for DataBits {
    type Error = InvalidSetting;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(InvalidSetting {
                setting: "data bits",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for StopBits {
    type Error = InvalidSetting;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(InvalidSetting {
                setting: "stop bits",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Parity {
    type Err = InvalidSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            _ => Err(InvalidSetting {
                setting: "parity",
                value: s.to_string(),
            }),
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}
