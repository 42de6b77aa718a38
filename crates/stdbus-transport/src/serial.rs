use std::io::{Read, Write};

use serialport::{SerialPort, SerialPortType};
use tracing::info;

use crate::config::LineConfig;
use crate::error::{Result, TransportError};

/// An open serial line. Implements `Read` and `Write`.
///
/// Every read blocks for at most the configured read timeout. When the
/// timeout elapses with no data the read fails with
/// [`std::io::ErrorKind::TimedOut`]; callers that poll the line treat that
/// the same as a zero-length read.
pub struct SerialLine {
    port: Box<dyn SerialPort>,
    name: String,
    config: LineConfig,
}

impl SerialLine {
    /// Open a serial port with the given line settings.
    pub fn open(name: impl Into<String>, config: &LineConfig) -> Result<Self> {
        let name = name.into();

        let port = serialport::new(&name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: name.clone(),
                source,
            })?;

        info!(port = %name, line = %config, "serial line opened");

        Ok(Self {
            port,
            name,
            config: config.clone(),
        })
    }

    /// The port name this line was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line settings in effect.
    pub fn config(&self) -> &LineConfig {
        &self.config
    }
}

impl Read for SerialLine {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLine {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLine")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

/// Kind of device behind a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortKind {
    Usb {
        vid: u16,
        pid: u16,
        serial_number: Option<String>,
        manufacturer: Option<String>,
        product: Option<String>,
    },
    Pci,
    Bluetooth,
    Unknown,
}

impl PortKind {
    /// Short label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            PortKind::Usb { .. } => "usb",
            PortKind::Pci => "pci",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Unknown => "unknown",
        }
    }
}

impl From<SerialPortType> for PortKind {
    fn from(kind: SerialPortType) -> Self {
        match kind {
            SerialPortType::UsbPort(usb) => PortKind::Usb {
                vid: usb.vid,
                pid: usb.pid,
                serial_number: usb.serial_number,
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            SerialPortType::PciPort => PortKind::Pci,
            SerialPortType::BluetoothPort => PortKind::Bluetooth,
            SerialPortType::Unknown => PortKind::Unknown,
        }
    }
}

/// A serial port discovered on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: PortKind,
}

/// List the serial ports available on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports
        .into_iter()
        .map(|port| PortInfo {
            name: port.port_name,
            kind: port.port_type.into(),
        })
        .collect())
}
