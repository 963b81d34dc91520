//! Serial pad: a fixed producer of single-byte press events
//!
//! Each press edge on the pad sends one ASCII byte, `U` or `D`. There is no
//! framing; anything else on the wire is ignored.
//!
//! The port is either named outright or found by listing USB serial ports and
//! picking the first one that looks like the pad's RP2040 board.

use std::io::{self, Read};
use std::time::Duration;

use serialport::{SerialPortInfo, SerialPortType};
use thiserror::Error;

use crate::sim::Direction;

/// Largest chunk pulled from the pad in one poll
const READ_CHUNK: usize = 64;

/// Port setting that asks for discovery instead of a fixed name
pub const AUTO_PORT: &str = "auto";

/// Tried when discovery finds nothing
#[cfg(windows)]
pub const FALLBACK_PORT: &str = "COM3";
#[cfg(not(windows))]
pub const FALLBACK_PORT: &str = "/dev/ttyACM0";

/// Lowercase fragments of a USB product or manufacturer string
const PAD_HINTS: [&str; 3] = ["pico", "rp2040", "board"];
/// Raspberry Pi's USB vendor id
const RASPBERRY_PI_VID: u16 = 0x2E8A;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("serial port {0} not found")]
    NotFound(String),
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial read failed: {0}")]
    Read(#[from] io::Error),
    #[error("serial device disconnected")]
    Disconnected,
}

/// Anything that can hand over the bytes received since the last poll
/// without blocking the tick
pub trait ByteSource {
    /// Append whatever is available to `buf`; returns how many bytes were added
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, DeviceError>;
}

/// Map a wire byte to a direction; unknown bytes are ignored
pub fn decode_byte(byte: u8) -> Option<Direction> {
    match byte {
        b'U' => Some(Direction::Up),
        b'D' => Some(Direction::Down),
        _ => None,
    }
}

/// Whether a port setting means "find it for me"
pub fn is_auto(port: &str) -> bool {
    let port = port.trim();
    port.is_empty() || port.eq_ignore_ascii_case(AUTO_PORT)
}

fn looks_like_pad(port: &SerialPortInfo) -> bool {
    let SerialPortType::UsbPort(usb) = &port.port_type else {
        return false;
    };
    usb.vid == RASPBERRY_PI_VID
        || [&usb.product, &usb.manufacturer]
            .into_iter()
            .flatten()
            .map(|text| text.to_lowercase())
            .any(|text| PAD_HINTS.iter().any(|hint| text.contains(hint)))
}

/// First listed port that looks like the pad
pub fn pick_pad_port(ports: &[SerialPortInfo]) -> Option<&str> {
    ports
        .iter()
        .find(|port| looks_like_pad(port))
        .map(|port| port.port_name.as_str())
}

/// Port name to open for a `device.port` setting. Named ports are used as
/// given; `auto` lists the system's ports and falls back to [`FALLBACK_PORT`].
pub fn resolve_port(configured: &str) -> String {
    if !is_auto(configured) {
        return configured.trim().to_string();
    }

    let ports = serialport::available_ports().unwrap_or_else(|e| {
        log::warn!("Could not list serial ports: {}", e);
        Vec::new()
    });
    match pick_pad_port(&ports) {
        Some(name) => {
            log::info!("Found serial pad on {}", name);
            name.to_string()
        }
        None => {
            log::info!(
                "No pad among {} serial ports, trying {}",
                ports.len(),
                FALLBACK_PORT
            );
            FALLBACK_PORT.to_string()
        }
    }
}

/// The pad on a real serial port
pub struct SerialDevice {
    name: String,
    port: Box<dyn serialport::SerialPort>,
}

impl std::fmt::Debug for SerialDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDevice")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SerialDevice {
    /// Open `port` by name. The read timeout bounds how long a poll can stall
    /// when the driver reports bytes that have not fully arrived.
    pub fn open(port: &str, baud: u32, read_timeout: Duration) -> Result<Self, DeviceError> {
        if port.trim().is_empty() {
            return Err(DeviceError::NotFound(port.to_string()));
        }

        let handle = serialport::new(port, baud)
            .timeout(read_timeout)
            .open()
            .map_err(|source| match source.kind() {
                serialport::ErrorKind::NoDevice => DeviceError::NotFound(port.to_string()),
                _ => DeviceError::Open {
                    port: port.to_string(),
                    source,
                },
            })?;

        log::debug!("Opened {} at {} baud", port, baud);
        Ok(Self {
            name: port.to_string(),
            port: handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ByteSource for SerialDevice {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, DeviceError> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|e| DeviceError::Read(e.into()))?;
        if pending == 0 {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let want = (pending as usize).min(READ_CHUNK);
        match self.port.read(&mut chunk[..want]) {
            Ok(0) => Err(DeviceError::Disconnected),
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted byte source: each poll yields the next scripted result
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedSource {
        pub(crate) script: VecDeque<Result<Vec<u8>, DeviceError>>,
    }

    impl ScriptedSource {
        pub(crate) fn new(script: Vec<Result<Vec<u8>, DeviceError>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl ByteSource for ScriptedSource {
        fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, DeviceError> {
            match self.script.pop_front() {
                None => Ok(0),
                Some(Ok(bytes)) => {
                    buf.extend_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
            }
        }
    }

    #[test]
    fn test_decode_known_bytes() {
        assert_eq!(decode_byte(b'U'), Some(Direction::Up));
        assert_eq!(decode_byte(b'D'), Some(Direction::Down));
        assert_eq!(decode_byte(0x55), Some(Direction::Up));
        assert_eq!(decode_byte(0x44), Some(Direction::Down));
    }

    #[test]
    fn test_decode_ignores_everything_else() {
        for byte in [b'u', b'd', b'\n', b'\r', 0, 0xFF, b'X'] {
            assert_eq!(decode_byte(byte), None);
        }
    }

    #[test]
    fn test_decode_matches_direction_wire_byte() {
        for dir in [Direction::Up, Direction::Down] {
            assert_eq!(decode_byte(dir.as_byte()), Some(dir));
        }
    }

    #[test]
    fn test_open_empty_name_is_not_found() {
        let err = SerialDevice::open("  ", 115_200, Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, DeviceError::NotFound(_)));
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialDevice::open(
            "/dev/titanic-pad-does-not-exist",
            115_200,
            Duration::from_millis(1),
        );
        assert!(result.is_err());
    }

    fn usb(name: &str, vid: u16, manufacturer: Option<&str>, product: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type: SerialPortType::UsbPort(serialport::UsbPortInfo {
                vid,
                pid: 0x0005,
                serial_number: None,
                manufacturer: manufacturer.map(str::to_string),
                product: product.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_auto_port_settings() {
        assert!(is_auto("auto"));
        assert!(is_auto(" AUTO "));
        assert!(is_auto(""));
        assert!(!is_auto("COM3"));
        assert_eq!(resolve_port(" /dev/ttyUSB1 "), "/dev/ttyUSB1");
    }

    #[test]
    fn test_pick_pad_port_matches_board_names() {
        let ports = vec![
            SerialPortInfo {
                port_name: "/dev/ttyS0".to_string(),
                port_type: SerialPortType::Unknown,
            },
            usb("/dev/ttyUSB0", 0x0403, Some("FTDI"), Some("FT232R USB UART")),
            usb("/dev/ttyACM1", 0x1234, Some("Generic"), Some("Board CDC")),
            usb("/dev/ttyACM2", 0x1234, Some("Raspberry Pi"), Some("Pico")),
        ];
        assert_eq!(pick_pad_port(&ports), Some("/dev/ttyACM1"));
        assert_eq!(pick_pad_port(&ports[..2]), None);
        assert_eq!(pick_pad_port(&ports[3..]), Some("/dev/ttyACM2"));
        assert_eq!(
            pick_pad_port(&[usb("COM5", 0x1234, Some("ACME RP2040 kit"), None)]),
            Some("COM5")
        );
    }

    #[test]
    fn test_pick_pad_port_matches_raspberry_pi_vendor() {
        let ports = [usb("COM4", RASPBERRY_PI_VID, None, None)];
        assert_eq!(pick_pad_port(&ports), Some("COM4"));
        assert_eq!(pick_pad_port(&[]), None);
    }

    #[test]
    fn test_scripted_source_appends() {
        let mut src = ScriptedSource::new(vec![Ok(b"UD".to_vec()), Ok(Vec::new())]);
        let mut buf = Vec::new();
        assert_eq!(src.read_available(&mut buf).unwrap(), 2);
        assert_eq!(src.read_available(&mut buf).unwrap(), 0);
        assert_eq!(buf, b"UD");
    }
}
