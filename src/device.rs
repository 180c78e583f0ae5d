//! Discovered-device descriptors.
//!
//! [`DeviceInfo`] is the lightweight, copyable result of discovery: a bounded OS
//! device path plus the transport the controller was classified under. It owns no
//! OS resources; [`init_device`](crate::session::init_device) turns one into a live
//! [`Device`](crate::session::Device) session.
//!
//! ## Path conventions
//! - Paths are stored as UTF-16 code units, the native form on Windows.
//! - Capacity is [`PATH_CAPACITY`] units **including** the terminator, so a path holds
//!   at most `PATH_CAPACITY - 1` units and is always terminator-bounded.
//! - Paths are opaque and may change across ports and reconnects; treat them as a
//!   handle for re-opening, not as stable identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::PATH_CAPACITY;
use crate::error::{Error, Result};

/// Physical connection method, inferred from the input report length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Not (yet) classified. Never appears on an enumerated descriptor.
    #[default]
    Undefined,
    /// Wired USB connection.
    Usb,
    /// Wireless Bluetooth connection.
    Bluetooth,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionType::Undefined => "undefined",
            ConnectionType::Usb => "usb",
            ConnectionType::Bluetooth => "bluetooth",
        })
    }
}

/// Fixed-capacity, terminator-bounded device path.
///
/// Invariant: `len < PATH_CAPACITY` and `units[len..]` are all zero.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DevicePath {
    units: [u16; PATH_CAPACITY],
    len: usize,
}

impl DevicePath {
    /// The empty path.
    pub const fn empty() -> Self {
        Self {
            units: [0; PATH_CAPACITY],
            len: 0,
        }
    }

    /// Build a path from UTF-16 code units.
    ///
    /// Input is read up to the first terminator (or the end of the slice).
    ///
    /// ### Errors
    /// [`Error::InvalidPathSize`] if the path plus terminator exceeds [`PATH_CAPACITY`].
    pub fn from_units(units: &[u16]) -> Result<Self> {
        let len = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        if len + 1 > PATH_CAPACITY {
            return Err(Error::InvalidPathSize {
                required: len + 1,
                capacity: PATH_CAPACITY,
            });
        }
        let mut path = Self::empty();
        path.units[..len].copy_from_slice(&units[..len]);
        path.len = len;
        Ok(path)
    }

    /// Code units without the terminator.
    #[inline]
    pub fn as_units(&self) -> &[u16] {
        &self.units[..self.len]
    }

    /// Code units including the trailing terminator, ready for wide-string OS calls.
    #[inline]
    pub fn as_units_with_nul(&self) -> &[u16] {
        &self.units[..=self.len]
    }

    /// Number of code units, terminator excluded.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lossy UTF-8 rendering.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}

impl Default for DevicePath {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevicePath({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl FromStr for DevicePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let units: Vec<u16> = s.encode_utf16().collect();
        Self::from_units(&units)
    }
}

impl TryFrom<&str> for DevicePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl TryFrom<String> for DevicePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DevicePath> for String {
    fn from(path: DevicePath) -> Self {
        path.to_string_lossy()
    }
}

/// A discovered, not-yet-opened DualSense controller.
///
/// Produced only by discovery; read-only afterwards. The default value is the
/// empty descriptor (empty path, [`ConnectionType::Undefined`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// OS device path used to re-open the controller.
    pub path: DevicePath,
    /// Transport the controller was classified under.
    pub connection_type: ConnectionType,
}

impl DeviceInfo {
    pub fn new(path: DevicePath, connection_type: ConnectionType) -> Self {
        Self {
            path,
            connection_type,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.connection_type, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_stops_at_terminator() {
        let units: Vec<u16> = "abc\0def".encode_utf16().collect();
        let path = DevicePath::from_units(&units).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string_lossy(), "abc");
        assert_eq!(path.as_units_with_nul().last(), Some(&0));
    }

    #[test]
    fn path_at_capacity_is_rejected() {
        let longest = vec![b'x' as u16; PATH_CAPACITY - 1];
        assert!(DevicePath::from_units(&longest).is_ok());

        let too_long = vec![b'x' as u16; PATH_CAPACITY];
        assert_eq!(
            DevicePath::from_units(&too_long),
            Err(Error::InvalidPathSize {
                required: PATH_CAPACITY + 1,
                capacity: PATH_CAPACITY
            })
        );
    }

    #[test]
    fn default_info_is_empty_and_undefined() {
        let info = DeviceInfo::default();
        assert!(info.path.is_empty());
        assert_eq!(info.connection_type, ConnectionType::Undefined);
    }

    #[test]
    fn info_serializes_path_as_string() {
        let path: DevicePath = r"\\?\hid#vid_054c&pid_0ce6#1".parse().unwrap();
        let info = DeviceInfo::new(path, ConnectionType::Bluetooth);
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(
            json,
            r#"{"path":"\\\\?\\hid#vid_054c&pid_0ce6#1","connection_type":"bluetooth"}"#
        );
        let back: DeviceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
