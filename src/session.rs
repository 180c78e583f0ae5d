//! Live DualSense sessions.
//!
//! [`Device`] wraps one opened [`HidHandle`] plus the transport and path it was
//! discovered with. It is responsible for:
//! - re-opening a discovered path for read/write with shared read/write access
//! - owning the OS handle until [`Device::close`] or drop, releasing it exactly once
//! - holding the fixed [`HID_BUFFER_LEN`]-byte scratch buffer reports are read into
//!
//! This module does **not**:
//! - decode input reports (motion, buttons, touchpad)
//! - write output reports (rumble, LEDs, triggers)
//! - negotiate anything between the USB and Bluetooth report formats

use std::fmt;

use crate::backends::{HidHandle, HidHost};
use crate::constants::HID_BUFFER_LEN;
use crate::device::{ConnectionType, DeviceInfo, DevicePath};
use crate::error::{Error, Result};

/// An opened DualSense session.
pub struct Device<Hd: HidHandle> {
    path: DevicePath,
    handle: Hd,
    connection_type: ConnectionType,
    connected: bool,
    hid_buffer: [u8; HID_BUFFER_LEN],
}

/// Open a session for a previously discovered controller.
///
/// ### Errors
/// - [`Error::InvalidArgs`] if `info` is absent or its path is empty. No OS call is
///   made in that case.
/// - [`Error::DeviceDisconnected`] if the path can no longer be opened.
///
/// On failure no handle is held and no session exists.
pub fn init_device<H: HidHost>(host: &H, info: Option<&DeviceInfo>) -> Result<Device<H::Handle>> {
    let info = info.ok_or(Error::InvalidArgs("missing device info"))?;
    if info.path.is_empty() {
        return Err(Error::InvalidArgs("device info has an empty path"));
    }

    let Some(handle) = host.open(&info.path) else {
        tracing::debug!(path = %info.path, "device could not be re-opened");
        return Err(Error::DeviceDisconnected);
    };

    tracing::info!(path = %info.path, connection_type = %info.connection_type, "session opened");
    Ok(Device {
        path: info.path,
        handle,
        connection_type: info.connection_type,
        connected: true,
        hid_buffer: [0; HID_BUFFER_LEN],
    })
}

impl<Hd: HidHandle> Device<Hd> {
    #[inline]
    pub fn path(&self) -> &DevicePath {
        &self.path
    }

    #[inline]
    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    /// `false` once a read has failed on this session.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The scratch buffer. Holds the most recent report after [`Device::read_report`].
    #[inline]
    pub fn hid_buffer(&self) -> &[u8; HID_BUFFER_LEN] {
        &self.hid_buffer
    }

    /// The descriptor this session was opened from.
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.path, self.connection_type)
    }

    /// Blocking read of one raw input report into the scratch buffer.
    ///
    /// Returns the filled prefix of the buffer. The bytes are not decoded.
    ///
    /// ### Errors
    /// [`Error::DeviceDisconnected`] if the session is already disconnected or the
    /// read fails; a failed read marks the session disconnected.
    pub fn read_report(&mut self) -> Result<&[u8]> {
        if !self.connected {
            return Err(Error::DeviceDisconnected);
        }
        match self.handle.read(&mut self.hid_buffer) {
            Ok(n) => Ok(&self.hid_buffer[..n.min(HID_BUFFER_LEN)]),
            Err(e) => {
                tracing::warn!(path = %self.path, "read failed, marking disconnected: {e}");
                self.connected = false;
                Err(Error::DeviceDisconnected)
            }
        }
    }

    /// End the session and release the OS handle.
    pub fn close(self) {
        tracing::debug!(path = %self.path, "session closed");
        drop(self);
    }
}

impl<Hd: HidHandle> fmt::Debug for Device<Hd> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("path", &self.path)
            .field("connection_type", &self.connection_type)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}
