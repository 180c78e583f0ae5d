//! Cross-platform host over `hidapi`.
//!
//! `hidapi` flattens the OS device tree into one entry per HID interface, so each
//! device record here exposes exactly one interface. The capability descriptor is
//! the raw report descriptor; report lengths are derived from it by
//! [`report_descriptor::parse_caps`](super::report_descriptor::parse_caps).

use std::cell::RefCell;
use std::ffi::CString;
use std::io;

use hidapi::{HidApi, HidDevice, HidError};

use super::report_descriptor::parse_caps;
use super::{CapsDescriptor, DeviceSet, HidAttributes, HidCaps, HidHandle, HidHost};
use crate::device::DevicePath;

/// Upper bound on a HID report descriptor (HID 1.11).
const REPORT_DESCRIPTOR_CAPACITY: usize = 4096;

/// [`HidHost`] backed by a single `hidapi` context.
pub struct HidApiHost {
    api: RefCell<HidApi>,
}

impl HidApiHost {
    /// Initialize a fresh `hidapi` context.
    pub fn new() -> Result<Self, HidError> {
        Ok(Self::from_api(HidApi::new()?))
    }

    /// Wrap an existing `hidapi` context.
    pub fn from_api(api: HidApi) -> Self {
        Self {
            api: RefCell::new(api),
        }
    }
}

impl HidHost for HidApiHost {
    type Set = HidApiDeviceSet;
    type Handle = HidApiHandle;

    fn device_set(&self) -> Option<Self::Set> {
        let mut api = self.api.borrow_mut();
        if let Err(e) = api.refresh_devices() {
            tracing::warn!("hidapi refresh failed: {e}");
            return None;
        }
        let paths: Vec<CString> = api.device_list().map(|d| d.path().to_owned()).collect();
        tracing::trace!(entries = paths.len(), "hidapi device list refreshed");
        Some(HidApiDeviceSet { paths })
    }

    fn open(&self, path: &DevicePath) -> Option<Self::Handle> {
        let cpath = CString::new(path.to_string_lossy()).ok()?;
        match self.api.borrow().open_path(&cpath) {
            Ok(device) => Some(HidApiHandle { device }),
            Err(e) => {
                tracing::trace!(%path, "hidapi open failed: {e}");
                None
            }
        }
    }
}

/// Snapshot of the `hidapi` device list.
pub struct HidApiDeviceSet {
    paths: Vec<CString>,
}

impl HidApiDeviceSet {
    fn wide_path(&self, index: usize) -> Option<Vec<u16>> {
        self.paths
            .get(index)
            .map(|p| p.to_string_lossy().encode_utf16().collect())
    }
}

impl DeviceSet for HidApiDeviceSet {
    type Device = usize;
    type Interface = usize;

    fn device(&self, index: u32) -> Option<usize> {
        let index = index as usize;
        (index < self.paths.len()).then_some(index)
    }

    fn interface(&self, device: &usize, index: u32) -> Option<usize> {
        (index == 0).then_some(*device)
    }

    fn path_len(&self, interface: &usize) -> Option<usize> {
        self.wide_path(*interface).map(|w| w.len() + 1)
    }

    fn resolve_path(&self, interface: &usize, out: &mut [u16]) -> bool {
        let Some(wide) = self.wide_path(*interface) else {
            return false;
        };
        if wide.len() + 1 > out.len() {
            return false;
        }
        out[..wide.len()].copy_from_slice(&wide);
        out[wide.len()] = 0;
        true
    }
}

/// An open `hidapi` device.
pub struct HidApiHandle {
    device: HidDevice,
}

impl HidHandle for HidApiHandle {
    type Descriptor = RawReportDescriptor;

    fn attributes(&self) -> Option<HidAttributes> {
        let info = self.device.get_device_info().ok()?;
        Some(HidAttributes {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            version: info.release_number(),
        })
    }

    fn descriptor(&self) -> Option<RawReportDescriptor> {
        let mut buf = vec![0u8; REPORT_DESCRIPTOR_CAPACITY];
        match self.device.get_report_descriptor(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Some(RawReportDescriptor { bytes: buf })
            }
            Err(e) => {
                tracing::trace!("report descriptor unavailable: {e}");
                None
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.device
            .read(buf)
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Raw HID report descriptor bytes.
pub struct RawReportDescriptor {
    bytes: Vec<u8>,
}

impl CapsDescriptor for RawReportDescriptor {
    fn caps(&self) -> Option<HidCaps> {
        parse_caps(&self.bytes)
    }
}
