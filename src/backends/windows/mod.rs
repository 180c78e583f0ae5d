#![cfg(target_os = "windows")]

//! Windows native HID host.
//!
//! This module contains the Windows-specific pieces used by discovery:
//! - **SetupDi** enumeration of HID interfaces ([`setupdi`])
//! - **CreateFileW** device handles and **HIDP** capability queries ([`hid_handle`])
//!
//! Most users should not interact with these modules directly. Prefer
//! [`probe_devices`](crate::backends::probe_devices) or
//! [`enumerate_devices`](crate::discovery::enumerate_devices) with a [`WinHidHost`].

pub mod hid_handle;
pub mod setupdi;

use crate::backends::HidHost;
use crate::device::DevicePath;

pub use hid_handle::{PreparsedData, WinHidHandle};
pub use setupdi::HidDeviceInfoSet;

/// [`HidHost`] over SetupDi, `CreateFileW`, and the HID class driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct WinHidHost;

impl WinHidHost {
    pub fn new() -> Self {
        Self
    }
}

impl HidHost for WinHidHost {
    type Set = HidDeviceInfoSet;
    type Handle = WinHidHandle;

    fn device_set(&self) -> Option<HidDeviceInfoSet> {
        HidDeviceInfoSet::open()
    }

    fn open(&self, path: &DevicePath) -> Option<WinHidHandle> {
        match WinHidHandle::open(path) {
            Ok(handle) => Some(handle),
            Err(code) => {
                tracing::trace!(%path, "CreateFileW failed: error={code}");
                None
            }
        }
    }
}
