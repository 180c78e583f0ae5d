#![cfg(target_os = "windows")]

//! Windows HID device handle and HIDP capability descriptor.
//!
//! [`WinHidHandle`] owns a `CreateFileW` handle opened read/write with shared
//! read/write access on an existing path. [`PreparsedData`] owns the
//! `HidD_GetPreparsedData` blob and answers `HidP_GetCaps`.
//!
//! Both release their OS object on drop.

use core::mem::{size_of, MaybeUninit};
use std::io;
use std::ptr::{null, null_mut};

use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    HidD_FreePreparsedData, HidD_GetAttributes, HidD_GetPreparsedData, HidP_GetCaps,
    HIDD_ATTRIBUTES, HIDP_CAPS, HIDP_STATUS_SUCCESS, PHIDP_PREPARSED_DATA,
};
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING,
};

use crate::backends::{CapsDescriptor, HidAttributes, HidCaps, HidHandle};
use crate::device::DevicePath;

/// Open a Windows file handle for a HID interface path.
///
/// ### Errors
/// Returns `Err(GetLastError())` on failure.
///
/// ### Safety
/// The returned `HANDLE` must be closed with `CloseHandle` when no longer used.
fn open_device_handle(path: &DevicePath) -> Result<HANDLE, u32> {
    let wide = path.as_units_with_nul();

    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),                      // lpFileName
            GENERIC_READ | GENERIC_WRITE,       // dwDesiredAccess
            FILE_SHARE_READ | FILE_SHARE_WRITE, // dwShareMode
            null(),                             // lpSecurityAttributes
            OPEN_EXISTING,                      // dwCreationDisposition
            FILE_ATTRIBUTE_NORMAL,              // dwFlagsAndAttributes
            null_mut(),                         // hTemplateFile
        )
    };

    if handle == INVALID_HANDLE_VALUE || handle.is_null() {
        Err(unsafe { GetLastError() })
    } else {
        Ok(handle)
    }
}

/// Owned HID device handle.
pub struct WinHidHandle {
    handle: HANDLE,
}

// The handle is owned exclusively and only used from one thread at a time.
unsafe impl Send for WinHidHandle {}

impl WinHidHandle {
    /// Open `path` for read/write with shared read/write access. Never creates.
    ///
    /// ### Errors
    /// The Win32 error code from `GetLastError`.
    pub fn open(path: &DevicePath) -> Result<Self, u32> {
        open_device_handle(path).map(|handle| Self { handle })
    }
}

impl Drop for WinHidHandle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { CloseHandle(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl HidHandle for WinHidHandle {
    type Descriptor = PreparsedData;

    fn attributes(&self) -> Option<HidAttributes> {
        let mut attrs = HIDD_ATTRIBUTES {
            Size: size_of::<HIDD_ATTRIBUTES>() as u32,
            VendorID: 0,
            ProductID: 0,
            VersionNumber: 0,
        };
        let ok = unsafe { HidD_GetAttributes(self.handle, &mut attrs) };
        (ok != 0).then_some(HidAttributes {
            vendor_id: attrs.VendorID,
            product_id: attrs.ProductID,
            version: attrs.VersionNumber,
        })
    }

    fn descriptor(&self) -> Option<PreparsedData> {
        let mut ppd: PHIDP_PREPARSED_DATA = 0;
        let ok = unsafe { HidD_GetPreparsedData(self.handle, &mut ppd) };
        if ok == 0 || ppd == 0 {
            return None;
        }
        Some(PreparsedData { ppd })
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read: u32 = 0;
        let ok = unsafe {
            ReadFile(
                self.handle,
                buf.as_mut_ptr(),
                buf.len() as u32,
                &mut read,
                null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(read as usize)
    }
}

/// HIDP preparsed data for one open device.
pub struct PreparsedData {
    ppd: PHIDP_PREPARSED_DATA, // opaque handle (isize)
}

impl Drop for PreparsedData {
    fn drop(&mut self) {
        if self.ppd != 0 {
            unsafe { HidD_FreePreparsedData(self.ppd) };
            self.ppd = 0;
        }
    }
}

impl CapsDescriptor for PreparsedData {
    fn caps(&self) -> Option<HidCaps> {
        let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
        let status = unsafe { HidP_GetCaps(self.ppd, caps.as_mut_ptr()) };
        if status != HIDP_STATUS_SUCCESS {
            return None;
        }
        let caps = unsafe { caps.assume_init() };
        Some(HidCaps {
            usage_page: caps.UsagePage,
            usage: caps.Usage,
            input_report_len: caps.InputReportByteLength,
            output_report_len: caps.OutputReportByteLength,
            feature_report_len: caps.FeatureReportByteLength,
        })
    }
}
