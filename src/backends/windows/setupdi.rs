#![cfg(target_os = "windows")]

//! SetupDi enumeration of HID device interfaces.
//!
//! [`HidDeviceInfoSet`] owns an `HDEVINFO` scoped to the HID interface class GUID,
//! restricted to present devices that expose interfaces. Device records
//! (`SP_DEVINFO_DATA`) are walked by index; each device's interface records
//! (`SP_DEVICE_INTERFACE_DATA`) are walked by index in turn.
//!
//! Interface paths use the standard two-phase protocol of
//! `SetupDiGetDeviceInterfaceDetailW`: a size query with a null buffer, then a fill
//! query into a buffer of that size.

use core::mem::{offset_of, size_of, zeroed};
use std::ptr::{null, null_mut};

use windows_sys::core::GUID;
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo, SetupDiEnumDeviceInterfaces,
    SetupDiGetClassDevsW, SetupDiGetDeviceInterfaceDetailW, DIGCF_DEVICEINTERFACE, DIGCF_PRESENT,
    HDEVINFO, SP_DEVICE_INTERFACE_DATA, SP_DEVICE_INTERFACE_DETAIL_DATA_W, SP_DEVINFO_DATA,
};
use windows_sys::Win32::Devices::HumanInterfaceDevice::HidD_GetHidGuid;
use windows_sys::Win32::Foundation::{GetLastError, INVALID_HANDLE_VALUE};

use crate::backends::DeviceSet;

/// Byte offset of the path inside `SP_DEVICE_INTERFACE_DETAIL_DATA_W`.
const DETAIL_PATH_OFFSET: usize = offset_of!(SP_DEVICE_INTERFACE_DETAIL_DATA_W, DevicePath);

/// Owned SetupDi device-information set over the HID interface class.
pub struct HidDeviceInfoSet {
    handle: HDEVINFO,
    guid: GUID,
}

impl HidDeviceInfoSet {
    /// Acquire the set. Returns `None` if SetupDi hands back an invalid handle.
    pub fn open() -> Option<Self> {
        let mut guid: GUID = unsafe { zeroed() };
        unsafe { HidD_GetHidGuid(&mut guid) };

        let handle = unsafe {
            SetupDiGetClassDevsW(
                &guid,
                null(),     // Enumerator
                null_mut(), // hwndParent
                DIGCF_DEVICEINTERFACE | DIGCF_PRESENT,
            )
        };
        if handle as isize == INVALID_HANDLE_VALUE as isize {
            let code = unsafe { GetLastError() };
            tracing::warn!("SetupDiGetClassDevsW failed: error={code}");
            return None;
        }
        Some(Self { handle, guid })
    }
}

impl Drop for HidDeviceInfoSet {
    fn drop(&mut self) {
        unsafe {
            SetupDiDestroyDeviceInfoList(self.handle);
        }
    }
}

impl DeviceSet for HidDeviceInfoSet {
    type Device = SP_DEVINFO_DATA;
    type Interface = SP_DEVICE_INTERFACE_DATA;

    fn device(&self, index: u32) -> Option<SP_DEVINFO_DATA> {
        let mut data = SP_DEVINFO_DATA {
            cbSize: size_of::<SP_DEVINFO_DATA>() as u32,
            ..unsafe { zeroed() }
        };
        let ok = unsafe { SetupDiEnumDeviceInfo(self.handle, index, &mut data) };
        (ok != 0).then_some(data)
    }

    fn interface(&self, device: &SP_DEVINFO_DATA, index: u32) -> Option<SP_DEVICE_INTERFACE_DATA> {
        let mut data = SP_DEVICE_INTERFACE_DATA {
            cbSize: size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
            ..unsafe { zeroed() }
        };
        let ok = unsafe {
            SetupDiEnumDeviceInterfaces(self.handle, device, &self.guid, index, &mut data)
        };
        (ok != 0).then_some(data)
    }

    fn path_len(&self, interface: &SP_DEVICE_INTERFACE_DATA) -> Option<usize> {
        let mut required_bytes: u32 = 0;
        // Size query: expected to fail with ERROR_INSUFFICIENT_BUFFER.
        unsafe {
            SetupDiGetDeviceInterfaceDetailW(
                self.handle,
                interface,
                null_mut(),
                0,
                &mut required_bytes,
                null_mut(),
            );
        }
        let required_bytes = required_bytes as usize;
        if required_bytes <= DETAIL_PATH_OFFSET {
            tracing::trace!(
                error = unsafe { GetLastError() },
                "interface detail size query returned nothing"
            );
            return None;
        }
        Some((required_bytes - DETAIL_PATH_OFFSET).div_ceil(size_of::<u16>()))
    }

    fn resolve_path(&self, interface: &SP_DEVICE_INTERFACE_DATA, out: &mut [u16]) -> bool {
        // u32 storage keeps the detail header aligned.
        let bytes = (DETAIL_PATH_OFFSET + out.len() * size_of::<u16>())
            .max(size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>());
        let mut storage = vec![0u32; bytes.div_ceil(size_of::<u32>())];
        let storage_bytes = storage.len() * size_of::<u32>();
        let detail = storage.as_mut_ptr() as *mut SP_DEVICE_INTERFACE_DETAIL_DATA_W;

        let ok = unsafe {
            (*detail).cbSize = size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32;
            SetupDiGetDeviceInterfaceDetailW(
                self.handle,
                interface,
                detail,
                storage_bytes as u32,
                null_mut(),
                null_mut(),
            )
        };
        if ok == 0 {
            tracing::trace!(
                error = unsafe { GetLastError() },
                "interface detail fill query failed"
            );
            return false;
        }

        let capacity = (storage_bytes - DETAIL_PATH_OFFSET) / size_of::<u16>();
        let units = unsafe {
            std::slice::from_raw_parts(
                (detail as *const u8).add(DETAIL_PATH_OFFSET) as *const u16,
                capacity,
            )
        };
        let len = units.iter().position(|&u| u == 0).unwrap_or(capacity);
        if len + 1 > out.len() {
            return false;
        }
        out[..len].copy_from_slice(&units[..len]);
        out[len] = 0;
        true
    }
}
