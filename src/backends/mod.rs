//! HID host backends.
//!
//! Discovery and session setup talk to the OS through the small trait seam defined
//! here, so the pipeline in [`discovery`](crate::discovery) is written once and runs
//! against any host:
//!
//! - [`HidHost`] hands out a [`DeviceSet`] (the class-scoped enumeration handle) and
//!   opens device paths as [`HidHandle`]s.
//! - [`DeviceSet`] walks device records, then interface records per device, and
//!   resolves an interface into a path with the two-phase size-then-fill protocol.
//! - [`HidHandle`] answers identity and capability queries and reads raw reports.
//! - [`CapsDescriptor`] is the opaque capability descriptor (Windows "preparsed data").
//!
//! Every resource is an owning value: dropping a set, handle, or descriptor releases
//! the underlying OS object exactly once.
//!
//! # Feature flags
//! - **`hid`**: enables the cross-platform `hidapi` host (default in this build).
//!
//! On Windows the native SetupDi/HIDP host is always available and is the default.

use std::io;

use crate::config::DiscoveryConfig;
use crate::device::{DeviceInfo, DevicePath};
use crate::error::Result;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod report_descriptor;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;

/// Vendor/product identity of an opened HID device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HidAttributes {
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
}

/// Structural capabilities read from a capability descriptor.
///
/// Report lengths follow the Windows HIDP convention: they include the one-byte
/// report ID prefix, whether or not the device numbers its reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HidCaps {
    pub usage_page: u16,
    pub usage: u16,
    pub input_report_len: u16,
    pub output_report_len: u16,
    pub feature_report_len: u16,
}

/// Opaque capability descriptor. Released on drop.
pub trait CapsDescriptor {
    /// Query structural capabilities. `None` if the descriptor cannot be interpreted.
    fn caps(&self) -> Option<HidCaps>;
}

/// An opened HID device. Closed on drop.
pub trait HidHandle {
    type Descriptor: CapsDescriptor;

    /// Vendor/product identity, or `None` if the query failed.
    fn attributes(&self) -> Option<HidAttributes>;

    /// Acquire the capability descriptor, or `None` if the query failed.
    fn descriptor(&self) -> Option<Self::Descriptor>;

    /// Blocking read of one input report into `buf`. Returns the byte count.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Class-scoped enumeration handle. Released on drop.
pub trait DeviceSet {
    type Device;
    type Interface;

    /// Device record at `index`, or `None` once the set is exhausted.
    fn device(&self, index: u32) -> Option<Self::Device>;

    /// Interface record `index` of `device`, or `None` once exhausted.
    fn interface(&self, device: &Self::Device, index: u32) -> Option<Self::Interface>;

    /// Size query: code units (terminator included) needed for the interface path.
    /// `None` if the OS reports nothing to resolve.
    fn path_len(&self, interface: &Self::Interface) -> Option<usize>;

    /// Fill query: write the terminator-bounded path into `out`, which is exactly
    /// `path_len` units long. Returns `false` on failure.
    fn resolve_path(&self, interface: &Self::Interface, out: &mut [u16]) -> bool;
}

/// Entry point to an OS HID stack.
pub trait HidHost {
    type Set: DeviceSet;
    type Handle: HidHandle;

    /// Acquire an enumeration handle over present, interface-exposing HID devices.
    fn device_set(&self) -> Option<Self::Set>;

    /// Open an existing device path for shared read/write. Never creates.
    fn open(&self, path: &DevicePath) -> Option<Self::Handle>;
}

/// Platform default host.
#[cfg(target_os = "windows")]
pub type DefaultHost = windows::WinHidHost;

/// Platform default host.
#[cfg(all(not(target_os = "windows"), feature = "hid"))]
pub type DefaultHost = hid::HidApiHost;

/// Construct the platform default host.
///
/// ### Errors
/// [`Error::InvalidCollections`](crate::Error::InvalidCollections) if the HID stack cannot be initialized.
#[cfg(any(target_os = "windows", feature = "hid"))]
pub fn default_host() -> Result<DefaultHost> {
    #[cfg(target_os = "windows")]
    {
        Ok(windows::WinHidHost::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        hid::HidApiHost::new().map_err(|e| {
            tracing::warn!("hidapi init failed: {e}");
            crate::error::Error::InvalidCollections
        })
    }
}

/// Unified discovery on the default host.
///
/// Uses `config.max_devices` output slots. When more controllers are present than
/// that, the filled slots are returned and the overflow is logged.
#[cfg(any(target_os = "windows", feature = "hid"))]
pub fn probe_devices(config: &DiscoveryConfig) -> Result<Vec<DeviceInfo>> {
    let host = default_host()?;
    let discovered = crate::discovery::collect_devices(&host, config)?;
    if discovered.truncated() {
        tracing::warn!(
            total = discovered.total,
            kept = discovered.devices.len(),
            "more controllers than max_devices; extra ones dropped"
        );
    }
    Ok(discovered.devices)
}
