//! DualSense discovery pipeline.
//!
//! This module walks every HID interface a [`HidHost`] exposes and keeps the ones
//! that are DualSense controllers:
//!
//! - Acquire the class-scoped device set (failure → [`Error::InvalidCollections`])
//! - For each device record, for each of its interface records:
//!   - size-query the interface path and reject anything over [`PATH_CAPACITY`]
//!     (aborts the whole scan with [`Error::InvalidPathSize`])
//!   - resolve the path into a scoped buffer (allocation failure →
//!     [`Error::StackOverflow`])
//!   - open the path; unopenable devices are skipped
//!   - match vendor/product identity against the [`DiscoveryConfig`]
//!   - read the capability descriptor and classify the transport by input report
//!     length (wired vs Bluetooth); other lengths are skipped and not counted
//! - Report the total found; more matches than output slots is
//!   [`Error::OutOfBounds`]
//!
//! Every per-interface resource (path buffer, device handle, capability descriptor)
//! is an owning value scoped to one iteration, so it is released on every exit path,
//! early aborts included.
//!
//! ## `enumerate_devices` vs `enumerate_devices_with_debug`
//! - [`enumerate_devices`] fills the caller's slots and returns the count.
//! - [`enumerate_devices_with_debug`] runs the same pipeline and additionally returns
//!   one [`InterfaceDebugInfo`] per interface describing where it was accepted or
//!   dropped (path → open → identity → descriptor → classification).
//!
//! The debug path exists for tooling (see the `diagnose` demo) without changing
//! runtime behavior.

use crate::backends::{CapsDescriptor, DeviceSet, HidAttributes, HidCaps, HidHandle, HidHost};
use crate::config::DiscoveryConfig;
use crate::constants::PATH_CAPACITY;
use crate::device::{ConnectionType, DeviceInfo, DevicePath};
use crate::error::{Error, Result};

/// Where along the discovery pipeline an interface was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropStage {
    /// The OS reported no path, or the fill query failed.
    PathUnresolved,

    /// The path could not be opened (busy, access-restricted, or gone).
    OpenFailed,

    /// The vendor/product query failed on an opened device.
    AttributesUnavailable,

    /// Opened fine, but it is not a controller this config looks for.
    IdentityMismatch { vendor_id: u16, product_id: u16 },

    /// The capability descriptor (or its caps) could not be read.
    DescriptorUnavailable,

    /// A matching controller whose input report length is neither transport's.
    Unclassified { input_report_len: u16 },

    /// This interface aborted the whole scan.
    ScanAborted(Error),
}

/// Debug view of a single interface seen during discovery.
#[derive(Debug, Clone)]
pub struct InterfaceDebugInfo {
    pub device_index: u32,
    pub interface_index: u32,

    /// Resolved path, if resolution got that far.
    pub path: Option<DevicePath>,

    /// Identity, if the device opened and answered.
    pub attributes: Option<HidAttributes>,

    /// Capabilities, if the descriptor was readable.
    pub caps: Option<HidCaps>,

    /// If `Some`, where the interface was dropped. `None` means it was accepted.
    pub drop_stage: Option<DropStage>,

    /// Transport of an accepted interface; `Undefined` otherwise.
    pub connection_type: ConnectionType,
}

impl InterfaceDebugInfo {
    fn new(device_index: u32, interface_index: u32) -> Self {
        Self {
            device_index,
            interface_index,
            path: None,
            attributes: None,
            caps: None,
            drop_stage: None,
            connection_type: ConnectionType::Undefined,
        }
    }

    /// `true` if this interface produced a [`DeviceInfo`].
    pub fn accepted(&self) -> bool {
        self.drop_stage.is_none()
    }
}

/// Classify a transport strictly by input report byte length.
///
/// Returns `None` for any length other than the configured wired/Bluetooth ones.
pub fn classify_transport(input_report_len: u16, config: &DiscoveryConfig) -> Option<ConnectionType> {
    if input_report_len == config.usb_input_report_len {
        Some(ConnectionType::Usb)
    } else if input_report_len == config.bt_input_report_len {
        Some(ConnectionType::Bluetooth)
    } else {
        None
    }
}

/// Discover DualSense controllers and write them into `out`.
///
/// The Nth classified controller goes into `out[N]`; nothing is written past
/// `out.len()`. Unfilled slots are left untouched.
///
/// ### Errors
/// - [`Error::InvalidCollections`] if the device set cannot be acquired.
/// - [`Error::InvalidPathSize`] if any interface path exceeds [`PATH_CAPACITY`].
/// - [`Error::StackOverflow`] if a path buffer cannot be allocated.
/// - [`Error::OutOfBounds`] if more controllers were found than `out` holds; the
///   slots that were filled are still valid.
pub fn enumerate_devices<H: HidHost>(
    host: &H,
    config: &DiscoveryConfig,
    out: &mut [DeviceInfo],
) -> Result<usize> {
    run_pipeline(host, config, out, |_| {})
}

/// Debug-aware variant of [`enumerate_devices`].
///
/// Returns the same result plus one record per interface visited. When the scan
/// aborts, the records cover the interfaces visited up to (and including) the one
/// that caused the abort.
pub fn enumerate_devices_with_debug<H: HidHost>(
    host: &H,
    config: &DiscoveryConfig,
    out: &mut [DeviceInfo],
) -> (Result<usize>, Vec<InterfaceDebugInfo>) {
    let mut debug = Vec::new();
    let result = run_pipeline(host, config, out, |dbg| debug.push(dbg));
    (result, debug)
}

/// Controllers returned by [`collect_devices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    /// Filled slots, in enumeration order. At most `config.max_devices` entries.
    pub devices: Vec<DeviceInfo>,

    /// Every classified controller seen, including those that did not fit.
    pub total: usize,
}

impl Discovered {
    /// `true` if more controllers were present than slots.
    pub fn truncated(&self) -> bool {
        self.total > self.devices.len()
    }
}

/// Run discovery into `config.max_devices` owned slots.
///
/// Unlike [`enumerate_devices`], overflow is not an error: the filled slots are
/// kept and [`Discovered::total`] carries the real count.
///
/// ### Errors
/// Every abort of [`enumerate_devices`] except [`Error::OutOfBounds`].
pub fn collect_devices<H: HidHost>(host: &H, config: &DiscoveryConfig) -> Result<Discovered> {
    let mut devices = vec![DeviceInfo::default(); config.max_devices];
    let total = match enumerate_devices(host, config, &mut devices) {
        Ok(found) => found,
        Err(Error::OutOfBounds { found, .. }) => found,
        Err(e) => return Err(e),
    };
    devices.truncate(total);
    Ok(Discovered { devices, total })
}

fn run_pipeline<H, F>(
    host: &H,
    config: &DiscoveryConfig,
    out: &mut [DeviceInfo],
    mut observe: F,
) -> Result<usize>
where
    H: HidHost,
    F: FnMut(InterfaceDebugInfo),
{
    let set = host.device_set().ok_or(Error::InvalidCollections)?;
    let capacity = out.len();
    let mut found = 0usize;

    let mut device_index = 0u32;
    while let Some(device) = set.device(device_index) {
        let mut interface_index = 0u32;
        while let Some(interface) = set.interface(&device, interface_index) {
            let mut dbg = InterfaceDebugInfo::new(device_index, interface_index);
            let probed = probe_interface(host, &set, &interface, config, &mut dbg);
            let accepted = match probed {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(device_index, interface_index, "discovery aborted: {e}");
                    dbg.drop_stage = Some(DropStage::ScanAborted(e.clone()));
                    observe(dbg);
                    return Err(e);
                }
            };
            observe(dbg);

            if let Some(info) = accepted {
                if let Some(slot) = out.get_mut(found) {
                    *slot = info;
                }
                found += 1;
            }
            interface_index += 1;
        }
        device_index += 1;
    }
    drop(set);

    tracing::info!(found, capacity, "DualSense discovery finished");
    if found > capacity {
        tracing::warn!(found, capacity, "more controllers than output slots");
        return Err(Error::OutOfBounds { found, capacity });
    }
    Ok(found)
}

/// Scoped path buffer of exactly `len` code units. Released when it goes out of scope.
fn path_buffer(len: usize) -> Result<Vec<u16>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::StackOverflow { len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Run one interface through path → open → identity → descriptor → classification.
///
/// `Ok(None)` means "skip this interface"; `Err` aborts the whole scan.
fn probe_interface<H: HidHost>(
    host: &H,
    set: &H::Set,
    interface: &<H::Set as DeviceSet>::Interface,
    config: &DiscoveryConfig,
    dbg: &mut InterfaceDebugInfo,
) -> Result<Option<DeviceInfo>> {
    let Some(len) = set.path_len(interface) else {
        dbg.drop_stage = Some(DropStage::PathUnresolved);
        return Ok(None);
    };
    if len > PATH_CAPACITY {
        return Err(Error::InvalidPathSize {
            required: len,
            capacity: PATH_CAPACITY,
        });
    }

    let path = {
        let mut buf = path_buffer(len)?;
        if !set.resolve_path(interface, &mut buf) {
            dbg.drop_stage = Some(DropStage::PathUnresolved);
            return Ok(None);
        }
        DevicePath::from_units(&buf)?
    };
    if path.is_empty() {
        dbg.drop_stage = Some(DropStage::PathUnresolved);
        return Ok(None);
    }
    dbg.path = Some(path);

    let Some(handle) = host.open(&path) else {
        tracing::trace!(%path, "skipping unopenable interface");
        dbg.drop_stage = Some(DropStage::OpenFailed);
        return Ok(None);
    };

    let Some(attrs) = handle.attributes() else {
        dbg.drop_stage = Some(DropStage::AttributesUnavailable);
        return Ok(None);
    };
    dbg.attributes = Some(attrs);
    if !config.matches(attrs.vendor_id, attrs.product_id) {
        dbg.drop_stage = Some(DropStage::IdentityMismatch {
            vendor_id: attrs.vendor_id,
            product_id: attrs.product_id,
        });
        return Ok(None);
    }

    let Some(caps) = handle.descriptor().and_then(|d| d.caps()) else {
        tracing::debug!(%path, "DualSense without readable capabilities");
        dbg.drop_stage = Some(DropStage::DescriptorUnavailable);
        return Ok(None);
    };
    dbg.caps = Some(caps);

    match classify_transport(caps.input_report_len, config) {
        Some(connection_type) => {
            tracing::debug!(
                %path,
                vid = format_args!("0x{:04x}", attrs.vendor_id),
                pid = format_args!("0x{:04x}", attrs.product_id),
                %connection_type,
                "found DualSense"
            );
            dbg.connection_type = connection_type;
            Ok(Some(DeviceInfo::new(path, connection_type)))
        }
        None => {
            tracing::debug!(
                %path,
                input_report_len = caps.input_report_len,
                "DualSense interface with unrecognized input report length"
            );
            dbg.drop_stage = Some(DropStage::Unclassified {
                input_report_len: caps.input_report_len,
            });
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_exact() {
        let c = DiscoveryConfig::default();
        assert_eq!(classify_transport(64, &c), Some(ConnectionType::Usb));
        assert_eq!(classify_transport(78, &c), Some(ConnectionType::Bluetooth));
        assert_eq!(classify_transport(63, &c), None);
        assert_eq!(classify_transport(547, &c), None);
        assert_eq!(classify_transport(0, &c), None);
    }

    #[test]
    fn classification_follows_config() {
        let c = DiscoveryConfig {
            usb_input_report_len: 10,
            bt_input_report_len: 20,
            ..DiscoveryConfig::default()
        };
        assert_eq!(classify_transport(10, &c), Some(ConnectionType::Usb));
        assert_eq!(classify_transport(64, &c), None);
    }

    #[test]
    fn path_buffer_has_exact_len() {
        let buf = path_buffer(PATH_CAPACITY).unwrap();
        assert_eq!(buf.len(), PATH_CAPACITY);
        assert!(buf.iter().all(|&u| u == 0));
    }

    // `probe_interface` only asks for `len <= PATH_CAPACITY`, so this abort cannot be
    // reached through the pipeline; the buffer is a `Vec` freed on every exit.
    #[test]
    fn path_buffer_reports_exhaustion() {
        assert_eq!(
            path_buffer(usize::MAX),
            Err(Error::StackOverflow { len: usize::MAX })
        );
    }
}
