//! dualsense-probe: DualSense discovery and session setup for Rust.
//!
//! Finds Sony DualSense controllers among the host's HID interfaces, tells wired
//! from Bluetooth connections by the input report length their capability
//! descriptor advertises, and opens a read/write session on one of them.
//!
//! ```no_run
//! use dualsense_probe::{init_device, probe_devices, default_host, DiscoveryConfig};
//!
//! let config = DiscoveryConfig::default();
//! let found = probe_devices(&config).expect("discover controllers");
//! if let Some(first) = found.first() {
//!     let host = default_host().expect("HID host");
//!     let device = init_device(&host, Some(first)).expect("open controller");
//!     println!("{} over {}", device.path(), device.connection_type());
//! }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod device;
pub mod discovery;
pub mod error;
pub mod session;

#[cfg(any(target_os = "windows", feature = "hid"))]
pub use backends::{default_host, probe_devices, DefaultHost};
pub use backends::{CapsDescriptor, DeviceSet, HidAttributes, HidCaps, HidHandle, HidHost};
pub use config::{ConfigError, DiscoveryConfig};
pub use device::{ConnectionType, DeviceInfo, DevicePath};
pub use discovery::{
    classify_transport, collect_devices, enumerate_devices, enumerate_devices_with_debug,
    Discovered, DropStage, InterfaceDebugInfo,
};
pub use error::{Error, Result, ResultCode};
pub use session::{init_device, Device};
