//! Fixed identifiers and capacities for DualSense discovery.

/// Sony Interactive Entertainment vendor ID.
pub const SONY_VENDOR_ID: u16 = 0x054C;

/// DualSense (CFI-ZCT1) product ID.
pub const DUALSENSE_PRODUCT_ID: u16 = 0x0CE6;

/// DualSense Edge product ID. Uses the same input report layout as the base pad.
pub const DUALSENSE_EDGE_PRODUCT_ID: u16 = 0x0DF2;

/// Input report byte length (report ID included) of a wired controller.
pub const USB_INPUT_REPORT_LEN: u16 = 64;

/// Input report byte length (report ID included) of a Bluetooth controller.
pub const BT_INPUT_REPORT_LEN: u16 = 78;

/// Device path capacity in UTF-16 code units, terminator included.
pub const PATH_CAPACITY: usize = 260;

/// Session scratch buffer, sized for the largest wireless input report.
pub const HID_BUFFER_LEN: usize = 547;

/// Default number of output slots used by [`probe_devices`](crate::backends::probe_devices)
/// and the command-line entry point.
pub const MAX_CONTROLLERS: usize = 16;
