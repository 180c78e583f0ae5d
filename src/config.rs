//! Discovery configuration.
//!
//! [`DiscoveryConfig`] carries the identity filter and the report lengths used to
//! classify transports. The defaults are the compile-time constants in
//! [`constants`](crate::constants); a TOML file can override any subset of fields.
//!
//! ```toml
//! vendor_id = 0x054C
//! product_ids = [0x0CE6]
//! max_devices = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BT_INPUT_REPORT_LEN, DUALSENSE_EDGE_PRODUCT_ID, DUALSENSE_PRODUCT_ID, MAX_CONTROLLERS,
    SONY_VENDOR_ID, USB_INPUT_REPORT_LEN,
};

/// Errors raised while loading or saving a [`DiscoveryConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config invalid: {0}")]
    Invalid(&'static str),
}

/// Identity filter and classification thresholds for discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Vendor ID a device must report.
    pub vendor_id: u16,
    /// Product IDs accepted under `vendor_id`.
    pub product_ids: Vec<u16>,
    /// Input report length (report ID included) that marks a wired controller.
    pub usb_input_report_len: u16,
    /// Input report length (report ID included) that marks a Bluetooth controller.
    pub bt_input_report_len: u16,
    /// Output slots used by [`probe_devices`](crate::backends::probe_devices).
    pub max_devices: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            vendor_id: SONY_VENDOR_ID,
            product_ids: vec![DUALSENSE_PRODUCT_ID, DUALSENSE_EDGE_PRODUCT_ID],
            usb_input_report_len: USB_INPUT_REPORT_LEN,
            bt_input_report_len: BT_INPUT_REPORT_LEN,
            max_devices: MAX_CONTROLLERS,
        }
    }
}

impl DiscoveryConfig {
    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `true` if `(vid, pid)` is a controller this config looks for.
    #[inline]
    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        vid == self.vendor_id && self.product_ids.contains(&pid)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.product_ids.is_empty() {
            return Err(ConfigError::Invalid("product_ids must not be empty"));
        }
        if self.usb_input_report_len == self.bt_input_report_len {
            return Err(ConfigError::Invalid(
                "usb and bluetooth input report lengths must differ",
            ));
        }
        if self.max_devices == 0 {
            return Err(ConfigError::Invalid("max_devices must be at least 1"));
        }
        Ok(())
    }
}
