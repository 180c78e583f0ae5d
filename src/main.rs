//! `dualsense-probe`: list connected DualSense controllers and open the first one.
//!
//! Log verbosity follows `RUST_LOG` (default `dualsense_probe=info`). A config file
//! path may be passed as the first argument; otherwise built-in defaults are used.
//!
//! The process exit status is the numeric [`ResultCode`] of the session attempt.

use std::process::ExitCode;

use dualsense_probe::ResultCode;

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dualsense_probe=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn exit_with(code: ResultCode) -> ExitCode {
    ExitCode::from(i32::from(code) as u8)
}

#[cfg(any(target_os = "windows", feature = "hid"))]
fn load_config() -> Result<dualsense_probe::DiscoveryConfig, dualsense_probe::ConfigError> {
    use dualsense_probe::DiscoveryConfig;

    match std::env::args_os().nth(1) {
        Some(path) => DiscoveryConfig::load(std::path::Path::new(&path)),
        None => Ok(DiscoveryConfig::default()),
    }
}

/// Headline for a listing of `shown` controllers out of `total` discovered.
#[cfg_attr(not(any(target_os = "windows", feature = "hid")), allow(dead_code))]
fn summary_line(shown: usize, total: usize) -> String {
    if total == 0 {
        "No DualSense controllers found.".to_string()
    } else if shown < total {
        format!("Found {total} DualSense controller(s), showing the first {shown}:")
    } else {
        format!("Found {total} DualSense controller(s):")
    }
}

#[cfg(any(target_os = "windows", feature = "hid"))]
fn main() -> ExitCode {
    use dualsense_probe::{collect_devices, default_host, init_device};

    init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            return exit_with(ResultCode::InvalidArgs);
        }
    };

    let host = match default_host() {
        Ok(host) => host,
        Err(e) => {
            eprintln!("HID host unavailable: {e}");
            return exit_with(e.code());
        }
    };

    let discovered = match collect_devices(&host, &config) {
        Ok(discovered) => discovered,
        Err(e) => {
            eprintln!("discovery failed: {e}");
            return exit_with(e.code());
        }
    };
    if discovered.truncated() {
        tracing::warn!(
            "{} controllers present, only {} slots configured",
            discovered.total,
            discovered.devices.len()
        );
    }

    println!("{}", summary_line(discovered.devices.len(), discovered.total));
    let found = &discovered.devices;
    if found.is_empty() {
        return exit_with(ResultCode::Success);
    }

    for (i, info) in found.iter().enumerate() {
        match serde_json::to_string(info) {
            Ok(json) => println!("  [{i}] {json}"),
            Err(_) => println!("  [{i}] {info}"),
        }
    }

    match init_device(&host, found.first()) {
        Ok(device) => {
            println!(
                "Opened {} over {}",
                device.path(),
                device.connection_type()
            );
            device.close();
            exit_with(ResultCode::Success)
        }
        Err(e) => {
            eprintln!("could not open {}: {e}", found[0].path);
            exit_with(e.code())
        }
    }
}

#[cfg(not(any(target_os = "windows", feature = "hid")))]
fn main() -> ExitCode {
    init_logging();
    eprintln!("no HID host on this platform; rebuild with the `hid` feature");
    exit_with(ResultCode::InvalidCollections)
}
