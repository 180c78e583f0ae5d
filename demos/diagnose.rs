//! Walk every HID interface and show where each one leaves the DualSense pipeline.
//!
//! `RUST_LOG=dualsense_probe=trace cargo run --example diagnose`

use dualsense_probe::{
    default_host, enumerate_devices_with_debug, DeviceInfo, DiscoveryConfig, DropStage,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dualsense_probe=debug")),
        )
        .init();

    let config = DiscoveryConfig::default();
    let host = default_host().expect("init HID host");
    let mut slots = vec![DeviceInfo::default(); config.max_devices];

    let (result, interfaces) = enumerate_devices_with_debug(&host, &config, &mut slots);

    for dbg in &interfaces {
        let path = dbg
            .path
            .map(|p| p.to_string_lossy())
            .unwrap_or_else(|| "<unresolved>".into());
        let ids = dbg
            .attributes
            .map(|a| format!("{:04x}:{:04x}", a.vendor_id, a.product_id))
            .unwrap_or_else(|| "----:----".into());
        let input = dbg
            .caps
            .map(|c| c.input_report_len.to_string())
            .unwrap_or_else(|| "-".into());
        let verdict = match &dbg.drop_stage {
            None => format!("ACCEPTED ({})", dbg.connection_type),
            Some(DropStage::IdentityMismatch { .. }) => "not a DualSense".into(),
            Some(DropStage::Unclassified { input_report_len }) => {
                format!("unknown input length {input_report_len}")
            }
            Some(DropStage::ScanAborted(e)) => format!("ABORTED: {e}"),
            Some(stage) => format!("{stage:?}"),
        };
        println!(
            "dev={} if={} ids={} in={} {} path={}",
            dbg.device_index, dbg.interface_index, ids, input, verdict, path
        );
    }

    match result {
        Ok(n) => println!("{n} controller(s) found across {} interface(s)", interfaces.len()),
        Err(e) => println!("discovery ended with {e} (code {})", i32::from(e.code())),
    }
}
