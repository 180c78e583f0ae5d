//! Report-length extraction from raw HID report descriptors.
//!
//! Non-Windows stacks hand out the raw report descriptor instead of HIDP
//! "preparsed data". This module walks the descriptor items and derives the same
//! numbers `HidP_GetCaps` reports on Windows:
//!
//! - per main-item kind (Input/Output/Feature), the data bits of every report ID are
//!   summed (`Report Size * Report Count` per main item);
//! - the longest report of each kind is rounded up to whole bytes;
//! - one byte is added for the report ID prefix, which Windows counts even when the
//!   device does not number its reports.
//!
//! The top-level usage page/usage is taken from the first application collection.
//!
//! Only short items carry meaning here; long items are skipped. Truncated
//! descriptors are rejected.

use std::collections::BTreeMap;

use super::HidCaps;

// Item types (bits 2..3 of the prefix)
const TYPE_MAIN: u8 = 0;
const TYPE_GLOBAL: u8 = 1;
const TYPE_LOCAL: u8 = 2;

// Main item tags
const MAIN_INPUT: u8 = 0x8;
const MAIN_OUTPUT: u8 = 0x9;
const MAIN_COLLECTION: u8 = 0xA;
const MAIN_FEATURE: u8 = 0xB;
const MAIN_END_COLLECTION: u8 = 0xC;

// Global item tags
const GLOBAL_USAGE_PAGE: u8 = 0x0;
const GLOBAL_REPORT_SIZE: u8 = 0x7;
const GLOBAL_REPORT_ID: u8 = 0x8;
const GLOBAL_REPORT_COUNT: u8 = 0x9;
const GLOBAL_PUSH: u8 = 0xA;
const GLOBAL_POP: u8 = 0xB;

// Local item tags
const LOCAL_USAGE: u8 = 0x0;

const LONG_ITEM_PREFIX: u8 = 0xFE;

/// Global item state that Push/Pop save and restore.
#[derive(Clone, Copy, Debug, Default)]
struct Globals {
    usage_page: u16,
    report_size: u32,
    report_count: u32,
    report_id: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReportKind {
    Input = 0,
    Output = 1,
    Feature = 2,
}

/// Derive [`HidCaps`] from a raw report descriptor.
///
/// Returns `None` if the descriptor is empty or truncated mid-item.
pub fn parse_caps(desc: &[u8]) -> Option<HidCaps> {
    if desc.is_empty() {
        return None;
    }

    let mut globals = Globals::default();
    let mut stack: Vec<Globals> = Vec::new();
    let mut first_usage: Option<u16> = None;
    let mut depth: usize = 0;
    let mut top_level: Option<(u16, u16)> = None;

    // kind → report_id → data bits
    let mut bits: [BTreeMap<u8, u32>; 3] = Default::default();

    let mut i = 0usize;
    while i < desc.len() {
        let prefix = desc[i];

        if prefix == LONG_ITEM_PREFIX {
            let data_len = *desc.get(i + 1)? as usize;
            i += 3 + data_len;
            if i > desc.len() {
                return None;
            }
            continue;
        }

        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let item_type = (prefix >> 2) & 0x03;
        let tag = prefix >> 4;

        let data = desc.get(i + 1..i + 1 + size)?;
        let value = data
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        i += 1 + size;

        match item_type {
            TYPE_MAIN => {
                let kind = match tag {
                    MAIN_INPUT => Some(ReportKind::Input),
                    MAIN_OUTPUT => Some(ReportKind::Output),
                    MAIN_FEATURE => Some(ReportKind::Feature),
                    MAIN_COLLECTION => {
                        if depth == 0 && top_level.is_none() {
                            top_level = Some((globals.usage_page, first_usage.unwrap_or(0)));
                        }
                        depth += 1;
                        None
                    }
                    MAIN_END_COLLECTION => {
                        depth = depth.saturating_sub(1);
                        None
                    }
                    _ => None,
                };
                if let Some(kind) = kind {
                    let field_bits = globals.report_size.saturating_mul(globals.report_count);
                    let slot = bits[kind as usize].entry(globals.report_id).or_insert(0);
                    *slot = slot.saturating_add(field_bits);
                }
                // Local items only live until the next main item.
                first_usage = None;
            }
            TYPE_GLOBAL => match tag {
                GLOBAL_USAGE_PAGE => globals.usage_page = value as u16,
                GLOBAL_REPORT_SIZE => globals.report_size = value,
                GLOBAL_REPORT_ID => globals.report_id = value as u8,
                GLOBAL_REPORT_COUNT => globals.report_count = value,
                GLOBAL_PUSH => stack.push(globals),
                GLOBAL_POP => {
                    if let Some(saved) = stack.pop() {
                        globals = saved;
                    }
                }
                _ => {}
            },
            TYPE_LOCAL => {
                if tag == LOCAL_USAGE && first_usage.is_none() {
                    first_usage = Some(value as u16);
                }
            }
            _ => {}
        }
    }

    let (usage_page, usage) = top_level.unwrap_or_default();
    Some(HidCaps {
        usage_page,
        usage,
        input_report_len: report_len(&bits[ReportKind::Input as usize]),
        output_report_len: report_len(&bits[ReportKind::Output as usize]),
        feature_report_len: report_len(&bits[ReportKind::Feature as usize]),
    })
}

/// Longest report in bytes plus the report ID byte; `0` when there are no reports.
fn report_len(by_id: &BTreeMap<u8, u32>) -> u16 {
    by_id
        .values()
        .map(|&b| b.div_ceil(8))
        .max()
        .map(|bytes| u16::try_from(bytes + 1).unwrap_or(u16::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gamepad with numbered reports: input 0x01 (6 axes + 57 vendor bytes),
    /// output 0x02 (47 bytes), feature 0x05 (40 bytes).
    const WIRED_LIKE: &[u8] = &[
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x05, // Usage (Game Pad)
        0xA1, 0x01, // Collection (Application)
        0x85, 0x01, //   Report ID (1)
        0x09, 0x30, 0x09, 0x31, 0x09, 0x32, 0x09, 0x35, 0x09, 0x33, 0x09, 0x34,
        0x15, 0x00, //   Logical Minimum (0)
        0x26, 0xFF, 0x00, // Logical Maximum (255)
        0x75, 0x08, //   Report Size (8)
        0x95, 0x06, //   Report Count (6)
        0x81, 0x02, //   Input (Data,Var,Abs)
        0x06, 0x00, 0xFF, // Usage Page (Vendor 0xFF00)
        0x09, 0x20, //   Usage (0x20)
        0x95, 0x39, //   Report Count (57)
        0x81, 0x02, //   Input
        0x85, 0x02, //   Report ID (2)
        0x09, 0x21, //   Usage (0x21)
        0x95, 0x2F, //   Report Count (47)
        0x91, 0x02, //   Output
        0x85, 0x05, //   Report ID (5)
        0x09, 0x22, //   Usage (0x22)
        0x95, 0x28, //   Report Count (40)
        0xB1, 0x02, //   Feature
        0xC0, // End Collection
    ];

    #[test]
    fn numbered_reports_count_id_byte() {
        let caps = parse_caps(WIRED_LIKE).unwrap();
        assert_eq!(caps.usage_page, 0x01);
        assert_eq!(caps.usage, 0x05);
        assert_eq!(caps.input_report_len, 64);
        assert_eq!(caps.output_report_len, 48);
        assert_eq!(caps.feature_report_len, 41);
    }

    #[test]
    fn longest_input_report_wins() {
        let desc = [
            0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, // GD / Game Pad / Collection
            0x75, 0x08, // Report Size (8)
            0x85, 0x01, 0x09, 0x30, 0x95, 0x09, 0x81, 0x02, // RID 1: 9 bytes
            0x85, 0x31, 0x09, 0x31, 0x95, 0x4D, 0x81, 0x02, // RID 0x31: 77 bytes
            0xC0,
        ];
        let caps = parse_caps(&desc).unwrap();
        assert_eq!(caps.input_report_len, 78);
        assert_eq!(caps.output_report_len, 0);
    }

    #[test]
    fn unnumbered_report_still_counts_prefix() {
        let desc = [
            0x05, 0x01, 0x09, 0x04, 0xA1, 0x01, // GD / Joystick / Collection
            0x75, 0x01, 0x95, 0x0C, 0x81, 0x02, // 12 one-bit buttons
            0x75, 0x08, 0x95, 0x02, 0x81, 0x02, // 2 bytes
            0xC0,
        ];
        let caps = parse_caps(&desc).unwrap();
        assert_eq!(caps.usage, 0x04);
        // 12 + 16 bits = 28 bits → 4 bytes, + report ID byte
        assert_eq!(caps.input_report_len, 5);
    }

    #[test]
    fn push_pop_restore_report_size() {
        let desc = [
            0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, //
            0x75, 0x08, 0x95, 0x01, // size 8, count 1
            0xA4, // Push
            0x75, 0x10, 0x95, 0x02, 0x81, 0x02, // 2 × 16 bits
            0xB4, // Pop
            0x81, 0x02, // 1 × 8 bits with restored globals
            0xC0,
        ];
        let caps = parse_caps(&desc).unwrap();
        assert_eq!(caps.input_report_len, 1 + 4 + 1);
    }

    #[test]
    fn truncated_descriptor_is_rejected() {
        assert_eq!(parse_caps(&[0x05, 0x01, 0x26, 0xFF]), None);
        assert_eq!(parse_caps(&[]), None);
    }
}
