//! In-memory HID host for exercising discovery and sessions without hardware.
//!
//! Every set, handle, and descriptor it hands out bumps a live counter on creation
//! and drops it again on `Drop`, so tests can assert nothing leaks on any path.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;
use std::rc::Rc;

use dualsense_probe::constants::{
    BT_INPUT_REPORT_LEN, DUALSENSE_PRODUCT_ID, SONY_VENDOR_ID, USB_INPUT_REPORT_LEN,
};
use dualsense_probe::{
    CapsDescriptor, DevicePath, DeviceSet, HidAttributes, HidCaps, HidHandle, HidHost,
};

#[derive(Default, Debug)]
pub struct Counters {
    pub live_sets: Cell<i64>,
    pub live_handles: Cell<i64>,
    pub live_descriptors: Cell<i64>,
    pub set_acquires: Cell<u32>,
    pub opens: Cell<u32>,
}

impl Counters {
    pub fn assert_released(&self) {
        assert_eq!(self.live_sets.get(), 0, "device set leaked");
        assert_eq!(self.live_handles.get(), 0, "device handle leaked");
        assert_eq!(self.live_descriptors.get(), 0, "descriptor leaked");
    }
}

fn bump(c: &Cell<i64>, by: i64) {
    c.set(c.get() + by);
}

/// One interface record as the enumeration layer reports it.
#[derive(Clone, Debug)]
pub struct FakeInterface {
    pub path: String,
    /// Overrides the size query result (terminator included).
    pub path_len: Option<Option<usize>>,
    pub resolve_fails: bool,
}

impl FakeInterface {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            path_len: None,
            resolve_fails: false,
        }
    }

    pub fn with_path_len(mut self, len: Option<usize>) -> Self {
        self.path_len = Some(len);
        self
    }

    pub fn failing_resolve(mut self) -> Self {
        self.resolve_fails = true;
        self
    }
}

/// What answers when a path is opened.
#[derive(Clone, Debug)]
pub struct FakeHid {
    pub attributes: Option<HidAttributes>,
    pub input_report_len: u16,
    pub descriptor_fails: bool,
}

impl FakeHid {
    pub fn new(vendor_id: u16, product_id: u16, input_report_len: u16) -> Self {
        Self {
            attributes: Some(HidAttributes {
                vendor_id,
                product_id,
                version: 0x0100,
            }),
            input_report_len,
            descriptor_fails: false,
        }
    }

    pub fn dualsense_usb() -> Self {
        Self::new(SONY_VENDOR_ID, DUALSENSE_PRODUCT_ID, USB_INPUT_REPORT_LEN)
    }

    pub fn dualsense_bt() -> Self {
        Self::new(SONY_VENDOR_ID, DUALSENSE_PRODUCT_ID, BT_INPUT_REPORT_LEN)
    }

    pub fn without_attributes(mut self) -> Self {
        self.attributes = None;
        self
    }

    pub fn without_descriptor(mut self) -> Self {
        self.descriptor_fails = true;
        self
    }
}

#[derive(Default)]
pub struct FakeHost {
    devices: Vec<Vec<FakeInterface>>,
    hids: HashMap<String, FakeHid>,
    unplugged: Rc<RefCell<HashSet<String>>>,
    set_fails: bool,
    pub counters: Rc<Counters>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device record with one interface per `(path, hid)` pair. A `None` hid
    /// makes the path unopenable.
    pub fn device(mut self, interfaces: Vec<(FakeInterface, Option<FakeHid>)>) -> Self {
        let mut record = Vec::new();
        for (iface, hid) in interfaces {
            if let Some(hid) = hid {
                self.hids.insert(iface.path.clone(), hid);
            }
            record.push(iface);
        }
        self.devices.push(record);
        self
    }

    /// Shorthand for a single-interface device.
    pub fn single(self, path: &str, hid: Option<FakeHid>) -> Self {
        self.device(vec![(FakeInterface::new(path), hid)])
    }

    pub fn failing_set(mut self) -> Self {
        self.set_fails = true;
        self
    }

    /// Make `path` unopenable and fail reads on handles already open to it.
    pub fn unplug(&self, path: &str) {
        self.unplugged.borrow_mut().insert(path.to_string());
    }
}

pub struct FakeSet {
    devices: Vec<Vec<FakeInterface>>,
    counters: Rc<Counters>,
}

impl Drop for FakeSet {
    fn drop(&mut self) {
        bump(&self.counters.live_sets, -1);
    }
}

impl DeviceSet for FakeSet {
    type Device = usize;
    type Interface = FakeInterface;

    fn device(&self, index: u32) -> Option<usize> {
        let index = index as usize;
        (index < self.devices.len()).then_some(index)
    }

    fn interface(&self, device: &usize, index: u32) -> Option<FakeInterface> {
        self.devices.get(*device)?.get(index as usize).cloned()
    }

    fn path_len(&self, interface: &FakeInterface) -> Option<usize> {
        match interface.path_len {
            Some(len) => len,
            None => Some(interface.path.encode_utf16().count() + 1),
        }
    }

    fn resolve_path(&self, interface: &FakeInterface, out: &mut [u16]) -> bool {
        if interface.resolve_fails {
            return false;
        }
        let units: Vec<u16> = interface.path.encode_utf16().collect();
        if units.len() + 1 > out.len() {
            return false;
        }
        out[..units.len()].copy_from_slice(&units);
        out[units.len()] = 0;
        true
    }
}

pub struct FakeHandle {
    path: String,
    hid: FakeHid,
    unplugged: Rc<RefCell<HashSet<String>>>,
    counters: Rc<Counters>,
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        bump(&self.counters.live_handles, -1);
    }
}

pub struct FakeDescriptor {
    input_report_len: u16,
    counters: Rc<Counters>,
}

impl Drop for FakeDescriptor {
    fn drop(&mut self) {
        bump(&self.counters.live_descriptors, -1);
    }
}

impl CapsDescriptor for FakeDescriptor {
    fn caps(&self) -> Option<HidCaps> {
        Some(HidCaps {
            usage_page: 0x0001,
            usage: 0x0005,
            input_report_len: self.input_report_len,
            output_report_len: 48,
            feature_report_len: 64,
        })
    }
}

impl HidHandle for FakeHandle {
    type Descriptor = FakeDescriptor;

    fn attributes(&self) -> Option<HidAttributes> {
        self.hid.attributes
    }

    fn descriptor(&self) -> Option<FakeDescriptor> {
        if self.hid.descriptor_fails {
            return None;
        }
        bump(&self.counters.live_descriptors, 1);
        Some(FakeDescriptor {
            input_report_len: self.hid.input_report_len,
            counters: Rc::clone(&self.counters),
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.unplugged.borrow().contains(&self.path) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        let n = (self.hid.input_report_len as usize).min(buf.len());
        if n > 0 {
            buf[0] = 0x01;
            for (i, b) in buf[1..n].iter_mut().enumerate() {
                *b = i as u8;
            }
        }
        Ok(n)
    }
}

impl HidHost for FakeHost {
    type Set = FakeSet;
    type Handle = FakeHandle;

    fn device_set(&self) -> Option<FakeSet> {
        let counters = &self.counters;
        counters.set_acquires.set(counters.set_acquires.get() + 1);
        if self.set_fails {
            return None;
        }
        bump(&counters.live_sets, 1);
        Some(FakeSet {
            devices: self.devices.clone(),
            counters: Rc::clone(counters),
        })
    }

    fn open(&self, path: &DevicePath) -> Option<FakeHandle> {
        let counters = &self.counters;
        counters.opens.set(counters.opens.get() + 1);
        let key = path.to_string_lossy();
        if self.unplugged.borrow().contains(&key) {
            return None;
        }
        let hid = self.hids.get(&key)?.clone();
        bump(&counters.live_handles, 1);
        Some(FakeHandle {
            path: key,
            hid,
            unplugged: Rc::clone(&self.unplugged),
            counters: Rc::clone(counters),
        })
    }
}
