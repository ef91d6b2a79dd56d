// **************************************************************************
// Copyright (c) 2026 The hidrep Authors. Released under the MIT license.
//
// This file is part of hidrep.
// **************************************************************************

//! Parser for USB HID report descriptors and codec for the bit-packed
//! input/output/feature reports they describe.
//!
//! A HID report descriptor is a compact TLV byte program declaring the
//! structure of every report a device exchanges with the host.
//! [`parse_report_descriptor`] interprets that program into a [`DeviceModel`]:
//! a tree of collections holding typed elements (buttons, axes, LEDs, feature
//! controls), each annotated with its report id, bit width, logical/physical
//! ranges, usage codes and flags. The codec in [`report`] then maps those
//! elements onto wire payloads in both directions: decoding incoming input
//! reports into per-element values and assembling outgoing output reports
//! from them.
//!
//! The crate does not talk to hardware. A HID transport (hidraw, IOKit,
//! libusb, a test double, ...) plugs in through the [`HidTransport`] and
//! [`HidBackend`] traits, and [`HidDevice`] ties transport and model
//! together. On platforms where the OS HID manager already exposes parsed
//! element metadata, [`ModelBuilder`] builds the same [`DeviceModel`] from
//! that metadata instead of from raw descriptor bytes.

mod bits;
mod descriptor;
mod device;
mod error;
mod model;
pub mod report;

pub use bits::{sign_extend, BitReader, BitWriter, EndOfBuffer};
pub use descriptor::parse_report_descriptor;
pub use device::{BusType, DeviceInfo, HidBackend, HidDevice, HidTransport};
pub use error::HidError;
pub use model::{
    Collection, CollectionId, CollectionType, DeviceModel, Element, ElementFields, ElementId,
    IoType, MainFlags, ModelBuilder, Report,
};

pub type HidResult<T> = Result<T, HidError>;
