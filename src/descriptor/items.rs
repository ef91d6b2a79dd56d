//! Raw short-item decoding, HID 1.11 section 6.2.2.2.
//!
//! Every short item is one prefix byte followed by 0, 1, 2 or 4 data bytes.
//! The prefix packs the tag in bits 7..4, the item type in bits 3..2 (main,
//! global or local) and the data size in bits 1..0, where a size field of 3
//! means 4 bytes. Data bytes accumulate little-endian.

use crate::error::HidError;

/// Long-item prefix; never emitted by the descriptors this crate supports.
const LONG_ITEM_PREFIX: u8 = 0xFE;

// Item type, bits 3..2 of the prefix.
const TYPE_MAIN: u8 = 0x0;
const TYPE_GLOBAL: u8 = 0x4;
const TYPE_LOCAL: u8 = 0x8;

/// Short-item tags this crate understands, named per HID 1.11 sections
/// 6.2.2.4 (main), 6.2.2.7 (global) and 6.2.2.8 (local).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ItemTag {
    // Main items: commit staged state into elements or the collection tree.
    Input,
    Output,
    Feature,
    Collection,
    EndCollection,
    // Global items: persist across main items.
    UsagePage,
    LogicalMinimum,
    LogicalMaximum,
    PhysicalMinimum,
    PhysicalMaximum,
    UnitExponent,
    Unit,
    ReportSize,
    ReportId,
    ReportCount,
    Push,
    Pop,
    // Local items: reset after every main item.
    Usage,
    UsageMinimum,
    UsageMaximum,
    DesignatorIndex,
    DesignatorMinimum,
    DesignatorMaximum,
    StringIndex,
    StringMinimum,
    StringMaximum,
    Delimiter,
}

impl ItemTag {
    /// Decodes a prefix byte by item type and tag nibble.
    pub fn from_prefix(prefix: u8) -> Option<Self> {
        match (prefix & 0x0C, prefix >> 4) {
            (TYPE_MAIN, 0x8) => Some(Self::Input),
            (TYPE_MAIN, 0x9) => Some(Self::Output),
            (TYPE_MAIN, 0xA) => Some(Self::Collection),
            (TYPE_MAIN, 0xB) => Some(Self::Feature),
            (TYPE_MAIN, 0xC) => Some(Self::EndCollection),
            (TYPE_GLOBAL, 0x0) => Some(Self::UsagePage),
            (TYPE_GLOBAL, 0x1) => Some(Self::LogicalMinimum),
            (TYPE_GLOBAL, 0x2) => Some(Self::LogicalMaximum),
            (TYPE_GLOBAL, 0x3) => Some(Self::PhysicalMinimum),
            (TYPE_GLOBAL, 0x4) => Some(Self::PhysicalMaximum),
            (TYPE_GLOBAL, 0x5) => Some(Self::UnitExponent),
            (TYPE_GLOBAL, 0x6) => Some(Self::Unit),
            (TYPE_GLOBAL, 0x7) => Some(Self::ReportSize),
            (TYPE_GLOBAL, 0x8) => Some(Self::ReportId),
            (TYPE_GLOBAL, 0x9) => Some(Self::ReportCount),
            (TYPE_GLOBAL, 0xA) => Some(Self::Push),
            (TYPE_GLOBAL, 0xB) => Some(Self::Pop),
            (TYPE_LOCAL, 0x0) => Some(Self::Usage),
            (TYPE_LOCAL, 0x1) => Some(Self::UsageMinimum),
            (TYPE_LOCAL, 0x2) => Some(Self::UsageMaximum),
            (TYPE_LOCAL, 0x3) => Some(Self::DesignatorIndex),
            (TYPE_LOCAL, 0x4) => Some(Self::DesignatorMinimum),
            (TYPE_LOCAL, 0x5) => Some(Self::DesignatorMaximum),
            (TYPE_LOCAL, 0x7) => Some(Self::StringIndex),
            (TYPE_LOCAL, 0x8) => Some(Self::StringMinimum),
            (TYPE_LOCAL, 0x9) => Some(Self::StringMaximum),
            (TYPE_LOCAL, 0xA) => Some(Self::Delimiter),
            _ => None,
        }
    }
}

/// One decoded short item.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawItem {
    pub tag: Option<ItemTag>,
    /// Prefix byte as it appeared on the wire, for logging unknown tags.
    pub prefix: u8,
    /// Data bytes accumulated little-endian; 0 when the item carries none.
    pub value: u32,
    /// Number of data bytes (0, 1, 2 or 4).
    pub data_size: u32,
}

/// Iterator over the short items of a descriptor byte stream.
pub struct RawItems<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RawItems<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl Iterator for RawItems<'_> {
    type Item = Result<RawItem, HidError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let offset = self.pos;
        let prefix = self.buf[offset];
        if prefix == LONG_ITEM_PREFIX {
            return Some(Err(HidError::DescriptorUnsupported { offset }));
        }
        let size_field = prefix & 0x03;
        let data_size = if size_field == 3 { 4 } else { u32::from(size_field) };
        self.pos += 1;
        let mut value = 0u32;
        for i in 0..data_size {
            match self.buf.get(self.pos) {
                Some(&byte) => value |= u32::from(byte) << (i * 8),
                None => return Some(Err(HidError::DescriptorTruncated { offset })),
            }
            self.pos += 1;
        }
        Some(Ok(RawItem {
            tag: ItemTag::from_prefix(prefix),
            prefix,
            value,
            data_size,
        }))
    }
}
