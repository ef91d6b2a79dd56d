//! Report-descriptor interpretation.
//!
//! The descriptor is a stream of short items (see [`items`]). Global items
//! accumulate in a staging register that persists across main items and can
//! be snapshotted with PUSH/POP; local items (usages and usage ranges) reset
//! after every main item. COLLECTION/END_COLLECTION maintain the tree,
//! INPUT/OUTPUT/FEATURE commit the staging register into `report_count`
//! elements.

mod items;
#[cfg(test)]
pub(crate) mod tests;

use log::{trace, warn};

use crate::bits::sign_extend;
use crate::model::{CollectionType, DeviceModel, ElementFields, IoType, MainFlags, ModelBuilder};
use crate::HidResult;

use items::{ItemTag, RawItem, RawItems};

/// Upper bound on queued USAGE items between two main items.
const MAX_LOCAL_USAGES: usize = 256;

/// Parses a raw HID report descriptor into a [`DeviceModel`].
///
/// Parsing is permissive: unknown and unhandled tags are skipped. Only a
/// buffer that ends mid-item or a long item (prefix 0xFE) is an error.
pub fn parse_report_descriptor(descr: &[u8]) -> HidResult<DeviceModel> {
    let mut parser = Parser::new();
    for item in RawItems::new(descr) {
        parser.item(item?);
    }
    Ok(parser.finish())
}

/// Global-scope staging state, HID 1.11 section 6.2.2.7.
#[derive(Debug, Default, Clone)]
struct GlobalItems {
    usage_page: u32,
    logical_min: i32,
    logical_max: i32,
    phys_min: i32,
    phys_max: i32,
    unit: u32,
    unit_exponent: i32,
    report_size: u32,
    report_id: u8,
    report_count: u32,
}

/// Local-scope staging state, cleared after every main item.
#[derive(Debug, Default)]
struct LocalItems {
    usage: u32,
    usages: Vec<u32>,
    usage_min: Option<u32>,
    usage_max: Option<u32>,
}

impl LocalItems {
    fn clear(&mut self) {
        self.usage = 0;
        self.usages.clear();
        self.usage_min = None;
        self.usage_max = None;
    }
}

struct Parser {
    builder: ModelBuilder,
    globals: GlobalItems,
    global_stack: Vec<GlobalItems>,
    locals: LocalItems,
}

impl Parser {
    fn new() -> Self {
        Self {
            builder: ModelBuilder::new(),
            globals: GlobalItems::default(),
            global_stack: Vec::new(),
            locals: LocalItems::default(),
        }
    }

    fn item(&mut self, item: RawItem) {
        let v = item.value;
        // Variable-width items sign-extend from however many data bytes were
        // on the wire, not from a fixed width.
        let signed = sign_extend(v, item.data_size * 8);
        let tag = match item.tag {
            Some(tag) => tag,
            None => {
                trace!("skipping unknown item prefix {:#04x} value {}", item.prefix, v);
                return;
            }
        };
        match tag {
            ItemTag::UsagePage => {
                trace!("usage page {:#06x}", v);
                self.globals.usage_page = v;
            }
            ItemTag::Usage => {
                trace!("usage {:#06x}", v);
                self.locals.usage = v;
                // A plain USAGE supersedes any pending usage range.
                self.locals.usage_min = None;
                self.locals.usage_max = None;
                if self.locals.usages.len() < MAX_LOCAL_USAGES {
                    self.locals.usages.push(v);
                } else {
                    warn!("dropping usage {:#06x}: more than {} usages queued", v, MAX_LOCAL_USAGES);
                }
            }
            ItemTag::UsageMinimum => {
                trace!("usage min {}", v);
                self.locals.usage_min = Some(v);
            }
            ItemTag::UsageMaximum => {
                trace!("usage max {}", v);
                self.locals.usage_max = Some(v);
            }
            ItemTag::LogicalMinimum => {
                trace!("logical min {}", signed);
                self.globals.logical_min = signed;
            }
            ItemTag::LogicalMaximum => {
                // A non-negative minimum marks the whole range unsigned, so
                // 0..0xFFFF style ranges keep their large maximum.
                self.globals.logical_max = if self.globals.logical_min >= 0 {
                    v as i32
                } else {
                    signed
                };
                trace!("logical max {}", self.globals.logical_max);
            }
            ItemTag::PhysicalMinimum => {
                trace!("physical min {}", signed);
                self.globals.phys_min = signed;
            }
            ItemTag::PhysicalMaximum => {
                self.globals.phys_max = if self.globals.phys_min >= 0 {
                    v as i32
                } else {
                    signed
                };
                trace!("physical max {}", self.globals.phys_max);
            }
            ItemTag::UnitExponent => {
                trace!("unit exponent {}", signed);
                self.globals.unit_exponent = signed;
            }
            ItemTag::Unit => {
                trace!("unit {:#010x}", v);
                self.globals.unit = v;
            }
            ItemTag::ReportSize => {
                trace!("report size {}", v);
                self.globals.report_size = v;
            }
            ItemTag::ReportId => {
                trace!("report id {}", v);
                self.globals.report_id = v as u8;
                self.builder.declare_report_id(v as u8);
            }
            ItemTag::ReportCount => {
                trace!("report count {}", v);
                self.globals.report_count = v;
            }
            ItemTag::Push => {
                trace!("push global state");
                self.global_stack.push(self.globals.clone());
            }
            ItemTag::Pop => {
                trace!("pop global state");
                match self.global_stack.pop() {
                    Some(globals) => self.globals = globals,
                    None => warn!("ignoring pop with empty global item stack"),
                }
            }
            ItemTag::Collection => {
                trace!("collection type {}", v);
                self.builder.begin_collection(
                    CollectionType::from(v),
                    self.globals.usage_page,
                    self.locals.usage,
                    self.locals.usage_min.unwrap_or(0),
                    self.locals.usage_max.unwrap_or(0),
                );
                self.locals.clear();
            }
            ItemTag::EndCollection => {
                trace!("end collection");
                self.locals.clear();
                // Siblings opened after the close inherit the closed
                // collection's usage page and usage.
                if let Some((usage_page, usage)) = self.builder.end_collection() {
                    self.globals.usage_page = usage_page;
                    self.locals.usage = usage;
                }
            }
            ItemTag::Input => self.emit(IoType::Input, v),
            ItemTag::Output => self.emit(IoType::Output, v),
            ItemTag::Feature => self.emit(IoType::Feature, v),
            ItemTag::DesignatorIndex
            | ItemTag::DesignatorMinimum
            | ItemTag::DesignatorMaximum
            | ItemTag::StringIndex
            | ItemTag::StringMinimum
            | ItemTag::StringMaximum
            | ItemTag::Delimiter => {
                trace!("ignoring {:?} value {}", tag, v);
            }
        }
    }

    /// Commits the staging register: one element per `report_count` slot.
    fn emit(&mut self, io_type: IoType, flags: u32) {
        trace!(
            "{:?} flags {:#05x}: {} x {} bits, report id {}",
            io_type,
            flags,
            self.globals.report_count,
            self.globals.report_size,
            self.globals.report_id
        );
        let (phys_min, phys_max) = if self.globals.phys_min == 0 && self.globals.phys_max == 0 {
            (self.globals.logical_min, self.globals.logical_max)
        } else {
            (self.globals.phys_min, self.globals.phys_max)
        };
        // Fields are 1..=32 bits wide; anything else cannot be decoded.
        let report_size = self.globals.report_size.clamp(1, 32);
        if report_size != self.globals.report_size {
            warn!("clamping report size {} to {}", self.globals.report_size, report_size);
        }
        for j in 0..self.globals.report_count {
            let usage = match self.locals.usage_min {
                Some(usage_min) => usage_min + j,
                None => self.locals.usages.get(j as usize).copied().unwrap_or(0),
            };
            self.builder.push_element(ElementFields {
                io_type,
                report_id: self.globals.report_id,
                report_size,
                report_index: j,
                usage_page: self.globals.usage_page,
                usage,
                usage_min: self.locals.usage_min.unwrap_or(0),
                usage_max: self.locals.usage_max.unwrap_or(0),
                logical_min: self.globals.logical_min,
                logical_max: self.globals.logical_max,
                phys_min,
                phys_max,
                unit: self.globals.unit,
                unit_exponent: self.globals.unit_exponent,
                flags: MainFlags(flags),
            });
        }
        self.locals.clear();
    }

    fn finish(self) -> DeviceModel {
        if !self.global_stack.is_empty() {
            warn!("{} unbalanced push item(s) at end of descriptor", self.global_stack.len());
        }
        self.builder.finish()
    }
}
