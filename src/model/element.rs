use crate::bits::sign_extend;
use crate::model::CollectionId;

/// Report direction a field belongs to, HID 1.11 section 7.2.1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum IoType {
    Input = 1,
    Output = 2,
    Feature = 3,
}

/// Collection kinds, HID 1.11 section 6.2.2.6.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum CollectionType {
    Physical = 0x00,
    Application = 0x01,
    Logical = 0x02,
    Report = 0x03,
    NamedArray = 0x04,
    UsageSwitch = 0x05,
    UsageModifier = 0x06,
    Reserved = 0x07,
    Vendor = 0x80,
}

impl From<u32> for CollectionType {
    fn from(value: u32) -> Self {
        match value {
            0x00 => Self::Physical,
            0x01 => Self::Application,
            0x02 => Self::Logical,
            0x03 => Self::Report,
            0x04 => Self::NamedArray,
            0x05 => Self::UsageSwitch,
            0x06 => Self::UsageModifier,
            0x80..=0xFF => Self::Vendor,
            _ => Self::Reserved,
        }
    }
}

/// The data word of an INPUT/OUTPUT/FEATURE item, HID 1.11 section 6.2.2.5.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct MainFlags(pub u32);

impl MainFlags {
    pub fn constant(self) -> bool {
        self.0 & 0x001 != 0 // data(0), constant(1)
    }
    pub fn variable(self) -> bool {
        self.0 & 0x002 != 0 // array(0), variable(1)
    }
    pub fn relative(self) -> bool {
        self.0 & 0x004 != 0 // absolute(0), relative(1)
    }
    pub fn wrap(self) -> bool {
        self.0 & 0x008 != 0 // no wrap(0), wrap(1)
    }
    pub fn non_linear(self) -> bool {
        self.0 & 0x010 != 0 // linear(0), non linear(1)
    }
    pub fn no_preferred(self) -> bool {
        self.0 & 0x020 != 0 // preferred state(0), no preferred(1)
    }
    pub fn has_null(self) -> bool {
        self.0 & 0x040 != 0 // no null(0), null state(1)
    }
    pub fn is_volatile(self) -> bool {
        self.0 & 0x080 != 0 // non volatile(0), volatile(1)
    }
    pub fn buffered_bytes(self) -> bool {
        self.0 & 0x100 != 0 // bit field(0), buffered bytes(1)
    }
}

/// A single bit-field within some report.
///
/// Static fields come from the descriptor (or from platform element
/// enumeration); `raw_value`, `value`, `array_value` and `usage` (for array
/// elements) are updated by the report codec.
#[derive(Debug, Clone)]
pub struct Element {
    pub io_type: IoType,
    /// 0 when the device uses no report ids.
    pub report_id: u8,
    /// Field width in bits, 1..=32.
    pub report_size: u32,
    /// Position within the repeat count of the emitting main item.
    pub report_index: u32,
    pub usage_page: u32,
    pub usage: u32,
    pub usage_min: u32,
    pub usage_max: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    /// Physical range; inherits the logical range when the descriptor leaves
    /// both ends zero.
    pub phys_min: i32,
    pub phys_max: i32,
    pub unit: u32,
    pub unit_exponent: i32,
    pub flags: MainFlags,
    /// Position in the flat declaration-order element list.
    pub index: usize,
    /// When set, the codec fires the element callback even if the raw value
    /// did not change.
    pub repeat: bool,
    /// Last raw bit-field seen by the codec.
    pub raw_value: u32,
    /// Signed interpretation of the raw value, or the pressed flag for array
    /// elements.
    pub value: i32,
    /// Usage offset for array inputs, 0 when released.
    pub array_value: u32,
    pub(crate) parent: CollectionId,
}

impl Element {
    pub fn parent(&self) -> CollectionId {
        self.parent
    }

    pub fn is_variable(&self) -> bool {
        !self.flags.constant() && self.flags.variable()
    }

    /// Array elements report "which usage is asserted" as an index rather
    /// than one value per usage.
    pub fn is_array(&self) -> bool {
        !self.flags.variable()
    }

    pub fn is_relative(&self) -> bool {
        self.flags.relative()
    }

    /// Interprets a raw bit-field from an input report and stores it.
    ///
    /// Fields with a negative logical minimum carry two's-complement values;
    /// array fields carry a usage index (0 = released); everything else is
    /// taken unsigned.
    pub fn set_value_from_input(&mut self, raw: u32) {
        self.raw_value = raw;
        if self.logical_min < 0 {
            self.value = sign_extend(raw, self.report_size);
        } else if self.is_array() {
            if raw == 0 {
                self.value = 0;
                self.array_value = 0;
            } else {
                self.usage = self.usage_min + raw;
                self.value = 1;
                self.array_value = raw;
            }
        } else {
            self.value = raw as i32;
        }
    }

    /// Current value scaled into 0.0..=1.0 over the logical range. Array
    /// elements return the value itself.
    pub fn map_logical(&self) -> f32 {
        if self.is_array() {
            self.value as f32
        } else {
            (self.value as f32 - self.logical_min as f32)
                / (self.logical_max as f32 - self.logical_min as f32)
        }
    }

    /// Current value scaled into the physical range.
    pub fn map_physical(&self) -> f32 {
        self.map_logical() * (self.phys_max as f32 - self.phys_min as f32) + self.phys_min as f32
    }

    /// Sets the value from a 0.0..=1.0 fraction of the logical range.
    pub fn set_logical(&mut self, fraction: f32) {
        let range = self.logical_max as f32 - self.logical_min as f32;
        self.value = (fraction * range).round() as i32 + self.logical_min;
    }

    /// Logical counts per physical unit, HID 1.11 section 6.2.2.7. Returns
    /// 0.0 for elements with an empty physical range.
    pub fn resolution(&self) -> f32 {
        let denom =
            (self.phys_max as f32 - self.phys_min as f32) * 10f32.powi(self.unit_exponent);
        if denom == 0.0 {
            0.0
        } else {
            (self.logical_max as f32 - self.logical_min as f32) / denom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> Element {
        Element {
            io_type: IoType::Input,
            report_id: 0,
            report_size: 8,
            report_index: 0,
            usage_page: 0x01,
            usage: 0x30,
            usage_min: 0,
            usage_max: 0,
            logical_min: -127,
            logical_max: 127,
            phys_min: -127,
            phys_max: 127,
            unit: 0,
            unit_exponent: 0,
            flags: MainFlags(0x06), // variable, relative
            index: 0,
            repeat: false,
            raw_value: 0,
            value: 0,
            array_value: 0,
            parent: CollectionId::ROOT,
        }
    }

    #[test]
    fn flags_decode() {
        let f = MainFlags(0x06);
        assert!(!f.constant());
        assert!(f.variable());
        assert!(f.relative());
        assert!(!f.wrap());
        let padding = MainFlags(0x03);
        assert!(padding.constant() && padding.variable());
        assert!(MainFlags(0x180).is_volatile());
        assert!(MainFlags(0x180).buffered_bytes());
    }

    #[test]
    fn signed_input_value() {
        let mut e = axis();
        e.set_value_from_input(0b1111_1110);
        assert_eq!(e.value, -2);
        assert_eq!(e.raw_value, 0b1111_1110);
    }

    #[test]
    fn array_input_tracks_usage() {
        let mut e = axis();
        e.logical_min = 0;
        e.logical_max = 255;
        e.flags = MainFlags(0x00); // array
        e.usage_min = 4;
        e.set_value_from_input(7);
        assert_eq!((e.value, e.usage, e.array_value), (1, 11, 7));
        e.set_value_from_input(0);
        assert_eq!((e.value, e.array_value), (0, 0));
    }

    #[test]
    fn logical_and_physical_mapping() {
        let mut e = axis();
        e.value = 127;
        assert_eq!(e.map_logical(), 1.0);
        assert_eq!(e.map_physical(), 127.0);
        e.value = -127;
        assert_eq!(e.map_logical(), 0.0);
        e.set_logical(0.5);
        assert_eq!(e.value, 0);
        e.set_logical(1.0);
        assert_eq!(e.value, 127);
    }

    #[test]
    fn resolution_counts_per_unit() {
        let mut e = axis();
        assert_eq!(e.resolution(), 1.0);
        e.phys_min = 0;
        e.phys_max = 0;
        assert_eq!(e.resolution(), 0.0);
    }
}
