//! In-memory device model: collections, elements and the report-id table.
//!
//! The model is an arena. Collections and elements live in flat vectors owned
//! by [`DeviceModel`] and refer to each other by index, so the tree carries no
//! owning back-references and the whole model is plainly cloneable. The
//! element vector doubles as the flat declaration-order list the report codec
//! scans.

mod element;

pub use element::{CollectionType, Element, IoType, MainFlags};

use log::warn;

/// Index of a collection within its [`DeviceModel`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CollectionId(pub(crate) usize);

impl CollectionId {
    /// The synthetic root collection every model starts with.
    pub const ROOT: CollectionId = CollectionId(0);
}

/// Index of an element within its [`DeviceModel`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ElementId(pub(crate) usize);

/// A logical grouping node in the descriptor tree.
#[derive(Debug, Clone)]
pub struct Collection {
    pub kind: CollectionType,
    pub usage_page: u32,
    pub usage: u32,
    pub usage_min: u32,
    pub usage_max: u32,
    /// 0-based creation order among non-root collections; 0 for the root.
    pub index: usize,
    parent: Option<CollectionId>,
    children: Vec<CollectionId>,
    elements: Vec<ElementId>,
}

impl Collection {
    pub fn parent(&self) -> Option<CollectionId> {
        self.parent
    }

    pub fn children(&self) -> &[CollectionId] {
        &self.children
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }
}

/// One report id and the accumulated bit totals of its fields.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Report {
    pub id: u8,
    pub input_bits: u32,
    pub output_bits: u32,
    pub feature_bits: u32,
}

impl Report {
    fn new(id: u8) -> Self {
        Self {
            id,
            input_bits: 0,
            output_bits: 0,
            feature_bits: 0,
        }
    }
}

/// Everything the descriptor (or platform enumeration) declared about a
/// device: the collection tree, the flat element list and the report table.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    collections: Vec<Collection>,
    elements: Vec<Element>,
    reports: Vec<Report>,
}

impl DeviceModel {
    pub fn root(&self) -> CollectionId {
        CollectionId::ROOT
    }

    pub fn collection(&self, id: CollectionId) -> &Collection {
        &self.collections[id.0]
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    /// Number of collections, the synthetic root excluded.
    pub fn num_collections(&self) -> usize {
        self.collections.len() - 1
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// All elements in descriptor declaration order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i), e))
    }

    /// Input elements of one report, in declaration order.
    pub fn inputs(&self, report_id: u8) -> impl Iterator<Item = (ElementId, &Element)> {
        self.by_type(IoType::Input, Some(report_id))
    }

    /// Output elements of one report, in declaration order.
    pub fn outputs(&self, report_id: u8) -> impl Iterator<Item = (ElementId, &Element)> {
        self.by_type(IoType::Output, Some(report_id))
    }

    /// Feature elements of every report, in declaration order.
    pub fn features(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.by_type(IoType::Feature, None)
    }

    fn by_type(
        &self,
        io_type: IoType,
        report_id: Option<u8>,
    ) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements().filter(move |(_, e)| {
            e.io_type == io_type && report_id.map_or(true, |id| e.report_id == id)
        })
    }

    /// The report table, in declaration order. Slot 0 is always the
    /// "no report id" report 0.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn report(&self, id: u8) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    /// True when report payloads carry a leading report-id byte.
    pub fn uses_report_ids(&self) -> bool {
        self.reports.len() > 1
    }
}

/// All descriptor-declared fields of an element, ready to commit to a model.
#[derive(Debug, Clone)]
pub struct ElementFields {
    pub io_type: IoType,
    pub report_id: u8,
    pub report_size: u32,
    pub report_index: u32,
    pub usage_page: u32,
    pub usage: u32,
    pub usage_min: u32,
    pub usage_max: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    pub phys_min: i32,
    pub phys_max: i32,
    pub unit: u32,
    pub unit_exponent: i32,
    pub flags: MainFlags,
}

/// Incremental constructor shared by every model source.
///
/// The descriptor parser drives this while interpreting the item stream; a
/// platform adapter walking OS-enumerated elements drives it with the same
/// calls, so both back-ends produce structurally identical models.
pub struct ModelBuilder {
    model: DeviceModel,
    current: CollectionId,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        let root = Collection {
            kind: CollectionType::Application,
            usage_page: 0,
            usage: 0,
            usage_min: 0,
            usage_max: 0,
            index: 0,
            parent: None,
            children: Vec::new(),
            elements: Vec::new(),
        };
        Self {
            model: DeviceModel {
                collections: vec![root],
                elements: Vec::new(),
                reports: vec![Report::new(0)],
            },
            current: CollectionId::ROOT,
        }
    }

    /// The collection new children and elements attach to.
    pub fn current_collection(&self) -> CollectionId {
        self.current
    }

    /// Opens a collection under the current one and descends into it.
    pub fn begin_collection(
        &mut self,
        kind: CollectionType,
        usage_page: u32,
        usage: u32,
        usage_min: u32,
        usage_max: u32,
    ) -> CollectionId {
        let id = CollectionId(self.model.collections.len());
        self.model.collections.push(Collection {
            kind,
            usage_page,
            usage,
            usage_min,
            usage_max,
            index: id.0 - 1,
            parent: Some(self.current),
            children: Vec::new(),
            elements: Vec::new(),
        });
        self.model.collections[self.current.0].children.push(id);
        self.current = id;
        id
    }

    /// Closes the current collection and returns its usage page and usage,
    /// which the descriptor grammar makes visible to following siblings.
    /// Saturates at the root when the stream closes more than it opened.
    pub fn end_collection(&mut self) -> Option<(u32, u32)> {
        let closing = &self.model.collections[self.current.0];
        match closing.parent {
            Some(parent) => {
                let restored = (closing.usage_page, closing.usage);
                self.current = parent;
                Some(restored)
            }
            None => {
                warn!("unbalanced end of collection, already at root");
                None
            }
        }
    }

    /// Registers a report id, keeping the table duplicate-free.
    pub fn declare_report_id(&mut self, id: u8) {
        if !self.model.reports.iter().any(|r| r.id == id) {
            self.model.reports.push(Report::new(id));
        }
    }

    /// Appends an element to the flat list and to the current collection,
    /// accumulating its bits into the report table.
    pub fn push_element(&mut self, fields: ElementFields) -> ElementId {
        let id = ElementId(self.model.elements.len());
        let slot = match self
            .model
            .reports
            .iter()
            .position(|r| r.id == fields.report_id)
        {
            Some(i) => i,
            None => {
                self.model.reports.push(Report::new(fields.report_id));
                self.model.reports.len() - 1
            }
        };
        let bits = &mut self.model.reports[slot];
        match fields.io_type {
            IoType::Input => bits.input_bits += fields.report_size,
            IoType::Output => bits.output_bits += fields.report_size,
            IoType::Feature => bits.feature_bits += fields.report_size,
        }
        self.model.elements.push(Element {
            io_type: fields.io_type,
            report_id: fields.report_id,
            report_size: fields.report_size,
            report_index: fields.report_index,
            usage_page: fields.usage_page,
            usage: fields.usage,
            usage_min: fields.usage_min,
            usage_max: fields.usage_max,
            logical_min: fields.logical_min,
            logical_max: fields.logical_max,
            phys_min: fields.phys_min,
            phys_max: fields.phys_max,
            unit: fields.unit,
            unit_exponent: fields.unit_exponent,
            flags: fields.flags,
            index: id.0,
            repeat: false,
            raw_value: 0,
            value: 0,
            array_value: 0,
            parent: self.current,
        });
        self.model.collections[self.current.0].elements.push(id);
        id
    }

    pub fn finish(self) -> DeviceModel {
        self.model
    }
}
