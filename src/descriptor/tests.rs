use crate::model::{CollectionType, DeviceModel, IoType};
use crate::parse_report_descriptor;
use crate::HidError;

/// Boot-protocol style mouse: application/physical collections, three
/// buttons, five bits of padding, two signed relative axes.
pub const MOUSE_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x03, //     Input (Constant, Variable)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
];

fn parse(descr: &[u8]) -> DeviceModel {
    parse_report_descriptor(descr).unwrap()
}

#[test]
fn mouse_collections() {
    let model = parse(MOUSE_DESCRIPTOR);

    assert_eq!(model.num_collections(), 2);
    let root = model.collection(model.root());
    assert_eq!(root.children().len(), 1);

    let app = model.collection(root.children()[0]);
    assert_eq!(app.kind, CollectionType::Application);
    assert_eq!((app.usage_page, app.usage), (0x01, 0x02));
    assert_eq!(app.index, 0);
    assert_eq!(app.children().len(), 1);

    let phys = model.collection(app.children()[0]);
    assert_eq!(phys.kind, CollectionType::Physical);
    assert_eq!((phys.usage_page, phys.usage), (0x01, 0x01));
    assert_eq!(phys.index, 1);
    assert_eq!(phys.parent(), Some(root.children()[0]));
    // All six fields hang off the inner physical collection.
    assert_eq!(phys.elements().len(), 6);
}

#[test]
fn mouse_elements() {
    let model = parse(MOUSE_DESCRIPTOR);
    assert_eq!(model.num_elements(), 6);

    for (j, (_, button)) in model.elements().take(3).enumerate() {
        assert_eq!(button.io_type, IoType::Input);
        assert_eq!(button.report_size, 1);
        assert_eq!(button.usage_page, 0x09);
        assert_eq!(button.usage, 1 + j as u32);
        assert_eq!(button.report_index, j as u32);
        assert_eq!((button.logical_min, button.logical_max), (0, 1));
        assert!(button.is_variable());
        assert!(!button.is_relative());
    }

    let (_, padding) = model.elements().nth(3).unwrap();
    assert_eq!(padding.report_size, 5);
    assert!(padding.flags.constant());
    assert_eq!(padding.usage, 0);

    for (j, (_, axis)) in model.elements().skip(4).enumerate() {
        assert_eq!(axis.report_size, 8);
        assert_eq!(axis.usage_page, 0x01);
        assert_eq!(axis.usage, [0x30, 0x31][j]);
        assert_eq!((axis.logical_min, axis.logical_max), (-127, 127));
        // No physical items anywhere: the physical range inherits the
        // logical one.
        assert_eq!((axis.phys_min, axis.phys_max), (-127, 127));
        assert!(axis.is_relative());
    }
}

#[test]
fn mouse_report_table() {
    let model = parse(MOUSE_DESCRIPTOR);
    assert!(!model.uses_report_ids());
    assert_eq!(model.reports().len(), 1);
    let report = model.report(0).unwrap();
    assert_eq!(report.input_bits, 24);
    assert_eq!(report.output_bits, 0);
}

#[test]
fn declaration_order_is_preserved() {
    let model = parse(MOUSE_DESCRIPTOR);
    for (i, (id, element)) in model.elements().enumerate() {
        assert_eq!(element.index, i);
        assert!(model.collection(element.parent()).elements().contains(&id));
    }
    for (_, element) in model.elements() {
        assert!(element.report_size >= 1);
        assert!(element.logical_min <= element.logical_max);
    }
}

#[test]
fn physical_range_falls_back_to_logical() {
    let descr = [
        0x05, 0x01, // Usage Page (Generic Desktop)
        0xA1, 0x01, // Collection (Application)
        0x09, 0x38, //   Usage (Wheel)
        0x15, 0xFF, //   Logical Minimum (-1)
        0x25, 0x01, //   Logical Maximum (1)
        0x75, 0x02, //   Report Size (2)
        0x95, 0x01, //   Report Count (1)
        0x81, 0x06, //   Input (Data, Variable, Relative)
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    let (_, wheel) = model.elements().next().unwrap();
    assert_eq!((wheel.logical_min, wheel.logical_max), (-1, 1));
    assert_eq!((wheel.phys_min, wheel.phys_max), (-1, 1));
}

#[test]
fn explicit_physical_range_is_kept() {
    let descr = [
        0xA1, 0x01, // Collection (Application)
        0x15, 0x00, //   Logical Minimum (0)
        0x26, 0xFF, 0x03, //   Logical Maximum (1023)
        0x35, 0x00, //   Physical Minimum (0)
        0x46, 0x10, 0x27, //   Physical Maximum (10000)
        0x55, 0xFD, //   Unit Exponent (-3)
        0x66, 0x11, 0x00, //   Unit
        0x75, 0x0A, //   Report Size (10)
        0x95, 0x01, //   Report Count (1)
        0x81, 0x02, //   Input (Data, Variable, Absolute)
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    let (_, e) = model.elements().next().unwrap();
    // Non-negative minimum keeps the wide maximum unsigned.
    assert_eq!((e.logical_min, e.logical_max), (0, 1023));
    assert_eq!((e.phys_min, e.phys_max), (0, 10000));
    assert_eq!(e.unit_exponent, -3);
    assert_eq!(e.unit, 0x11);
}

#[test]
fn array_input_uses_usage_range() {
    // Keyboard-style key array: 6 bytes, usages 0x04..=0x65.
    let descr = [
        0x05, 0x07, // Usage Page (Keyboard)
        0xA1, 0x01, // Collection (Application)
        0x19, 0x04, //   Usage Minimum (4)
        0x29, 0x65, //   Usage Maximum (0x65)
        0x15, 0x00, //   Logical Minimum (0)
        0x25, 0x65, //   Logical Maximum (0x65)
        0x75, 0x08, //   Report Size (8)
        0x95, 0x06, //   Report Count (6)
        0x81, 0x00, //   Input (Data, Array)
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    assert_eq!(model.num_elements(), 6);
    for (j, (_, key)) in model.elements().enumerate() {
        assert!(key.is_array());
        assert_eq!(key.usage_min, 4);
        assert_eq!(key.usage_max, 0x65);
        assert_eq!(key.usage, 4 + j as u32);
    }
}

#[test]
fn report_id_table_is_duplicate_free() {
    let descr = [
        0xA1, 0x01, // Collection (Application)
        0x85, 0x01, //   Report ID (1)
        0x75, 0x08, 0x95, 0x01, //   8 bits x 1
        0x91, 0x02, //   Output
        0x85, 0x02, //   Report ID (2)
        0x91, 0x02, //   Output
        0x85, 0x01, //   Report ID (1) again
        0x91, 0x02, //   Output
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    assert!(model.uses_report_ids());
    let ids: Vec<u8> = model.reports().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(model.report(1).unwrap().output_bits, 16);
    assert_eq!(model.report(2).unwrap().output_bits, 8);
    for report in model.reports() {
        let sum: u32 = model
            .outputs(report.id)
            .map(|(_, e)| e.report_size)
            .sum();
        assert_eq!(sum, report.output_bits);
    }
}

#[test]
fn push_pop_snapshot_global_state() {
    let descr = [
        0xA1, 0x01, // Collection (Application)
        0x05, 0x01, //   Usage Page (Generic Desktop)
        0x75, 0x08, //   Report Size (8)
        0x95, 0x01, //   Report Count (1)
        0xA4, //   Push
        0x05, 0x09, //   Usage Page (Button)
        0x75, 0x01, //   Report Size (1)
        0x81, 0x02, //   Input
        0xB4, //   Pop
        0x81, 0x02, //   Input
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    let elements: Vec<_> = model.elements().map(|(_, e)| e.clone()).collect();
    assert_eq!((elements[0].usage_page, elements[0].report_size), (0x09, 1));
    assert_eq!((elements[1].usage_page, elements[1].report_size), (0x01, 8));
}

#[test]
fn sibling_collection_inherits_closed_usage() {
    let descr = [
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x04, // Usage (Joystick)
        0xA1, 0x01, // Collection (Application)
        0xA1, 0x00, //   Collection (Physical), no usage of its own
        0xC0, //   End Collection
        0xA1, 0x02, //   Collection (Logical), no usage of its own
        0xC0, //   End Collection
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    let app_id = model.collection(model.root()).children()[0];
    let app = model.collection(app_id);
    assert_eq!(app.children().len(), 2);
    // The physical child committed the pending usage; the logical sibling
    // opened after its close inherits the restored one.
    let second = model.collection(app.children()[1]);
    assert_eq!(second.kind, CollectionType::Logical);
    assert_eq!((second.usage_page, second.usage), (0x01, 0x00));
}

#[test]
fn unknown_tags_are_skipped() {
    let descr = [
        0xA1, 0x01, // Collection (Application)
        0xC6, 0xAA, 0xBB, // reserved tag, two data bytes
        0x75, 0x08, 0x95, 0x01, 0x81, 0x02, // 8-bit input
        0xC0, // End Collection
    ];
    let model = parse(&descr);
    assert_eq!(model.num_elements(), 1);
}

#[test]
fn truncated_descriptor_is_an_error() {
    let descr = [0xA1, 0x01, 0x26, 0xFF]; // Logical Maximum missing a byte
    assert!(matches!(
        parse_report_descriptor(&descr),
        Err(HidError::DescriptorTruncated { offset: 2 })
    ));
}
