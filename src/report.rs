//! Report payload codec.
//!
//! Reports are bit-packed in descriptor declaration order: each element
//! occupies `report_size` bits, LSB-first within a byte, little-endian across
//! bytes, with no padding between fields. When a device registered more than
//! one report id, the payload carries the id as its first byte.

use log::trace;

use crate::bits::{BitReader, BitWriter};
use crate::error::HidError;
use crate::model::{DeviceModel, Element, ElementId};
use crate::HidResult;

/// Decodes one input report, updating the matching input elements in
/// declaration order.
///
/// `on_element` fires for every element whose raw field changed, and
/// unconditionally for elements with `repeat` set; it fires in field order,
/// once per element per report. Returns the number of elements reported.
pub fn decode_input_report<F>(
    model: &mut DeviceModel,
    buf: &[u8],
    mut on_element: F,
) -> HidResult<usize>
where
    F: FnMut(ElementId, &Element),
{
    let (report_id, payload) = split_report_id(model, buf)?;
    trace!("decoding {} byte input report, id {}", buf.len(), report_id);

    let ids: Vec<ElementId> = model.inputs(report_id).map(|(id, _)| id).collect();
    let mut reader = BitReader::new(payload);
    let mut reported = 0;
    for id in ids {
        let raw = reader
            .read(model.element(id).report_size)
            .map_err(|_| HidError::ReportTooShort { report_id })?;
        let element = model.element_mut(id);
        if raw != element.raw_value || element.repeat {
            element.set_value_from_input(raw);
            on_element(id, model.element(id));
            reported += 1;
        }
    }
    Ok(reported)
}

fn split_report_id<'b>(model: &DeviceModel, buf: &'b [u8]) -> HidResult<(u8, &'b [u8])> {
    if !model.uses_report_ids() {
        return Ok((0, buf));
    }
    match buf.first() {
        Some(&report_id) if model.report(report_id).is_some() => Ok((report_id, &buf[1..])),
        Some(&report_id) => Err(HidError::UnknownReportId { report_id }),
        None => Err(HidError::ReportTooShort { report_id: 0 }),
    }
}

/// Assembles the output report `report_id` from the current values of its
/// output elements.
///
/// The buffer is `ceil(bits / 8) + 1` bytes: the report id first (0 for
/// devices without ids, as the transport write convention expects), then the
/// bit-packed fields. Element values wider than their field are masked to
/// `report_size` bits.
pub fn encode_output_report(model: &DeviceModel, report_id: u8) -> HidResult<Vec<u8>> {
    let report = model
        .report(report_id)
        .ok_or(HidError::UnknownReportId { report_id })?;
    let mut buf = vec![0u8; (report.output_bits as usize + 7) / 8 + 1];
    buf[0] = report_id;
    // The payload is sized from the report table, which accumulated exactly
    // these elements' widths, so the writes always fit.
    let mut writer = BitWriter::new(&mut buf[1..]);
    for (_, element) in model.outputs(report_id) {
        writer.write(element.report_size, element.value as u32)?;
    }
    trace!("encoded {} byte output report, id {}", buf.len(), report_id);
    Ok(buf)
}
