//! Device facade: ties a HID transport to the parsed device model.
//!
//! The crate never talks to hardware itself. A platform layer (hidraw,
//! IOKit, Win32, libusb, a test double) implements [`HidTransport`] for an
//! open device and [`HidBackend`] for discovery, and [`HidDevice`] runs the
//! descriptor parser and report codec on top of it.

use log::{debug, warn};

use crate::descriptor::parse_report_descriptor;
use crate::error::HidError;
use crate::model::{DeviceModel, Element, ElementId};
use crate::report;
use crate::HidResult;

/// Largest report descriptor a device may hand out, per the hidraw contract.
const MAX_DESCRIPTOR_SIZE: usize = 4096;

/// Read buffer for input reports.
const INPUT_BUF_LEN: usize = 512;

/// Underlying bus of a HID device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum BusType {
    #[default]
    Unknown,
    Usb,
    Bluetooth,
    I2c,
    Spi,
}

/// Device identity as reported by enumeration.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Platform-specific device path
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub release_number: u16,
    pub manufacturer_string: Option<String>,
    pub product_string: Option<String>,
    pub usage_page: u16,
    pub usage: u16,
    pub interface_number: i32,
    pub bus_type: BusType,
}

/// An open HID device connection, as provided by a platform layer.
pub trait HidTransport {
    /// Sends an output report. The first byte of `data` is the report id, 0
    /// when the device uses no ids.
    fn write(&mut self, data: &[u8]) -> HidResult<usize>;

    /// Reads an input report; returns 0 when non-blocking and no report is
    /// waiting.
    fn read(&mut self, buf: &mut [u8]) -> HidResult<usize>;

    /// Copies the raw report descriptor into `buf`, returning its length.
    fn get_report_descriptor(&mut self, buf: &mut [u8]) -> HidResult<usize>;

    fn set_blocking_mode(&mut self, blocking: bool) -> HidResult<()>;
}

/// Device discovery, as provided by a platform layer.
pub trait HidBackend {
    type Transport: HidTransport;

    fn open_path(&self, path: &str) -> HidResult<Self::Transport>;

    /// Opens the first device matching vendor/product (and serial number,
    /// when given).
    fn open(&self, vid: u16, pid: u16, serial: Option<&str>) -> HidResult<Self::Transport>;

    /// Lists attached devices; 0 for `vid`/`pid` matches any.
    fn enumerate(&self, vid: u16, pid: u16) -> HidResult<Vec<DeviceInfo>>;
}

type DescriptorCallback = Box<dyn FnMut(&DeviceModel)>;
type ElementCallback = Box<dyn FnMut(ElementId, &Element)>;
type ReadErrorCallback = Box<dyn FnMut(&HidError)>;

/// An open device plus its parsed [`DeviceModel`].
///
/// Reports flow through the codec in both directions: [`read_input_report`]
/// decodes incoming payloads into element values (firing the element
/// callback), [`set_element_value`] re-encodes and sends the owning output
/// report.
///
/// [`read_input_report`]: HidDevice::read_input_report
/// [`set_element_value`]: HidDevice::set_element_value
pub struct HidDevice<T: HidTransport> {
    transport: T,
    model: DeviceModel,
    info: Option<DeviceInfo>,
    descriptor_callback: Option<DescriptorCallback>,
    element_callback: Option<ElementCallback>,
    readerror_callback: Option<ReadErrorCallback>,
}

impl<T: HidTransport> HidDevice<T> {
    /// Opens the device at `path`, reads and parses its report descriptor
    /// and attaches the matching enumeration info.
    pub fn open_path<B>(backend: &B, path: &str, vid: u16, pid: u16) -> HidResult<Self>
    where
        B: HidBackend<Transport = T>,
    {
        let transport = backend.open_path(path)?;
        let info = backend
            .enumerate(vid, pid)?
            .into_iter()
            .find(|info| info.path == path);
        if info.is_none() {
            return Err(HidError::NotFound);
        }
        Self::from_transport(transport, info)
    }

    /// Opens the first device matching vendor/product (and serial number,
    /// when given).
    pub fn open<B>(backend: &B, vid: u16, pid: u16, serial: Option<&str>) -> HidResult<Self>
    where
        B: HidBackend<Transport = T>,
    {
        let transport = backend.open(vid, pid, serial)?;
        let info = backend
            .enumerate(vid, pid)?
            .into_iter()
            .find(|info| match serial {
                Some(serial) => info.serial_number.as_deref() == Some(serial),
                None => true,
            });
        if info.is_none() {
            return Err(HidError::NotFound);
        }
        Self::from_transport(transport, info)
    }

    /// Builds a device from an already open transport: reads the report
    /// descriptor, parses it and switches the transport to non-blocking.
    pub fn from_transport(mut transport: T, info: Option<DeviceInfo>) -> HidResult<Self> {
        let mut descr = [0u8; MAX_DESCRIPTOR_SIZE];
        let size = transport
            .get_report_descriptor(&mut descr)
            .map_err(|_| HidError::DescriptorRead)?;
        let model = parse_report_descriptor(&descr[..size])?;
        debug!(
            "opened device with {} elements in {} collections, {} report(s)",
            model.num_elements(),
            model.num_collections(),
            model.reports().len()
        );
        transport.set_blocking_mode(false)?;
        Ok(Self {
            transport,
            model,
            info,
            descriptor_callback: None,
            element_callback: None,
            readerror_callback: None,
        })
    }

    /// Wraps a transport and a model built elsewhere, for platforms whose
    /// HID manager enumerates elements instead of exposing the descriptor.
    pub fn with_model(transport: T, model: DeviceModel, info: Option<DeviceInfo>) -> Self {
        Self {
            transport,
            model,
            info,
            descriptor_callback: None,
            element_callback: None,
            readerror_callback: None,
        }
    }

    /// Re-reads and re-parses the report descriptor, firing the descriptor
    /// callback with the fresh model. Element values reset along with it.
    pub fn refresh_descriptor(&mut self) -> HidResult<()> {
        let mut descr = [0u8; MAX_DESCRIPTOR_SIZE];
        let size = self
            .transport
            .get_report_descriptor(&mut descr)
            .map_err(|_| HidError::DescriptorRead)?;
        self.model = parse_report_descriptor(&descr[..size])?;
        if let Some(callback) = self.descriptor_callback.as_mut() {
            callback(&self.model);
        }
        Ok(())
    }

    pub fn model(&self) -> &DeviceModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut DeviceModel {
        &mut self.model
    }

    pub fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Registers the descriptor-event callback and fires it once for the
    /// already parsed model.
    pub fn set_descriptor_callback<F>(&mut self, mut callback: F)
    where
        F: FnMut(&DeviceModel) + 'static,
    {
        callback(&self.model);
        self.descriptor_callback = Some(Box::new(callback));
    }

    /// Registers the per-element callback fired by the input decode path.
    pub fn set_element_callback<F>(&mut self, callback: F)
    where
        F: FnMut(ElementId, &Element) + 'static,
    {
        self.element_callback = Some(Box::new(callback));
    }

    /// Registers the callback fired when reading or decoding a report fails.
    pub fn set_readerror_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&HidError) + 'static,
    {
        self.readerror_callback = Some(Box::new(callback));
    }

    /// Reads one input report from the transport and decodes it. Returns the
    /// number of elements reported, 0 when no report was waiting.
    pub fn read_input_report(&mut self) -> HidResult<usize> {
        let mut buf = [0u8; INPUT_BUF_LEN];
        let size = match self.transport.read(&mut buf) {
            Ok(0) => return Ok(0),
            Ok(size) => size,
            Err(error) => {
                self.throw_readerror(&error);
                return Err(error);
            }
        };
        self.handle_input_report(&buf[..size])
    }

    /// Decodes an input report the caller already read from the transport.
    pub fn handle_input_report(&mut self, buf: &[u8]) -> HidResult<usize> {
        let model = &mut self.model;
        let element_callback = &mut self.element_callback;
        let result = report::decode_input_report(model, buf, |id, element| {
            if let Some(callback) = element_callback.as_mut() {
                callback(id, element);
            }
        });
        if let Err(error) = &result {
            warn!("dropping input report: {}", error);
            self.throw_readerror(error);
        }
        result
    }

    /// Stores a new value for an output element and sends the report it
    /// belongs to. Values wider than the element's field are masked.
    pub fn set_element_value(&mut self, id: ElementId, value: i32) -> HidResult<usize> {
        if id.0 >= self.model.num_elements() {
            return Err(HidError::UnknownElement);
        }
        let element = self.model.element_mut(id);
        element.value = value;
        let report_id = element.report_id;
        self.send_output_report(report_id)
    }

    /// Encodes the output report `report_id` from current element values and
    /// writes it to the transport.
    pub fn send_output_report(&mut self, report_id: u8) -> HidResult<usize> {
        let buf = report::encode_output_report(&self.model, report_id)?;
        let sent = self.transport.write(&buf)?;
        if sent != buf.len() {
            return Err(HidError::IncompleteSendError {
                sent,
                all: buf.len(),
            });
        }
        Ok(sent)
    }

    fn throw_readerror(&mut self, error: &HidError) {
        if let Some(callback) = self.readerror_callback.as_mut() {
            callback(error);
        }
    }

    /// Closes the device, dropping the model and handing the transport back
    /// to the caller for release.
    pub fn close(self) -> T {
        self.transport
    }
}
