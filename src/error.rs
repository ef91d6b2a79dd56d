// **************************************************************************
// Copyright (c) 2026 The hidrep Authors. Released under the MIT license.
//
// This file is part of hidrep.
// **************************************************************************

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

use crate::bits::EndOfBuffer;

#[derive(Debug)]
pub enum HidError {
    /// The descriptor buffer ended in the middle of an item.
    DescriptorTruncated {
        offset: usize,
    },
    /// Long-item prefix (0xFE); not used by any supported descriptor.
    DescriptorUnsupported {
        offset: usize,
    },
    /// The device did not hand out a report descriptor.
    DescriptorRead,
    /// An input report ended before all of its fields were consumed.
    ReportTooShort {
        report_id: u8,
    },
    /// The leading byte of a multi-report payload matched no registered id.
    UnknownReportId {
        report_id: u8,
    },
    /// An element id that does not belong to this device model.
    UnknownElement,
    /// No device matched the requested path or vendor/product pair.
    NotFound,
    InvalidZeroSizeData,
    IncompleteSendError {
        sent: usize,
        all: usize,
    },
    SetBlockingModeError {
        mode: &'static str,
    },
    /// An IO error or a system error that can be represented as such
    IoError {
        error: std::io::Error,
    },
}

impl Display for HidError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            HidError::DescriptorTruncated { offset } => {
                write!(f, "report descriptor truncated inside item at byte {}", offset)
            }
            HidError::DescriptorUnsupported { offset } => {
                write!(f, "unsupported long item in report descriptor at byte {}", offset)
            }
            HidError::DescriptorRead => write!(f, "Failed to read report descriptor"),
            HidError::ReportTooShort { report_id } => {
                write!(f, "input report {} too short for its declared fields", report_id)
            }
            HidError::UnknownReportId { report_id } => {
                write!(f, "unknown report id {}", report_id)
            }
            HidError::UnknownElement => write!(f, "element does not belong to this device"),
            HidError::NotFound => write!(f, "no matching hid device found"),
            HidError::InvalidZeroSizeData => write!(f, "Invalid data: size can not be 0"),
            HidError::IncompleteSendError { sent, all } => write!(
                f,
                "Failed to send all data: only sent {} out of {} bytes",
                sent, all
            ),
            HidError::SetBlockingModeError { mode } => {
                write!(f, "Can not set blocking mode to '{}'", mode)
            }
            HidError::IoError { error } => {
                write!(f, "{error}")
            }
        }
    }
}

impl Error for HidError {}

impl From<std::io::Error> for HidError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError { error: e }
    }
}

impl From<EndOfBuffer> for HidError {
    fn from(_: EndOfBuffer) -> Self {
        Self::ReportTooShort { report_id: 0 }
    }
}
