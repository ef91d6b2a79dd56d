// **************************************************************************
// Copyright (c) 2026 The hidrep Authors. Released under the MIT license.
//
// This file is part of hidrep.
// **************************************************************************

//! Parses a hex-encoded HID report descriptor and prints the resulting
//! collection tree, element list and report table.
//!
//! Bytes may be separated by whitespace or commas, with or without a `0x`
//! prefix, e.g. the format `usbhid-dump` and most descriptor dumps use.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use hidrep::{parse_report_descriptor, CollectionId, DeviceModel};

fn main() -> ExitCode {
    let arg = env::args().nth(1);
    let text = match arg.as_deref() {
        Some("-h") | Some("--help") => {
            eprintln!("usage: hiddump [FILE]");
            eprintln!("Reads a hex report descriptor from FILE (or stdin) and dumps it.");
            return ExitCode::SUCCESS;
        }
        Some("-") | None => {
            let mut text = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut text) {
                eprintln!("hiddump: stdin: {e}");
                return ExitCode::FAILURE;
            }
            text
        }
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("hiddump: {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let bytes = match decode_hex(&text) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("hiddump: {e}");
            return ExitCode::FAILURE;
        }
    };

    match parse_report_descriptor(&bytes) {
        Ok(model) => {
            print_model(&model);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("hiddump: {e}");
            ExitCode::FAILURE
        }
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| token.strip_prefix("0x").unwrap_or(token))
        .map(|token| {
            u8::from_str_radix(token, 16).map_err(|_| format!("invalid hex byte {token:?}"))
        })
        .collect()
}

fn print_model(model: &DeviceModel) {
    print_collection(model, model.root(), 0);
    println!();
    for report in model.reports() {
        println!(
            "report {:#04x}: {} input / {} output / {} feature bits",
            report.id, report.input_bits, report.output_bits, report.feature_bits
        );
    }
}

fn print_collection(model: &DeviceModel, id: CollectionId, depth: usize) {
    let collection = model.collection(id);
    let indent = "  ".repeat(depth);
    if id == model.root() {
        println!("{indent}device");
    } else {
        println!(
            "{indent}collection {:?}, usage page {:#06x}, usage {:#06x}",
            collection.kind, collection.usage_page, collection.usage
        );
    }
    for &element_id in collection.elements() {
        let e = model.element(element_id);
        println!(
            "{indent}  {:?} usage {:#06x}:{:#06x}, {} bit(s), report id {}, logical {}..={}",
            e.io_type, e.usage_page, e.usage, e.report_size, e.report_id, e.logical_min, e.logical_max
        );
    }
    for &child in collection.children() {
        print_collection(model, child, depth + 1);
    }
}
