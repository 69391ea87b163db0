//! Binary file detection.
//!
//! Files that look binary are copied byte-for-byte instead of being rendered.
//! The check only looks at a prefix of the file.

use log::trace;
use std::path::Path;

use crate::constants::{BINARY_SAMPLE_SIZE, SUSPICIOUS_BYTES_RATIO};

const BOMS: [&[u8]; 5] = [
    &[0xEF, 0xBB, 0xBF],
    &[0x00, 0x00, 0xFE, 0xFF],
    &[0xFF, 0xFE, 0x00, 0x00],
    &[0xFE, 0xFF],
    &[0xFF, 0xFE],
];

/// Returns the leading part of `content` that is used for sniffing.
pub fn sample(content: &[u8]) -> &[u8] {
    &content[..content.len().min(BINARY_SAMPLE_SIZE)]
}

/// Decides whether a file should be treated as opaque bytes.
///
/// `sample` should be the first bytes of the file, see [`sample`].
pub fn is_binary(path: &Path, sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    if BOMS.iter().any(|bom| sample.starts_with(bom)) {
        return false;
    }
    if sample.starts_with(b"%PDF-") {
        trace!("{} has a PDF header", path.display());
        return true;
    }
    if sample.contains(&0) {
        trace!("{} contains NUL bytes", path.display());
        return true;
    }

    let suspicious = count_suspicious(sample);
    let binary = suspicious as f64 / sample.len() as f64 > SUSPICIOUS_BYTES_RATIO;
    if binary {
        trace!("{} has {} suspicious bytes in its sample", path.display(), suspicious);
    }
    binary
}

fn count_suspicious(sample: &[u8]) -> usize {
    let mut suspicious = 0;
    let mut i = 0;
    while i < sample.len() {
        let byte = sample[i];
        if byte < 0x20 || byte == 0x7F {
            if !matches!(byte, b'\t' | b'\n' | b'\r' | 0x0C | 0x08 | 0x1B) {
                suspicious += 1;
            }
            i += 1;
            continue;
        }
        if byte < 0x80 {
            i += 1;
            continue;
        }

        let width = utf8_width(byte);
        let end = i + width;
        if width == 0 {
            suspicious += 1;
            i += 1;
        } else if end > sample.len() {
            // sequence cut off by the sample boundary
            break;
        } else if std::str::from_utf8(&sample[i..end]).is_ok() {
            i = end;
        } else {
            suspicious += 1;
            i += 1;
        }
    }
    suspicious
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
