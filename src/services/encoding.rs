use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::AppError;

/// Best guess for the text encoding of a byte sample.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub encoding: &'static Encoding,
    /// In `[0, 1]`. Never used as a threshold.
    pub confidence: f32,
}

impl Detection {
    fn new(encoding: &'static Encoding, confidence: f32) -> Self {
        Self {
            encoding,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn label(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Reads at most `sample_bytes` from the start of `path` and guesses its encoding.
pub fn detect_file(path: &Path, sample_bytes: usize) -> Result<Detection, AppError> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(sample_bytes.min(1 << 20));
    file.take(sample_bytes as u64).read_to_end(&mut sample)?;

    let detection = detect(&sample);
    tracing::info!(
        "Detected encoding {} (confidence {:.2}) from {} bytes of {}",
        detection.label(),
        detection.confidence,
        sample.len(),
        path.display()
    );
    Ok(detection)
}

pub fn detect(sample: &[u8]) -> Detection {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return Detection::new(encoding, 1.0);
    }

    // NUL counts as ASCII, so the parity check has to run first.
    if let Some(detection) = detect_utf16(sample) {
        return detection;
    }

    if sample.is_empty() || sample.is_ascii() {
        return Detection::new(UTF_8, 1.0);
    }

    match std::str::from_utf8(sample) {
        Ok(_) => Detection::new(UTF_8, 0.99),
        // A multi-byte sequence cut by the end of the sample.
        Err(e) if e.error_len().is_none() && sample.len() - e.valid_up_to() < 4 => {
            Detection::new(UTF_8, 0.9)
        }
        Err(_) => detect_single_byte(sample),
    }
}

/// BOM-less UTF-16: ASCII-heavy text leaves a NUL in every other byte.
fn detect_utf16(sample: &[u8]) -> Option<Detection> {
    if sample.len() < 4 {
        return None;
    }

    let pairs = sample.len() / 2;
    let (even_nuls, odd_nuls) = sample
        .chunks_exact(2)
        .fold((0usize, 0usize), |(even, odd), pair| {
            (even + (pair[0] == 0) as usize, odd + (pair[1] == 0) as usize)
        });

    let even_ratio = even_nuls as f32 / pairs as f32;
    let odd_ratio = odd_nuls as f32 / pairs as f32;

    if odd_ratio > 0.3 && even_ratio < 0.05 {
        Some(Detection::new(UTF_16LE, odd_ratio))
    } else if even_ratio > 0.3 && odd_ratio < 0.05 {
        Some(Detection::new(UTF_16BE, even_ratio))
    } else {
        None
    }
}

/// Single-byte fallback. Confidence is the share of high bytes that are Latin letters.
fn detect_single_byte(sample: &[u8]) -> Detection {
    let (high, letters) = sample.iter().filter(|&&b| b >= 0x80).fold(
        (0usize, 0usize),
        |(high, letters), &b| (high + 1, letters + (b >= 0xC0 && b != 0xD7 && b != 0xF7) as usize),
    );

    let confidence = if high == 0 {
        0.5
    } else {
        (letters as f32 / high as f32).max(0.1)
    };
    Detection::new(WINDOWS_1252, confidence)
}
