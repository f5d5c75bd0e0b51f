use csv::{ReaderBuilder, StringRecord};
use encoding_rs::Encoding;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::{ColumnKind, Table};
use crate::services::utils::{clean_column_name, is_missing};

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const DELIMITER_SAMPLE_LINES: usize = 10;

/// Writes an upload into `upload_dir` under its own name, replacing any earlier file.
pub fn save_upload(upload_dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf, AppError> {
    // Some browsers send the client-side path.
    let name = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::InvalidInput(format!("Invalid file name: {}", file_name)));
    }

    fs::create_dir_all(upload_dir)?;
    let path = upload_dir.join(name);
    fs::write(&path, data)?;
    tracing::info!("Saved upload {} ({}KB)", path.display(), data.len() / 1024);
    Ok(path)
}

/// Reads, decodes and parses a saved upload.
pub fn load_table(path: &Path, encoding: &'static Encoding) -> Result<Table, AppError> {
    let bytes = fs::read(path)?;
    let content = decode(&bytes, encoding)?;
    parse_table(&content)
}

/// Strict decode: any malformed sequence is a `Decode` error. A BOM overrides `encoding`.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> Result<String, AppError> {
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((encoding, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            tracing::warn!("Upload is not valid {}", encoding.name());
            AppError::Decode(format!("input is not valid {}", encoding.name()))
        })
}

/// Picks the candidate whose per-line count is high and consistent.
pub fn detect_delimiter(content: &str) -> u8 {
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(DELIMITER_SAMPLE_LINES)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best_delimiter = b',';
    let mut best_score = 0.0f32;

    for &delimiter in &DELIMITER_CANDIDATES {
        let field_counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| line.bytes().filter(|&b| b == delimiter).count())
            .collect();

        let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
        let variance = field_counts
            .iter()
            .map(|&x| (x as f32 - avg).powi(2))
            .sum::<f32>()
            / field_counts.len() as f32;

        let score = avg / (1.0 + variance.sqrt());
        if score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}

/// Parses decoded text. Blank lines are ignored, rows longer than the header
/// are dropped and shorter rows are padded with missing values.
pub fn parse_table(content: &str) -> Result<Table, AppError> {
    let delimiter = detect_delimiter(content);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut header: Option<StringRecord> = None;
    let mut rows: Vec<StringRecord> = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Skipping unreadable record {}: {}", line + 1, e);
                skipped += 1;
                continue;
            }
        };

        if is_blank(&record) {
            continue;
        }

        match &header {
            None => header = Some(record),
            Some(names) if record.len() > names.len() => {
                tracing::debug!(
                    "Skipping record {}: expected {} fields, saw {}",
                    line + 1,
                    names.len(),
                    record.len()
                );
                skipped += 1;
            }
            Some(_) => rows.push(record),
        }
    }

    let header = header.ok_or_else(|| AppError::Parse("No columns to parse from file".to_string()))?;

    let mut existing_names = HashSet::new();
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| clean_column_name(name, idx, &mut existing_names))
        .collect();

    let columns: Vec<Series> = names
        .par_iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Option<&str>> = rows
                .iter()
                .map(|row| row.get(idx).filter(|cell| !is_missing(cell)))
                .collect();
            build_series(name, &cells)
        })
        .collect();

    let frame = DataFrame::new(columns)
        .map_err(|e| AppError::Parse(format!("Failed to create DataFrame: {}", e)))?;

    tracing::info!(
        "Parsed table with {} rows x {} columns (delimiter {:?}, {} bad lines skipped)",
        frame.height(),
        frame.width(),
        delimiter as char,
        skipped
    );
    Ok(Table::new(frame))
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|field| field.trim().is_empty())
}

/// Integer when every cell parses as one and none is missing; float when every
/// present cell is a number; text otherwise.
pub fn detect_column_type(cells: &[Option<&str>]) -> ColumnKind {
    if cells.is_empty() {
        return ColumnKind::Text;
    }

    let (int_count, float_count, other_count, missing_count) = cells
        .par_iter()
        .fold(
            || (0usize, 0usize, 0usize, 0usize),
            |(mut ints, mut floats, mut other, mut missing), cell| {
                match cell {
                    None => missing += 1,
                    Some(value) => {
                        let value = value.trim();
                        if value.parse::<i64>().is_ok() {
                            ints += 1;
                        } else if value.parse::<f64>().is_ok() {
                            floats += 1;
                        } else {
                            other += 1;
                        }
                    }
                }
                (ints, floats, other, missing)
            },
        )
        .reduce(
            || (0, 0, 0, 0),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2, a.3 + b.3),
        );

    if other_count > 0 {
        ColumnKind::Text
    } else if int_count > 0 && float_count == 0 && missing_count == 0 {
        ColumnKind::Integer
    } else {
        ColumnKind::Float
    }
}

fn build_series(name: &str, cells: &[Option<&str>]) -> Series {
    match detect_column_type(cells) {
        ColumnKind::Integer => {
            let ints: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| cell.and_then(|v| v.trim().parse::<i64>().ok()))
                .collect();
            Series::new(name, ints)
        }
        ColumnKind::Float => {
            let floats: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| cell.and_then(|v| v.trim().parse::<f64>().ok()))
                .collect();
            Series::new(name, floats)
        }
        ColumnKind::Text => Series::new(name, cells.to_vec()),
    }
}
