use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w.\-]+").expect("file name pattern is valid"));

/// Cell spellings read as missing values, besides the empty cell.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

/// Header name for column `index`: blanks become `Unnamed: <index>`,
/// repeats get a `.1`, `.2`, ... suffix.
pub fn clean_column_name(name: &str, index: usize, existing_names: &mut HashSet<String>) -> String {
    let base_name = if name.trim().is_empty() {
        format!("Unnamed: {}", index)
    } else {
        name.to_string()
    };

    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}.{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

/// Deterministic PNG name for a chart of `column`, unique within `existing_names`.
pub fn artifact_file_name(prefix: &str, column: &str, existing_names: &mut HashSet<String>) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(column.trim(), "_");
    let cleaned = cleaned.trim_matches('.');
    let cleaned = if cleaned.is_empty() { "column" } else { cleaned };

    let base_name = format!("{}_{}", prefix, cleaned);
    let mut file_name = format!("{}.png", base_name);
    let mut counter = 2;
    while !existing_names.insert(file_name.clone()) {
        file_name = format!("{}_{}.png", base_name, counter);
        counter += 1;
    }

    file_name
}

pub fn update_min_max(min_max: &mut (Option<String>, Option<String>), value: &str) {
    match &min_max.0 {
        Some(min_val) if value < min_val.as_str() => min_max.0 = Some(value.to_string()),
        None => min_max.0 = Some(value.to_string()),
        _ => {}
    }

    match &min_max.1 {
        Some(max_val) if value > max_val.as_str() => min_max.1 = Some(value.to_string()),
        None => min_max.1 = Some(value.to_string()),
        _ => {}
    }
}

pub fn merge_min_max(
    a: (Option<String>, Option<String>),
    b: (Option<String>, Option<String>),
) -> (Option<String>, Option<String>) {
    let min = match (a.0, b.0) {
        (None, None) => None,
        (Some(v), None) | (None, Some(v)) => Some(v),
        (Some(v1), Some(v2)) => Some(if v1 < v2 { v1 } else { v2 }),
    };
    let max = match (a.1, b.1) {
        (None, None) => None,
        (Some(v), None) | (None, Some(v)) => Some(v),
        (Some(v1), Some(v2)) => Some(if v1 > v2 { v1 } else { v2 }),
    };
    (min, max)
}
