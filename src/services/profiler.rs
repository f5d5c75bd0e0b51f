use polars::prelude::*;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashSet;

use crate::error::AppError;
use crate::models::{
    display_values, kind_of, ColumnKind, ColumnSummary, DescribeMode, DescribeRow,
    DescribeTable, MissingCount, Profile, Table, SAMPLE_SIZE,
};
use crate::services::utils::{merge_min_max, update_min_max};

/// Rows shown in the upload preview.
pub const HEAD_ROWS: usize = 10;

const NUMERIC_ROWS: [&str; 7] = ["mean", "std", "min", "25%", "50%", "75%", "max"];
const TEXT_ROWS: [&str; 3] = ["unique", "top", "freq"];

pub fn profile(table: &Table, mode: DescribeMode) -> Result<Profile, AppError> {
    let start = std::time::Instant::now();
    let (row_count, column_count) = table.shape();

    let column_info = table
        .columns()
        .par_iter()
        .map(analyze_column)
        .collect::<Result<Vec<_>, AppError>>()?;

    let profile = Profile {
        row_count,
        column_count,
        column_info,
        describe: describe(table, mode)?,
        missing: missing_counts(table),
        duplicates: duplicate_rows(table)?,
    };

    tracing::info!(
        "Profiled {} rows x {} columns ({:?} describe) in {:?}",
        row_count,
        column_count,
        mode,
        start.elapsed()
    );
    Ok(profile)
}

pub fn missing_counts(table: &Table) -> Vec<MissingCount> {
    table
        .columns()
        .iter()
        .map(|series| MissingCount {
            column: series.name().to_string(),
            missing: series.null_count(),
        })
        .collect()
}

/// Rows equal to an earlier row across every column. Missing equals missing.
pub fn duplicate_rows(table: &Table) -> Result<usize, AppError> {
    let frame = table.frame();
    if frame.height() == 0 || frame.width() == 0 {
        return Ok(0);
    }
    let distinct = frame.unique_stable(None, UniqueKeepStrategy::First, None)?;
    Ok(frame.height() - distinct.height())
}

/// First `limit` rows as display strings.
pub fn head(table: &Table, limit: usize) -> Result<Vec<Vec<Option<String>>>, AppError> {
    let preview = table.frame().head(Some(limit));
    let columns = preview
        .get_columns()
        .iter()
        .map(display_values)
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok((0..preview.height())
        .map(|row| columns.iter().map(|column| column[row].clone()).collect())
        .collect())
}

#[derive(Debug)]
struct NumericStats {
    count: usize,
    mean: Option<f64>,
    std: Option<f64>,
    min: Option<f64>,
    q1: Option<f64>,
    median: Option<f64>,
    q3: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug)]
struct TextStats {
    count: usize,
    unique: usize,
    top: Option<String>,
    freq: Option<usize>,
}

#[derive(Debug)]
enum ColumnStats {
    Numeric(NumericStats),
    Text(TextStats),
}

impl ColumnStats {
    fn count(&self) -> usize {
        match self {
            ColumnStats::Numeric(stats) => stats.count,
            ColumnStats::Text(stats) => stats.count,
        }
    }

    fn numeric_cell(&self, label: &str) -> Option<String> {
        let ColumnStats::Numeric(stats) = self else {
            return None;
        };
        let value = match label {
            "mean" => stats.mean,
            "std" => stats.std,
            "min" => stats.min,
            "25%" => stats.q1,
            "50%" => stats.median,
            "75%" => stats.q3,
            "max" => stats.max,
            _ => None,
        };
        value.map(format_number)
    }

    fn text_cell(&self, label: &str) -> Option<String> {
        let ColumnStats::Text(stats) = self else {
            return None;
        };
        match label {
            "unique" => Some(stats.unique.to_string()),
            "top" => stats.top.clone(),
            "freq" => stats.freq.map(|f| f.to_string()),
            _ => None,
        }
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

/// Describe table. `Numeric` covers numeric columns unless there are none.
pub fn describe(table: &Table, mode: DescribeMode) -> Result<DescribeTable, AppError> {
    let numeric: Vec<&Series> = table.numeric_columns().collect();
    let selected: Vec<&Series> = match mode {
        DescribeMode::Numeric if !numeric.is_empty() => numeric,
        _ => table.columns().iter().collect(),
    };

    let stats = selected
        .par_iter()
        .map(|series| column_stats(series))
        .collect::<Result<Vec<_>, AppError>>()?;

    let has_text = stats.iter().any(|s| matches!(s, ColumnStats::Text(_)));
    let has_numeric = stats.iter().any(|s| matches!(s, ColumnStats::Numeric(_)));

    let mut rows = vec![DescribeRow {
        label: "count",
        cells: stats.iter().map(|s| Some(s.count().to_string())).collect(),
    }];
    if has_text {
        rows.extend(TEXT_ROWS.iter().map(|&label| DescribeRow {
            label,
            cells: stats.iter().map(|s| s.text_cell(label)).collect(),
        }));
    }
    if has_numeric {
        rows.extend(NUMERIC_ROWS.iter().map(|&label| DescribeRow {
            label,
            cells: stats.iter().map(|s| s.numeric_cell(label)).collect(),
        }));
    }

    Ok(DescribeTable {
        columns: selected.iter().map(|s| s.name().to_string()).collect(),
        rows,
    })
}

fn column_stats(series: &Series) -> Result<ColumnStats, AppError> {
    let present = series.drop_nulls();

    if kind_of(series).is_numeric() {
        let values = present.cast(&DataType::Float64)?;
        let quartile = |q: f64| -> Result<Option<f64>, AppError> {
            first_value(&values.quantile_as_series(q, QuantileInterpolOptions::Linear)?)
        };
        return Ok(ColumnStats::Numeric(NumericStats {
            count: values.len(),
            mean: values.mean(),
            std: first_value(&values.std_as_series(1)?)?,
            min: values.min::<f64>()?,
            q1: quartile(0.25)?,
            median: quartile(0.5)?,
            q3: quartile(0.75)?,
            max: values.max::<f64>()?,
        }));
    }

    let top = most_frequent(&present)?;
    Ok(ColumnStats::Text(TextStats {
        count: present.len(),
        unique: present.n_unique()?,
        freq: top.as_ref().map(|(_, freq)| *freq),
        top: top.map(|(value, _)| value),
    }))
}

/// Reads the single value of an aggregate series, `None` when it is null.
fn first_value(aggregate: &Series) -> Result<Option<f64>, AppError> {
    let values = aggregate.cast(&DataType::Float64)?;
    Ok(values.f64()?.get(0))
}

/// Most frequent value and its count. Ties go to the value seen first.
fn most_frequent(present: &Series) -> Result<Option<(String, usize)>, AppError> {
    let mut values = present.cast(&DataType::String)?;
    values.rename("value");
    let counts = values.value_counts(false, false)?;

    let tallies = counts.column("count")?.cast(&DataType::UInt64)?;
    let tallies = tallies.u64()?;
    let Some(freq) = tallies.max() else {
        return Ok(None);
    };

    let tied: HashSet<&str> = counts
        .column("value")?
        .str()?
        .into_iter()
        .zip(tallies.into_iter())
        .filter_map(|(value, count)| match (value, count) {
            (Some(value), Some(count)) if count == freq => Some(value),
            _ => None,
        })
        .collect();

    let top = values
        .str()?
        .into_iter()
        .flatten()
        .find(|value| tied.contains(value))
        .map(|value| (value.to_string(), freq as usize));
    Ok(top)
}

fn analyze_column(series: &Series) -> Result<ColumnSummary, AppError> {
    let data_type = kind_of(series);
    let values = display_values(series)?;
    let null_count = series.null_count();

    let (unique_count, min_max) = if data_type.is_numeric() {
        let present = series.drop_nulls();
        let min = present.min::<f64>()?.map(|v| v.to_string());
        let max = present.max::<f64>()?.map(|v| v.to_string());
        (present.n_unique()?, (min, max))
    } else {
        let (seen, min_max) = values
            .par_iter()
            .flatten()
            .fold(
                || (HashSet::new(), (None, None)),
                |(mut seen, mut min_max), value| {
                    update_min_max(&mut min_max, value);
                    seen.insert(value.as_str());
                    (seen, min_max)
                },
            )
            .reduce(
                || (HashSet::new(), (None, None)),
                |a, b| {
                    let mut combined_set = a.0;
                    combined_set.extend(b.0);
                    (combined_set, merge_min_max(a.1, b.1))
                },
            );
        (seen.len(), min_max)
    };

    let mut sample_values = SmallVec::<[String; SAMPLE_SIZE]>::new();
    values.iter().take(SAMPLE_SIZE).for_each(|value| {
        sample_values.push(value.clone().unwrap_or_else(|| "NaN".to_string()));
    });

    let non_null_count = values.len() - null_count;
    Ok(ColumnSummary {
        name: series.name().to_string(),
        data_type,
        sample_values,
        non_null_count,
        null_count,
        unique_count,
        min_value: min_max.0,
        max_value: min_max.1,
        has_duplicates: unique_count < non_null_count,
    })
}

/// Labels for the upload summary's type list.
pub fn column_types(table: &Table) -> Vec<(String, ColumnKind)> {
    table
        .columns()
        .iter()
        .map(|series| (series.name().to_string(), kind_of(series)))
        .collect()
}
