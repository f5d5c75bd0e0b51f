use polars::prelude::*;
use smallvec::SmallVec;

use crate::error::AppError;

pub const SAMPLE_SIZE: usize = 3;

/// Inferred scalar type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
                ColumnKind::Integer
            }
            DataType::Float32 | DataType::Float64 => ColumnKind::Float,
            _ => ColumnKind::Text,
        }
    }

    /// Type name shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Text => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// A parsed dataset. Shape is fixed once built.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
}

impl Table {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.frame.height(), self.frame.width())
    }

    pub fn columns(&self) -> &[Series] {
        self.frame.get_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|&s| s.to_string())
            .collect()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Series> {
        self.columns().iter().filter(|s| kind_of(s).is_numeric())
    }

    pub fn text_columns(&self) -> impl Iterator<Item = &Series> {
        self.columns().iter().filter(|s| kind_of(s) == ColumnKind::Text)
    }
}

pub fn kind_of(series: &Series) -> ColumnKind {
    ColumnKind::from_dtype(series.dtype())
}

/// Column values as floats, `None` where missing.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>, AppError> {
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// Plottable values of a numeric column: present and finite.
pub fn present_numbers(series: &Series) -> Result<Vec<f64>, AppError> {
    Ok(numeric_values(series)?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect())
}

/// Column values as display strings, `None` where missing.
pub fn display_values(series: &Series) -> Result<Vec<Option<String>>, AppError> {
    let values = match kind_of(series) {
        ColumnKind::Integer => series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(|v| v.to_string()))
            .collect(),
        ColumnKind::Float => numeric_values(series)?
            .into_iter()
            .map(|v| v.filter(|v| !v.is_nan()).map(|v| format!("{:?}", v)))
            .collect(),
        ColumnKind::Text => series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
    };
    Ok(values)
}

/// Per-column overview shown in the "info" table.
#[derive(Debug)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: ColumnKind,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
    pub non_null_count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub has_duplicates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeMode {
    /// Numeric columns only; falls back to every column when none are numeric.
    Numeric,
    /// Every column.
    All,
}

#[derive(Debug, Clone)]
pub struct DescribeRow {
    pub label: &'static str,
    /// One cell per described column; `None` renders as `NaN`.
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct DescribeTable {
    pub columns: Vec<String>,
    pub rows: Vec<DescribeRow>,
}

impl DescribeTable {
    pub fn row(&self, label: &str) -> Option<&DescribeRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.rows.iter().map(|row| row.label).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug)]
pub struct Profile {
    pub row_count: usize,
    pub column_count: usize,
    pub column_info: Vec<ColumnSummary>,
    pub describe: DescribeTable,
    pub missing: Vec<MissingCount>,
    pub duplicates: usize,
}

impl Profile {
    /// Columns with at least one missing value.
    pub fn missing_nonzero(&self) -> Vec<&MissingCount> {
        self.missing.iter().filter(|m| m.missing > 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let frame = DataFrame::new(vec![
            Series::new("id", vec![Some(1i64), Some(2), Some(3)]),
            Series::new("score", vec![Some(1.5f64), None, Some(3.0)]),
            Series::new("city", vec![Some("Lima"), None, Some("Quito")]),
        ])
        .unwrap();
        Table::new(frame)
    }

    #[test]
    fn kinds_follow_the_frame_dtypes() {
        let table = sample_table();
        let kinds: Vec<ColumnKind> = table.columns().iter().map(kind_of).collect();
        assert_eq!(kinds, vec![ColumnKind::Integer, ColumnKind::Float, ColumnKind::Text]);
        assert_eq!(table.numeric_columns().count(), 2);
        assert_eq!(table.text_columns().count(), 1);
        assert_eq!(table.shape(), (3, 3));
    }

    #[test]
    fn display_values_keep_missing_cells() {
        let table = sample_table();
        let score = display_values(&table.columns()[1]).unwrap();
        assert_eq!(score, vec![Some("1.5".to_string()), None, Some("3.0".to_string())]);
        let city = display_values(&table.columns()[2]).unwrap();
        assert_eq!(city[1], None);
    }

    #[test]
    fn present_numbers_skip_missing_and_infinite_cells() {
        let series = Series::new("a", vec![Some(1.0f64), None, Some(f64::INFINITY), Some(f64::NAN), Some(2.0)]);
        assert_eq!(present_numbers(&series).unwrap(), vec![1.0, 2.0]);
    }
}
