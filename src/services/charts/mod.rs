//! PNG rendering for the four chart kinds.

mod bar;
mod box_plot;
mod correlation;
mod histogram;
mod store;
mod style;

pub use bar::category_counts;
pub use correlation::correlation_matrix;
pub use histogram::{bin_values, Bins};
pub use store::{ChartStore, StagingArea};
pub use style::register_fonts;

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{display_values, present_numbers, Table};
use crate::services::utils::artifact_file_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Histogram,
    BoxPlot,
    Correlation,
    Bar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Histogram,
        ChartKind::BoxPlot,
        ChartKind::Correlation,
        ChartKind::Bar,
    ];

    /// Output directory under the static root, also the gallery route.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histograms",
            ChartKind::BoxPlot => "box_plots",
            ChartKind::Correlation => "correlation_matrix",
            ChartKind::Bar => "bar_plots",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::BoxPlot => "box_plots",
            ChartKind::Correlation => "correlation_matrix",
            ChartKind::Bar => "bar_plots",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "Histograms",
            ChartKind::BoxPlot => "Box plots",
            ChartKind::Correlation => "Correlation matrix",
            ChartKind::Bar => "Bar plots",
        }
    }
}

/// Files produced by one render, in production order.
#[derive(Debug, Clone, Default)]
pub struct ChartManifest {
    entries: Vec<(ChartKind, String)>,
}

impl ChartManifest {
    pub fn push(&mut self, kind: ChartKind, file_name: String) {
        self.entries.push((kind, file_name));
    }

    pub fn files(&self, kind: ChartKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    pub fn count(&self, kind: ChartKind) -> usize {
        self.entries.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(ChartKind, String)] {
        &self.entries
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
    pub max_bar_categories: usize,
}

impl ChartOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.chart_width,
            height: config.chart_height,
            histogram_bins: config.histogram_bins,
            max_bar_categories: config.max_bar_categories,
        }
    }
}

/// One image to draw, with its data already extracted from the table.
#[derive(Debug)]
enum ChartJob {
    Histogram { column: String, bins: Bins },
    BoxPlot { column: String, values: Vec<f64> },
    Correlation { columns: Vec<String>, matrix: Vec<Vec<Option<f64>>> },
    Bar { column: String, counts: Vec<(String, usize)> },
}

impl ChartJob {
    fn kind(&self) -> ChartKind {
        match self {
            ChartJob::Histogram { .. } => ChartKind::Histogram,
            ChartJob::BoxPlot { .. } => ChartKind::BoxPlot,
            ChartJob::Correlation { .. } => ChartKind::Correlation,
            ChartJob::Bar { .. } => ChartKind::Bar,
        }
    }

    fn draw(&self, path: &Path, options: &ChartOptions) -> style::DrawResult<()> {
        let size = (options.width, options.height);
        match self {
            ChartJob::Histogram { column, bins } => histogram::draw(path, size, column, bins),
            ChartJob::BoxPlot { column, values } => box_plot::draw(path, size, column, values),
            ChartJob::Correlation { columns, matrix } => correlation::draw(path, size, columns, matrix),
            ChartJob::Bar { column, counts } => bar::draw(path, size, column, counts),
        }
    }
}

pub struct ChartRenderer {
    options: ChartOptions,
}

impl ChartRenderer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    /// Draws every chart for `table` into `staging` and returns what was written.
    pub fn render(&self, table: &Table, staging: &StagingArea) -> Result<ChartManifest, AppError> {
        let start = std::time::Instant::now();
        let jobs = self.plan(table)?;

        let mut used_names: HashSet<String> = HashSet::new();
        let named: Vec<(String, &ChartJob)> = jobs
            .iter()
            .map(|job| {
                let file_name = match job {
                    ChartJob::Correlation { .. } => format!("{}.png", job.kind().file_prefix()),
                    ChartJob::Histogram { column, .. }
                    | ChartJob::BoxPlot { column, .. }
                    | ChartJob::Bar { column, .. } => {
                        artifact_file_name(job.kind().file_prefix(), column, &mut used_names)
                    }
                };
                (file_name, job)
            })
            .collect();

        named
            .par_iter()
            .map(|(file_name, job)| {
                let path = staging.dir(job.kind()).join(file_name);
                job.draw(&path, &self.options).map_err(|e| {
                    tracing::error!("Failed to draw {}: {}", path.display(), e);
                    AppError::Chart(format!("failed to draw {}: {}", file_name, e))
                })
            })
            .collect::<Result<Vec<()>, AppError>>()?;

        let mut manifest = ChartManifest::default();
        for (file_name, job) in named {
            manifest.push(job.kind(), file_name);
        }

        tracing::info!(
            "Rendered {} charts ({} histograms, {} box plots, {} correlation, {} bar) in {:?}",
            manifest.len(),
            manifest.count(ChartKind::Histogram),
            manifest.count(ChartKind::BoxPlot),
            manifest.count(ChartKind::Correlation),
            manifest.count(ChartKind::Bar),
            start.elapsed()
        );
        Ok(manifest)
    }

    fn plan(&self, table: &Table) -> Result<Vec<ChartJob>, AppError> {
        let mut histograms = Vec::new();
        let mut box_plots = Vec::new();
        for series in table.numeric_columns() {
            let values = present_numbers(series)?;
            if values.is_empty() {
                tracing::debug!("No values in {}, skipping numeric charts", series.name());
                continue;
            }
            if let Some(bins) = bin_values(&values, self.options.histogram_bins) {
                histograms.push(ChartJob::Histogram {
                    column: series.name().to_string(),
                    bins,
                });
            }
            box_plots.push(ChartJob::BoxPlot {
                column: series.name().to_string(),
                values,
            });
        }

        let mut jobs = histograms;
        jobs.extend(box_plots);

        if let Some((columns, matrix)) = correlation_matrix(table)? {
            jobs.push(ChartJob::Correlation { columns, matrix });
        }

        for series in table.text_columns() {
            let values = display_values(series)?;
            let counts = category_counts(&values, self.options.max_bar_categories);
            if counts.is_empty() {
                tracing::debug!("No values in {}, skipping bar chart", series.name());
                continue;
            }
            jobs.push(ChartJob::Bar {
                column: series.name().to_string(),
                counts,
            });
        }

        Ok(jobs)
    }
}
