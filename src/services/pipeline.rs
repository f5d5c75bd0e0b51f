use crate::config::Config;
use crate::error::AppError;
use crate::models::{DescribeMode, Profile};
use crate::services::charts::{ChartOptions, ChartRenderer, ChartStore};
use crate::services::encoding;
use crate::services::file_processor;
use crate::services::profiler::{self, HEAD_ROWS};
use crate::services::session::Dataset;

/// A committed upload with everything its summary page shows.
#[derive(Debug)]
pub struct Ingested {
    pub dataset: Dataset,
    /// Numeric describe, as the upload summary shows it.
    pub profile: Profile,
    pub head: Vec<Vec<Option<String>>>,
}

/// Runs an accepted upload end to end: save, detect, load, render, profile, commit.
/// Any failure leaves the committed charts and the session as they were.
pub fn ingest(
    config: &Config,
    charts: &ChartStore,
    file_name: &str,
    data: &[u8],
) -> Result<Ingested, AppError> {
    let start = std::time::Instant::now();

    let path = file_processor::save_upload(&config.upload_dir, file_name, data)?;
    let detection = encoding::detect_file(&path, config.encoding_sample_bytes)?;
    let table = file_processor::load_table(&path, detection.encoding)?;
    let (rows, columns) = table.shape();
    tracing::info!("Loaded {} rows x {} columns from {}", rows, columns, path.display());

    let staging = charts.staging()?;
    let renderer = ChartRenderer::new(ChartOptions::from_config(config));
    let manifest = renderer.render(&table, &staging)?;

    let profile = profiler::profile(&table, DescribeMode::Numeric)?;
    let head = profiler::head(&table, HEAD_ROWS)?;

    charts.commit(staging, &manifest)?;

    let display_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| file_name.to_string());

    tracing::info!(
        "Ingested {} with {} charts in {:?}",
        display_name,
        manifest.len(),
        start.elapsed()
    );
    Ok(Ingested {
        dataset: Dataset::new(display_name, table, manifest),
        profile,
        head,
    })
}

/// True when `file_name` carries the accepted extension (case-sensitive).
pub fn has_accepted_extension(file_name: &str, extension: &str) -> bool {
    !file_name.is_empty() && file_name.ends_with(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::charts::ChartKind;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn setup(root: &Path) -> (Config, ChartStore) {
        let config = Config {
            upload_dir: root.join("tmp"),
            static_dir: root.join("static"),
            chart_width: 320,
            chart_height: 240,
            ..Config::default()
        };
        let charts = ChartStore::new(&config.static_dir, &config.upload_dir);
        charts.prepare().unwrap();
        (config, charts)
    }

    #[test]
    fn ingest_commits_charts_and_keeps_the_upload() {
        let dir = tempdir().unwrap();
        let (config, charts) = setup(dir.path());

        let dataset = ingest(&config, &charts, "scores.csv", b"name,score\nann,1\nbob,2\n")
            .unwrap()
            .dataset;

        assert_eq!(dataset.display_name, "scores.csv");
        assert_eq!(dataset.table.shape(), (2, 2));
        assert!(config.upload_dir.join("scores.csv").is_file());
        assert_eq!(
            charts.list(ChartKind::Histogram).unwrap(),
            Some(vec!["histogram_score.png".to_string()])
        );
        assert_eq!(
            charts.list(ChartKind::Bar).unwrap(),
            Some(vec!["bar_plots_name.png".to_string()])
        );
    }

    #[test]
    fn decode_failure_keeps_previous_charts() {
        let dir = tempdir().unwrap();
        let (mut config, charts) = setup(dir.path());
        ingest(&config, &charts, "first.csv", b"a\n1\n2\n").unwrap();

        config.encoding_sample_bytes = 8;
        let mut data = b"a,b\n1,2\n".to_vec();
        data.extend_from_slice(&[b'3', b',', 0xFF, b'\n']);
        let err = ingest(&config, &charts, "second.csv", &data).unwrap_err();

        assert!(matches!(err, AppError::Decode(_)));
        assert_eq!(
            charts.list(ChartKind::Histogram).unwrap(),
            Some(vec!["histogram_a.png".to_string()])
        );
        assert_eq!(fs::read_dir(charts.staging_root()).unwrap().count(), 0);
    }

    #[test]
    fn ingest_profiles_the_table_for_the_summary() {
        let dir = tempdir().unwrap();
        let (config, charts) = setup(dir.path());

        let ingested = ingest(&config, &charts, "mixed.csv", b"id,city\n1,Lima\n1,Lima\n3,\n").unwrap();

        assert_eq!((ingested.profile.row_count, ingested.profile.column_count), (3, 2));
        assert_eq!(ingested.profile.duplicates, 1);
        assert_eq!(ingested.profile.describe.columns, vec!["id"]);
        assert_eq!(ingested.profile.missing_nonzero().len(), 1);
        assert_eq!(ingested.head.len(), 3);
        assert_eq!(ingested.head[2], vec![Some("3".to_string()), None]);
        assert_eq!(ingested.dataset.manifest.len(), 4);
    }

    #[test]
    fn extension_check_is_case_sensitive() {
        assert!(has_accepted_extension("data.csv", ".csv"));
        assert!(!has_accepted_extension("data.CSV", ".csv"));
        assert!(!has_accepted_extension("data.txt", ".csv"));
        assert!(!has_accepted_extension("", ".csv"));
    }
}
