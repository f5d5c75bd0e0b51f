use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Where uploaded files are saved under their original name.
    pub upload_dir: PathBuf,
    /// Root of the four chart directories, served under `/static`.
    pub static_dir: PathBuf,
    pub max_file_size: usize,
    pub accepted_extension: String,
    pub encoding_sample_bytes: usize,
    pub histogram_bins: usize,
    pub max_bar_categories: usize,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upload_dir: PathBuf::from("tmp"),
            static_dir: PathBuf::from("static"),
            max_file_size: default_max_file_size(),
            accepted_extension: ".csv".to_string(),
            encoding_sample_bytes: 100_000,
            histogram_bins: 30,
            max_bar_categories: 50,
            chart_width: 800,
            chart_height: 600,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then overrides defaults from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();
        let config = Config {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr)?,
            upload_dir: env_or("UPLOAD_DIR", defaults.upload_dir)?,
            static_dir: env_or("STATIC_DIR", defaults.static_dir)?,
            max_file_size: env_or("MAX_FILE_SIZE", defaults.max_file_size)?,
            accepted_extension: defaults.accepted_extension,
            encoding_sample_bytes: env_or("ENCODING_SAMPLE_BYTES", defaults.encoding_sample_bytes)?,
            histogram_bins: env_or("HISTOGRAM_BINS", defaults.histogram_bins)?,
            max_bar_categories: env_or("MAX_BAR_CATEGORIES", defaults.max_bar_categories)?,
            chart_width: env_or("CHART_WIDTH", defaults.chart_width)?,
            chart_height: env_or("CHART_HEIGHT", defaults.chart_height)?,
        };
        config.validate()?;

        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.histogram_bins == 0 {
            anyhow::bail!("HISTOGRAM_BINS must be greater than zero");
        }
        if self.max_bar_categories == 0 {
            anyhow::bail!("MAX_BAR_CATEGORIES must be greater than zero");
        }
        if self.encoding_sample_bytes == 0 {
            anyhow::bail!("ENCODING_SAMPLE_BYTES must be greater than zero");
        }
        if self.chart_width < 100 || self.chart_height < 100 {
            anyhow::bail!("chart dimensions must be at least 100x100 pixels");
        }
        Ok(())
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
