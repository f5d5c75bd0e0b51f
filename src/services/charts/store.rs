use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::{ChartKind, ChartManifest};

const STAGING_DIR: &str = ".chart-staging";

/// The four chart directories under the static root, plus the upload directory
/// that is wiped alongside them.
#[derive(Debug, Clone)]
pub struct ChartStore {
    static_root: PathBuf,
    upload_dir: PathBuf,
}

/// Scratch directory a render writes into before `ChartStore::commit`.
/// Removed on drop.
#[derive(Debug)]
pub struct StagingArea {
    root: TempDir,
}

impl StagingArea {
    pub fn dir(&self, kind: ChartKind) -> PathBuf {
        self.root.path().join(kind.dir_name())
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }
}

impl ChartStore {
    pub fn new(static_root: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_root: static_root.into(),
            upload_dir: upload_dir.into(),
        }
    }

    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn dir(&self, kind: ChartKind) -> PathBuf {
        self.static_root.join(kind.dir_name())
    }

    /// Next to the static root, so staged files are never served and a rename
    /// into the galleries stays on one filesystem.
    pub fn staging_root(&self) -> PathBuf {
        let parent = match self.static_root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        parent.join(STAGING_DIR)
    }

    /// Creates every directory and empties it. Run once at startup.
    pub fn prepare(&self) -> io::Result<()> {
        for kind in ChartKind::ALL {
            fs::create_dir_all(self.dir(kind))?;
        }
        fs::create_dir_all(&self.upload_dir)?;
        let stale = clear_dir(&self.staging_root())?;
        if stale > 0 {
            tracing::warn!("Removed {} abandoned staging directories", stale);
        }
        self.reset()
    }

    /// Empties the chart and upload directories, keeping the directories themselves.
    pub fn reset(&self) -> io::Result<()> {
        let mut removed = 0;
        for kind in ChartKind::ALL {
            removed += clear_dir(&self.dir(kind))?;
        }
        removed += clear_dir(&self.upload_dir)?;
        tracing::info!("Cleared {} files from chart and upload directories", removed);
        Ok(())
    }

    /// Regular files of one gallery sorted by name, or `None` when its directory is gone.
    pub fn list(&self, kind: ChartKind) -> io::Result<Option<Vec<String>>> {
        let dir = self.dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(Some(files))
    }

    pub fn staging(&self) -> io::Result<StagingArea> {
        let staging_root = self.staging_root();
        fs::create_dir_all(&staging_root)?;
        let root = tempfile::Builder::new()
            .prefix("render-")
            .tempdir_in(&staging_root)?;
        for kind in ChartKind::ALL {
            fs::create_dir(root.path().join(kind.dir_name()))?;
        }
        Ok(StagingArea { root })
    }

    /// Replaces the contents of every chart directory with the staged files.
    pub fn commit(&self, staging: StagingArea, manifest: &ChartManifest) -> io::Result<()> {
        for kind in ChartKind::ALL {
            let target = self.dir(kind);
            fs::create_dir_all(&target)?;
            let removed = clear_dir(&target)?;
            tracing::debug!("Removed {} stale files from {}", removed, target.display());
        }

        for (kind, file_name) in manifest.entries() {
            fs::rename(staging.dir(*kind).join(file_name), self.dir(*kind).join(file_name))?;
        }

        tracing::debug!("Committed {} charts from {}", manifest.len(), staging.path().display());
        Ok(())
    }
}

fn clear_dir(dir: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}
