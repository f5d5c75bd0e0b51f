use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::Table;
use crate::services::charts::ChartManifest;

/// The most recent successful upload.
#[derive(Debug)]
pub struct Dataset {
    pub display_name: String,
    pub table: Arc<Table>,
    pub manifest: ChartManifest,
    pub uploaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(display_name: impl Into<String>, table: Table, manifest: ChartManifest) -> Self {
        Self {
            display_name: display_name.into(),
            table: Arc::new(table),
            manifest,
            uploaded_at: Utc::now(),
        }
    }
}

/// Single-slot session shared by every request. Overwritten on upload, never merged.
#[derive(Debug, Default)]
pub struct SessionStore {
    slot: RwLock<Option<Arc<Dataset>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `dataset` and returns the one it replaced.
    pub fn replace(&self, dataset: Dataset) -> Option<Arc<Dataset>> {
        let mut slot = self.slot.write();
        let previous = slot.replace(Arc::new(dataset));
        if let Some(previous) = &previous {
            tracing::debug!("Session dataset {} replaced", previous.display_name);
        }
        previous
    }

    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.slot.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::file_processor::parse_table;

    #[test]
    fn starts_empty() {
        let store = SessionStore::new();
        assert!(!store.is_loaded());
        assert!(store.current().is_none());
    }

    #[test]
    fn replace_overwrites_the_slot() {
        let store = SessionStore::new();
        let first = parse_table("a\n1\n2\n").unwrap();
        let second = parse_table("a,b\n1,x\n").unwrap();

        assert!(store.replace(Dataset::new("first.csv", first, ChartManifest::default())).is_none());
        let previous = store
            .replace(Dataset::new("second.csv", second, ChartManifest::default()))
            .unwrap();

        assert_eq!(previous.display_name, "first.csv");
        let current = store.current().unwrap();
        assert_eq!(current.display_name, "second.csv");
        assert_eq!(current.table.shape(), (1, 2));
    }
}
