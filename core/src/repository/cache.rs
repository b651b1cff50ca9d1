use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::model::{RecordSet, SourceId};
use crate::repository::traits::RecordSource;

/// Loaded record sets keyed by source path, validated against the source identity
/// on every lookup. A modified or resized file is reloaded; failed loads are not kept.
#[derive(Default)]
pub struct RecordSetCache {
    entries: HashMap<PathBuf, (SourceId, Arc<RecordSet>)>,
}

impl RecordSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load<S: RecordSource + ?Sized>(&mut self, source: &S) -> Result<Arc<RecordSet>> {
        let identity = source.identity()?;

        if let Some((cached_id, records)) = self.entries.get(&identity.path) {
            if *cached_id == identity {
                debug!(path = %identity.path.display(), "record cache hit");
                return Ok(Arc::clone(records));
            }
            debug!(path = %identity.path.display(), "source changed, reloading");
        }

        let loaded = Arc::new(source.load()?);
        // Key by the identity observed before loading; a write racing the load
        // leaves a stale id that fails the next comparison and reloads.
        self.entries
            .insert(identity.path.clone(), (identity, Arc::clone(&loaded)));
        Ok(loaded)
    }

    /// Drops the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        if self.entries.remove(path).is_some() {
            return true;
        }
        // Entries are keyed by canonical path.
        match std::fs::canonicalize(path) {
            Ok(canonical) => self.entries.remove(&canonical).is_some(),
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::cell::Cell;
    use std::time::{Duration, SystemTime};

    struct MockSource {
        len: Cell<u64>,
        loads: Cell<usize>,
        fail: bool,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                len: Cell::new(10),
                loads: Cell::new(0),
                fail: false,
            }
        }
    }

    impl RecordSource for MockSource {
        fn identity(&self) -> Result<SourceId> {
            Ok(SourceId {
                path: PathBuf::from("/mock/data.csv"),
                modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(100)),
                len: self.len.get(),
            })
        }

        fn load(&self) -> Result<RecordSet> {
            if self.fail {
                return Err(PipelineError::schema("Date", None, "missing column"));
            }
            self.loads.set(self.loads.get() + 1);
            Ok(RecordSet::new(Vec::new()))
        }
    }

    #[test]
    fn test_hit_returns_same_arc() {
        let source = MockSource::new();
        let mut cache = RecordSetCache::new();

        let first = cache.get_or_load(&source).unwrap();
        let second = cache.get_or_load(&source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_identity_reloads() {
        let source = MockSource::new();
        let mut cache = RecordSetCache::new();

        let first = cache.get_or_load(&source).unwrap();
        source.len.set(20);
        let second = cache.get_or_load(&source).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.get(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let source = MockSource::new();
        let mut cache = RecordSetCache::new();

        cache.get_or_load(&source).unwrap();
        assert!(cache.invalidate(Path::new("/mock/data.csv")));
        assert!(cache.is_empty());
        cache.get_or_load(&source).unwrap();
        assert_eq!(source.loads.get(), 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mut source = MockSource::new();
        source.fail = true;
        let mut cache = RecordSetCache::new();

        assert!(cache.get_or_load(&source).is_err());
        assert!(cache.is_empty());
    }
}
