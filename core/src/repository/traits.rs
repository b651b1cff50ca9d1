use crate::error::Result;
use crate::model::{RecordSet, SourceId};

/// Somewhere records can be loaded from.
pub trait RecordSource {
    /// Cheap identity check, used as the cache key.
    fn identity(&self) -> Result<SourceId>;
    fn load(&self) -> Result<RecordSet>;
}
