//! Type-erased view of a metric family for registries and exporters.

use std::sync::Arc;

use crate::desc::Desc;
use crate::metric::Metric;

/// One live instrument as seen by a collection pass.
#[derive(Clone)]
pub struct CollectedMetric {
    /// Bucket hash the instrument is stored under.
    pub hash: u64,
    /// Fully resolved label values, in descriptor order.
    pub label_values: Vec<String>,
    pub metric: Arc<dyn Metric>,
}

impl std::fmt::Debug for CollectedMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectedMetric")
            .field("hash", &self.hash)
            .field("label_values", &self.label_values)
            .finish_non_exhaustive()
    }
}

/// A metric family that can describe itself and enumerate its instruments.
pub trait Collector: Send + Sync {
    fn desc(&self) -> &Desc;
    fn collect(&self) -> Vec<CollectedMetric>;
}
