//! Registry of metric families exported together.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use espush_core::collector::{CollectedMetric, Collector};
use espush_core::desc::Desc;
use espush_core::error::{EsPushError, Result};

/// One family's instruments from a gather pass.
#[derive(Debug)]
pub struct Gathered {
    pub desc: Desc,
    pub metrics: Vec<CollectedMetric>,
}

/// Collectors keyed by fully-qualified metric name.
#[derive(Default)]
pub struct Registry {
    collectors: DashMap<String, Arc<dyn Collector>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            collectors: DashMap::new(),
        }
    }

    /// Register a collector. Names are unique within a registry.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let name = collector.desc().fq_name().to_owned();
        match self.collectors.entry(name) {
            Entry::Occupied(e) => Err(EsPushError::AlreadyRegistered(e.key().clone())),
            Entry::Vacant(e) => {
                tracing::debug!(fq_name = %e.key(), "collector registered");
                e.insert(collector);
                Ok(())
            }
        }
    }

    pub fn unregister(&self, fq_name: &str) -> bool {
        self.collectors.remove(fq_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Collect every registered family, sorted by name.
    ///
    /// Collectors are cloned out first so no shard lock is held while a
    /// family walks its own instrument map.
    pub fn gather(&self) -> Vec<Gathered> {
        let mut collectors: Vec<Arc<dyn Collector>> =
            self.collectors.iter().map(|e| Arc::clone(e.value())).collect();
        collectors.sort_by(|a, b| a.desc().fq_name().cmp(b.desc().fq_name()));

        collectors
            .into_iter()
            .map(|c| Gathered {
                desc: c.desc().clone(),
                metrics: c.collect(),
            })
            .collect()
    }
}
