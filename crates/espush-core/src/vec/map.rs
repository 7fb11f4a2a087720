//! Hash-bucketed instrument storage shared by all curried views of a family.
//!
//! Locking rules:
//! - One `RwLock` guards the whole bucket table.
//! - Lookups and collection take the read lock; creation, deletion and reset
//!   take the write lock.
//! - Creation re-checks the bucket after acquiring the write lock so two
//!   racing callers never construct two instruments for one label sequence.
//! - The factory runs under the write lock; it must not call back into the map.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::desc::Desc;
use crate::hash::LabelHasher;

/// Factory building a new instrument from its resolved label values.
pub(crate) type NewMetric<M> = dyn Fn(&[String]) -> M + Send + Sync;

type Buckets<M> = HashMap<u64, Vec<MetricWithLabelValues<M>>>;

/// An instrument and its label values, kept for disambiguation on hash collision.
struct MetricWithLabelValues<M> {
    values: Vec<String>,
    metric: Arc<M>,
}

pub(crate) struct MetricMap<M> {
    metrics: RwLock<Buckets<M>>,
    desc: Desc,
    hasher: Arc<dyn LabelHasher>,
    new_metric: Box<NewMetric<M>>,
}

impl<M> MetricMap<M> {
    pub(crate) fn new(desc: Desc, hasher: Arc<dyn LabelHasher>, new_metric: Box<NewMetric<M>>) -> Self {
        Self {
            metrics: RwLock::new(HashMap::new()),
            desc,
            hasher,
            new_metric,
        }
    }

    pub(crate) fn desc(&self) -> &Desc {
        &self.desc
    }

    pub(crate) fn hasher(&self) -> &dyn LabelHasher {
        self.hasher.as_ref()
    }

    // A panicking factory poisons the lock before anything is inserted, so the
    // table is still consistent and the guard can be recovered.
    fn read(&self) -> RwLockReadGuard<'_, Buckets<M>> {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Buckets<M>> {
        self.metrics.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the instrument for `values`, creating it on first use.
    pub(crate) fn get_or_create(&self, hash: u64, values: &[&str]) -> Arc<M> {
        let existing = lookup(&self.read(), hash, values);
        if let Some(metric) = existing {
            return metric;
        }

        let mut metrics = self.write();
        if let Some(metric) = lookup(&metrics, hash, values) {
            return metric;
        }

        let owned: Vec<String> = values.iter().map(|v| (*v).to_owned()).collect();
        let metric = Arc::new((self.new_metric)(&owned));
        tracing::trace!(fq_name = %self.desc.fq_name(), hash, labels = ?owned, "instrument created");
        metrics.entry(hash).or_default().push(MetricWithLabelValues {
            values: owned,
            metric: Arc::clone(&metric),
        });
        metric
    }

    /// Remove the instrument stored for `values`. Returns whether one was removed.
    pub(crate) fn delete(&self, hash: u64, values: &[&str]) -> bool {
        let mut metrics = self.write();
        let Some(bucket) = metrics.get_mut(&hash) else {
            return false;
        };
        let Some(i) = position(bucket, values) else {
            return false;
        };

        bucket.swap_remove(i);
        if bucket.is_empty() {
            metrics.remove(&hash);
        }
        tracing::debug!(fq_name = %self.desc.fq_name(), hash, "instrument deleted");
        true
    }

    /// Drop every instrument of the family.
    pub(crate) fn reset(&self) {
        self.write().clear();
        tracing::debug!(fq_name = %self.desc.fq_name(), "instrument map reset");
    }

    /// Number of live instruments.
    pub(crate) fn len(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    /// Point-in-time copy of `(hash, label values, instrument)` for every entry.
    ///
    /// Only the walk is atomic: the lock is released before the caller reads
    /// any instrument value.
    pub(crate) fn collect_all(&self) -> Vec<(u64, Vec<String>, Arc<M>)> {
        let metrics = self.read();
        let mut out = Vec::with_capacity(metrics.values().map(Vec::len).sum());
        for (hash, bucket) in metrics.iter() {
            for entry in bucket {
                out.push((*hash, entry.values.clone(), Arc::clone(&entry.metric)));
            }
        }
        out
    }
}

fn lookup<M>(metrics: &Buckets<M>, hash: u64, values: &[&str]) -> Option<Arc<M>> {
    let bucket = metrics.get(&hash)?;
    position(bucket, values).map(|i| Arc::clone(&bucket[i].metric))
}

fn position<M>(bucket: &[MetricWithLabelValues<M>], values: &[&str]) -> Option<usize> {
    bucket.iter().position(|entry| {
        entry.values.len() == values.len() && entry.values.iter().zip(values).all(|(a, b)| a == b)
    })
}
