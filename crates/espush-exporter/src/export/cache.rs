use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fq_name: String,
    hash: u64,
    label_values: Vec<String>,
}

/// Last exported value of every counter, used to turn cumulative counters
/// into per-cycle increments.
///
/// Entries are never pruned: a deleted counter's last value stays behind, and
/// a counter recreated with the same labels starts from that stale baseline.
#[derive(Debug, Default)]
pub struct LastValueCache {
    values: HashMap<CacheKey, f64>,
}

impl LastValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` and return the increase since the previous call for
    /// the same instrument (`current` itself on first sight).
    pub fn delta(&mut self, fq_name: &str, hash: u64, label_values: &[String], current: f64) -> f64 {
        let key = CacheKey {
            fq_name: fq_name.to_owned(),
            hash,
            label_values: label_values.to_vec(),
        };
        let previous = self.values.insert(key, current).unwrap_or(0.0);
        current - previous
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
