//! Monotonic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::desc::Desc;
use crate::error::Result;
use crate::metric::{Metric, MetricValue};
use crate::vec::MetricVec;

/// A monotonically increasing `f64`.
#[derive(Debug, Default)]
pub struct Counter {
    bits: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.inc_by(1.0);
    }

    /// Add `v`. Negative and NaN increments are ignored.
    pub fn inc_by(&self, v: f64) {
        if v.is_nan() || v < 0.0 {
            tracing::debug!(increment = v, "counter cannot decrease; increment ignored");
            return;
        }
        add_f64(&self.bits, v);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Metric for Counter {
    fn snapshot(&self) -> Result<MetricValue> {
        Ok(MetricValue::Counter { value: self.get() })
    }
}

/// Lock-free `f64` add on top of an `AtomicU64` bit pattern.
pub(crate) fn add_f64(bits: &AtomicU64, v: f64) {
    let mut current = bits.load(Ordering::Relaxed);
    loop {
        let next = (f64::from_bits(current) + v).to_bits();
        match bits.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

/// Counters partitioned by label values.
pub type CounterVec = MetricVec<Counter>;

impl MetricVec<Counter> {
    pub fn from_desc(desc: Desc) -> Self {
        MetricVec::new(desc, |_: &[String]| Counter::new())
    }
}
