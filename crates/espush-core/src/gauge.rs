//! Gauges: values that go up and down.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::counter::add_f64;
use crate::desc::Desc;
use crate::error::Result;
use crate::metric::{Metric, MetricValue};
use crate::vec::MetricVec;

#[derive(Debug, Default)]
pub struct Gauge {
    bits: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.add(1.0);
    }

    pub fn dec(&self) {
        self.add(-1.0);
    }

    pub fn add(&self, v: f64) {
        add_f64(&self.bits, v);
    }

    pub fn sub(&self, v: f64) {
        add_f64(&self.bits, -v);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Metric for Gauge {
    fn snapshot(&self) -> Result<MetricValue> {
        Ok(MetricValue::Gauge { value: self.get() })
    }
}

/// Gauges partitioned by label values.
pub type GaugeVec = MetricVec<Gauge>;

impl MetricVec<Gauge> {
    pub fn from_desc(desc: Desc) -> Self {
        MetricVec::new(desc, |_: &[String]| Gauge::new())
    }
}
