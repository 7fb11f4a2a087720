//! Summaries: sum, count, and quantile estimates over recent observations.
//!
//! Quantiles are computed at snapshot time with the nearest-rank method over
//! a bounded window of the most recent observations. `sum` and `count` cover
//! every observation ever made.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::desc::{quantile_field, Desc};
use crate::error::{EsPushError, Result};
use crate::metric::{Metric, MetricValue, Quantile};
use crate::vec::MetricVec;

/// Default quantile objectives.
pub const DEFAULT_OBJECTIVES: [f64; 3] = [0.5, 0.9, 0.99];
/// Default observation window.
pub const DEFAULT_MAX_SAMPLES: usize = 500;

#[derive(Debug, Clone)]
pub struct SummaryOpts {
    /// Quantiles to estimate, each in the open interval (0, 1).
    pub objectives: Vec<f64>,
    /// Number of recent observations kept for quantile estimation.
    pub max_samples: usize,
}

impl Default for SummaryOpts {
    fn default() -> Self {
        Self {
            objectives: DEFAULT_OBJECTIVES.to_vec(),
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl SummaryOpts {
    pub fn validate(&self) -> Result<()> {
        if self.max_samples == 0 {
            return Err(EsPushError::InvalidMetric("summary max_samples must be positive".into()));
        }
        let mut fields = HashSet::with_capacity(self.objectives.len());
        for q in &self.objectives {
            if !(*q > 0.0 && *q < 1.0) {
                return Err(EsPushError::InvalidMetric(format!(
                    "summary objective {q} must be in (0, 1)"
                )));
            }
            // Each objective is exported under its own field.
            let field = quantile_field(*q);
            if !fields.insert(field.clone()) {
                return Err(EsPushError::InvalidMetric(format!(
                    "summary objective {q} maps to duplicate field {field}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SummaryState {
    window: VecDeque<f64>,
    sum: f64,
    count: u64,
}

#[derive(Debug)]
pub struct Summary {
    objectives: Arc<[f64]>,
    max_samples: usize,
    state: Mutex<SummaryState>,
}

impl Summary {
    /// Build a summary; options are validated.
    pub fn new(opts: &SummaryOpts) -> Result<Self> {
        opts.validate()?;
        Ok(Self::with_objectives(opts.objectives.clone().into(), opts.max_samples))
    }

    fn with_objectives(objectives: Arc<[f64]>, max_samples: usize) -> Self {
        Self {
            objectives,
            max_samples,
            state: Mutex::new(SummaryState {
                window: VecDeque::with_capacity(max_samples.min(64)),
                ..SummaryState::default()
            }),
        }
    }

    pub fn observe(&self, v: f64) {
        // Poisoned mutex means a bug elsewhere; drop the observation instead of panicking.
        let Ok(mut state) = self.state.lock() else {
            tracing::debug!("summary state poisoned; observation dropped");
            return;
        };
        state.sum += v;
        state.count += 1;
        if state.window.len() == self.max_samples {
            state.window.pop_front();
        }
        state.window.push_back(v);
    }
}

impl Metric for Summary {
    fn snapshot(&self) -> Result<MetricValue> {
        let (sum, count, mut window) = {
            let state = self
                .state
                .lock()
                .map_err(|_| EsPushError::Snapshot("summary state poisoned".into()))?;
            (state.sum, state.count, Vec::from(state.window.clone()))
        };

        window.sort_by(f64::total_cmp);
        let quantiles = self
            .objectives
            .iter()
            .map(|&q| Quantile {
                quantile: q,
                value: nearest_rank(&window, q),
            })
            .collect();

        Ok(MetricValue::Summary { sum, count, quantiles })
    }
}

fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Summaries partitioned by label values.
pub type SummaryVec = MetricVec<Summary>;

impl MetricVec<Summary> {
    pub fn with_opts(desc: Desc, opts: SummaryOpts) -> Result<Self> {
        opts.validate()?;
        let objectives: Arc<[f64]> = opts.objectives.into();
        let max_samples = opts.max_samples;
        Ok(MetricVec::new(desc, move |_: &[String]| {
            Summary::with_objectives(Arc::clone(&objectives), max_samples)
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use super::*;

    fn quantiles(value: MetricValue) -> (f64, u64, Vec<Quantile>) {
        match value {
            MetricValue::Summary { sum, count, quantiles } => (sum, count, quantiles),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn quantiles_follow_nearest_rank() {
        let s = Summary::new(&SummaryOpts::default()).unwrap();
        for v in 1..=100 {
            s.observe(f64::from(v));
        }
        let (sum, count, qs) = quantiles(s.snapshot().unwrap());
        assert_eq!(sum, 5050.0);
        assert_eq!(count, 100);
        let values: Vec<f64> = qs.iter().map(|q| q.value).collect();
        assert_eq!(values, vec![50.0, 90.0, 99.0]);
    }

    #[test]
    fn window_keeps_most_recent_observations() {
        let opts = SummaryOpts {
            objectives: vec![0.5],
            max_samples: 3,
        };
        let s = Summary::new(&opts).unwrap();
        for v in [100.0, 1.0, 2.0, 3.0] {
            s.observe(v);
        }
        let (sum, count, qs) = quantiles(s.snapshot().unwrap());
        assert_eq!(sum, 106.0);
        assert_eq!(count, 4);
        assert_eq!(qs[0].value, 2.0);
    }

    #[test]
    fn empty_summary_reports_nan_quantiles() {
        let s = Summary::new(&SummaryOpts::default()).unwrap();
        let (_, count, qs) = quantiles(s.snapshot().unwrap());
        assert_eq!(count, 0);
        assert!(qs.iter().all(|q| q.value.is_nan()));
    }

    #[test]
    fn rejects_bad_objectives() {
        let opts = SummaryOpts {
            objectives: vec![0.5, 1.0],
            ..SummaryOpts::default()
        };
        assert!(Summary::new(&opts).is_err());
        let desc = Desc::new("latency_seconds", "help", ["route"]).unwrap();
        assert!(SummaryVec::with_opts(desc, opts).is_err());
    }

    #[test]
    fn rejects_objectives_sharing_a_field() {
        let dup = SummaryOpts {
            objectives: vec![0.5, 0.9, 0.5],
            ..SummaryOpts::default()
        };
        let err = dup.validate().unwrap_err();
        assert!(matches!(err, EsPushError::InvalidMetric(ref m) if m.contains("QUANTILE_50")));

        // Distinct values that round to the same field name.
        let rounded = SummaryOpts {
            objectives: vec![0.99999, 0.999991],
            ..SummaryOpts::default()
        };
        assert!(Summary::new(&rounded).is_err());

        let fine = SummaryOpts {
            objectives: vec![0.5, 0.75, 0.99, 0.999],
            ..SummaryOpts::default()
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn poisoned_state_fails_snapshot() {
        let s = Summary::new(&SummaryOpts::default()).unwrap();
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = s.state.lock().unwrap();
                    panic!("poison the summary");
                })
                .join()
        });
        assert!(matches!(s.snapshot(), Err(EsPushError::Snapshot(_))));
    }
}
