//! Label-indexed instrument vectors with label currying.
//!
//! A [`MetricVec`] bundles the instruments of one family that differ only in
//! their label values. Currying (`curry_with`) derives a narrower view sharing
//! the same backing map, so a sub-component can be handed a vector with some
//! labels already bound.

mod map;

use std::collections::HashMap;
use std::sync::Arc;

use crate::collector::{CollectedMetric, Collector};
use crate::desc::Desc;
use crate::error::{EsPushError, Result};
use crate::hash::{Fnv64a, LabelHasher};
use crate::metric::Metric;

use map::MetricMap;

/// A label whose value is fixed when the vector is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriedLabel {
    /// Position in the descriptor's variable labels.
    pub index: usize,
    pub value: String,
}

/// A (possibly curried) view over a family's instrument map.
pub struct MetricVec<M> {
    map: Arc<MetricMap<M>>,
    /// Sorted by `index`, each index at most once.
    curry: Vec<CurriedLabel>,
}

impl<M> Clone for MetricVec<M> {
    fn clone(&self) -> Self {
        Self {
            map: Arc::clone(&self.map),
            curry: self.curry.clone(),
        }
    }
}

impl<M> std::fmt::Debug for MetricVec<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricVec")
            .field("desc", self.map.desc())
            .field("curry", &self.curry)
            .finish_non_exhaustive()
    }
}

impl<M> MetricVec<M> {
    /// New vector hashing labels with FNV-1a.
    ///
    /// `new_metric` is called exactly once per distinct resolved label sequence.
    pub fn new<F>(desc: Desc, new_metric: F) -> Self
    where
        F: Fn(&[String]) -> M + Send + Sync + 'static,
    {
        Self::with_hasher(desc, Arc::new(Fnv64a), new_metric)
    }

    /// New vector with a substituted hashing strategy.
    pub fn with_hasher<F>(desc: Desc, hasher: Arc<dyn LabelHasher>, new_metric: F) -> Self
    where
        F: Fn(&[String]) -> M + Send + Sync + 'static,
    {
        Self {
            map: Arc::new(MetricMap::new(desc, hasher, Box::new(new_metric))),
            curry: Vec::new(),
        }
    }

    pub fn desc(&self) -> &Desc {
        self.map.desc()
    }

    pub fn curried_labels(&self) -> &[CurriedLabel] {
        &self.curry
    }

    /// Derive a view with `labels` bound in addition to the labels this view
    /// already curries.
    ///
    /// Fails if a supplied name is already curried, or if a supplied name is
    /// not a variable label of the family.
    pub fn curry_with(&self, labels: &HashMap<&str, &str>) -> Result<Self> {
        let mut new_curry = Vec::with_capacity(self.curry.len() + labels.len());
        let mut old_curry = self.curry.iter().peekable();

        for (i, label) in self.desc().variable_labels().iter().enumerate() {
            let supplied = labels.get(label.as_str());
            match old_curry.next_if(|c| c.index == i) {
                Some(curried) => {
                    if supplied.is_some() {
                        return Err(EsPushError::AlreadyCurried(label.clone()));
                    }
                    new_curry.push(curried.clone());
                }
                None => {
                    if let Some(value) = supplied {
                        new_curry.push(CurriedLabel {
                            index: i,
                            value: (*value).to_owned(),
                        });
                    }
                }
            }
        }

        let unknown = self.curry.len() + labels.len() - new_curry.len();
        if unknown > 0 {
            return Err(EsPushError::UnknownLabels(unknown));
        }

        Ok(Self {
            map: Arc::clone(&self.map),
            curry: new_curry,
        })
    }

    /// Merge curried values with positional `values` (descriptor order,
    /// curried positions skipped) into the full resolved sequence.
    pub fn resolve_label_values<'a>(&'a self, values: &[&'a str]) -> Result<Vec<&'a str>> {
        let total = self.desc().variable_labels().len();
        let expected = total - self.curry.len();
        if values.len() != expected {
            return Err(EsPushError::InconsistentCardinality {
                expected,
                got: values.len(),
            });
        }

        let mut resolved = Vec::with_capacity(total);
        let mut curry = self.curry.iter().peekable();
        let mut supplied = values.iter();
        for i in 0..total {
            match curry.next_if(|c| c.index == i) {
                Some(curried) => resolved.push(curried.value.as_str()),
                None => match supplied.next() {
                    Some(v) => resolved.push(*v),
                    None => {
                        return Err(EsPushError::Internal("label value count changed during resolve".into()))
                    }
                },
            }
        }
        Ok(resolved)
    }

    /// Merge curried values with a name-to-value map into the full resolved
    /// sequence. Every non-curried label must be present; no curried label
    /// may reappear.
    pub fn resolve_labels<'a>(&'a self, labels: &HashMap<&str, &'a str>) -> Result<Vec<&'a str>> {
        let names = self.desc().variable_labels();
        if let Some(curried) = self.curry.iter().find(|c| labels.contains_key(names[c.index].as_str())) {
            return Err(EsPushError::AlreadyCurried(names[curried.index].clone()));
        }

        let expected = names.len() - self.curry.len();
        if labels.len() != expected {
            return Err(EsPushError::InconsistentCardinality {
                expected,
                got: labels.len(),
            });
        }

        let mut resolved = Vec::with_capacity(names.len());
        let mut curry = self.curry.iter().peekable();
        for (i, name) in names.iter().enumerate() {
            let supplied = labels.get(name.as_str());
            match curry.next_if(|c| c.index == i) {
                Some(curried) => {
                    if supplied.is_some() {
                        return Err(EsPushError::AlreadyCurried(name.clone()));
                    }
                    resolved.push(curried.value.as_str());
                }
                None => match supplied {
                    Some(v) => resolved.push(*v),
                    None => return Err(EsPushError::MissingLabel(name.clone())),
                },
            }
        }
        Ok(resolved)
    }

    /// Instrument for positional label values, created on first use.
    pub fn get_metric_with_label_values(&self, values: &[&str]) -> Result<Arc<M>> {
        let resolved = self.resolve_label_values(values)?;
        Ok(self.get_with_resolved_values(&resolved))
    }

    /// Instrument for named label values, created on first use.
    pub fn get_metric_with(&self, labels: &HashMap<&str, &str>) -> Result<Arc<M>> {
        let resolved = self.resolve_labels(labels)?;
        Ok(self.get_with_resolved_values(&resolved))
    }

    /// Remove the instrument for positional label values.
    ///
    /// A wrong number of values is not an error: it can never match an
    /// instrument, so this returns `false`.
    pub fn delete_label_values(&self, values: &[&str]) -> bool {
        match self.resolve_label_values(values) {
            Ok(resolved) => self.delete_with_resolved_values(&resolved),
            Err(_) => false,
        }
    }

    /// Remove the instrument for named label values. Inconsistent labels
    /// return `false`, like [`MetricVec::delete_label_values`].
    pub fn delete(&self, labels: &HashMap<&str, &str>) -> bool {
        match self.resolve_labels(labels) {
            Ok(resolved) => self.delete_with_resolved_values(&resolved),
            Err(_) => false,
        }
    }

    /// Delete every instrument of the family, across all curried views.
    pub fn reset(&self) {
        self.map.reset();
    }

    /// Number of live instruments in the family (not only this view).
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_with_resolved_values(&self, resolved: &[&str]) -> Arc<M> {
        let hash = self.map.hasher().hash_values(resolved);
        self.map.get_or_create(hash, resolved)
    }

    fn delete_with_resolved_values(&self, resolved: &[&str]) -> bool {
        let hash = self.map.hasher().hash_values(resolved);
        self.map.delete(hash, resolved)
    }
}

/// Collecting a curried view yields the whole family, since all views share
/// one map.
impl<M: Metric + 'static> Collector for MetricVec<M> {
    fn desc(&self) -> &Desc {
        self.map.desc()
    }

    fn collect(&self) -> Vec<CollectedMetric> {
        self.map
            .collect_all()
            .into_iter()
            .map(|(hash, label_values, metric)| CollectedMetric {
                hash,
                label_values,
                metric,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn vec3() -> MetricVec<Vec<String>> {
        let desc = Desc::new("jobs_total", "help", ["job", "instance", "extra"]).unwrap();
        MetricVec::new(desc, |lvs: &[String]| lvs.to_vec())
    }

    fn labels<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn resolve_interleaves_curried_values() {
        let v = vec3().curry_with(&labels(&[("instance", "y")])).unwrap();
        assert_eq!(v.resolve_label_values(&["x", "z"]).unwrap(), vec!["x", "y", "z"]);
        assert_eq!(
            v.resolve_labels(&labels(&[("job", "x"), ("extra", "z")])).unwrap(),
            vec!["x", "y", "z"]
        );
    }

    #[test]
    fn positional_count_mismatch_is_rejected() {
        let v = vec3().curry_with(&labels(&[("job", "x")])).unwrap();
        let err = v.resolve_label_values(&["a", "b", "c"]).unwrap_err();
        assert!(matches!(err, EsPushError::InconsistentCardinality { expected: 2, got: 3 }));
    }

    #[test]
    fn named_form_reports_offending_name() {
        let v = vec3().curry_with(&labels(&[("job", "x")])).unwrap();

        let err = v.resolve_labels(&labels(&[("job", "x"), ("instance", "y")])).unwrap_err();
        assert!(matches!(err, EsPushError::AlreadyCurried(ref n) if n == "job"));

        let err = v.resolve_labels(&labels(&[("instance", "y"), ("nope", "z")])).unwrap_err();
        assert!(matches!(err, EsPushError::MissingLabel(ref n) if n == "extra"));
    }

    #[test]
    fn curried_views_share_instruments() {
        let root = vec3();
        let curried = root.curry_with(&labels(&[("job", "x")])).unwrap();

        let a = curried.get_metric_with_label_values(&["y", "z"]).unwrap();
        let b = root.get_metric_with_label_values(&["x", "y", "z"]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(root.len(), 1);

        assert!(curried.delete_label_values(&["y", "z"]));
        assert!(root.is_empty());
    }

    #[test]
    fn zero_label_family_has_one_instrument() {
        let desc = Desc::new("up", "help", Vec::<String>::new()).unwrap();
        let v = MetricVec::new(desc, |lvs: &[String]| lvs.len());
        let a = v.get_metric_with_label_values(&[]).unwrap();
        let b = v.get_metric_with(&HashMap::new()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, 0);
        assert_eq!(v.len(), 1);
    }
}
