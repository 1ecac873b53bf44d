//! Aggregate quality score against labelled data.

use annotation_core::{AnnotationError, AnnotationResult};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub fn accuracy<T: PartialEq>(truth: &[T], predicted: &[T]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// Per-label F1 averaged with weights equal to each label's true support.
/// Labels that only appear in predictions carry zero weight.
pub fn weighted_f1<T: Eq + Hash>(truth: &[T], predicted: &[T]) -> f64 {
    let mut support: HashMap<&T, usize> = HashMap::new();
    let mut predicted_count: HashMap<&T, usize> = HashMap::new();
    let mut true_positive: HashMap<&T, usize> = HashMap::new();

    for (t, p) in truth.iter().zip(predicted) {
        *support.entry(t).or_default() += 1;
        *predicted_count.entry(p).or_default() += 1;
        if t == p {
            *true_positive.entry(t).or_default() += 1;
        }
    }

    let labels: HashSet<&T> = support.keys().chain(predicted_count.keys()).copied().collect();
    let total: usize = support.values().sum();
    if total == 0 {
        return 0.0;
    }

    let weighted: f64 = labels
        .into_iter()
        .map(|label| {
            let tp = *true_positive.get(label).unwrap_or(&0) as f64;
            let n_true = *support.get(label).unwrap_or(&0) as f64;
            let n_pred = *predicted_count.get(label).unwrap_or(&0) as f64;

            let precision = if n_pred > 0.0 { tp / n_pred } else { 0.0 };
            let recall = if n_true > 0.0 { tp / n_true } else { 0.0 };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            f1 * n_true
        })
        .sum();

    weighted / total as f64
}

/// `(0.5 * weighted F1 + 0.5 * accuracy) * 100`.
pub fn team_score<T: Eq + Hash>(truth: &[T], predicted: &[T]) -> AnnotationResult<f64> {
    if truth.len() != predicted.len() {
        return Err(AnnotationError::InvalidData(format!(
            "label count mismatch: {} true vs {} predicted",
            truth.len(),
            predicted.len()
        )));
    }
    Ok((0.5 * weighted_f1(truth, predicted) + 0.5 * accuracy(truth, predicted)) * 100.0)
}
