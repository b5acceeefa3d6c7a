//! Partial-reinforcement schedules: which bucket pays out on a given trial.
//!
//! The rewarded bucket is drawn from a distribution that favours the relic's intended
//! bucket, independently of where the participant actually drops it.

use rand::Rng;

use crate::error::{ExpResult, invalid};

/// `preferred_weight` at `preferred_index`, the rest spread evenly over the others.
/// A single bucket is always certain.
pub fn build_distribution(
    preferred_index: usize,
    preferred_weight: f64,
    count: usize,
) -> ExpResult<Vec<f64>> {
    if count < 1 {
        return invalid("distribution needs at least one outcome");
    }
    if preferred_index >= count {
        return invalid(format!(
            "preferred index {preferred_index} out of range for {count} outcomes"
        ));
    }
    if !(preferred_weight > 0.0 && preferred_weight <= 1.0) {
        return invalid(format!("preferred weight {preferred_weight} outside (0, 1]"));
    }
    if count == 1 {
        return Ok(vec![1.0]);
    }

    let rest = (1.0 - preferred_weight) / (count - 1) as f64;
    let mut weights = vec![rest; count];
    weights[preferred_index] = preferred_weight;
    Ok(weights)
}

/// Draws one index with probability proportional to its weight.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> ExpResult<usize> {
    if weights.is_empty() {
        return invalid("cannot sample from an empty distribution");
    }
    if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
        return invalid(format!("weight {bad} is not a finite non-negative number"));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return invalid("all weights are zero");
    }

    let draw: f64 = rng.random();
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w / total;
        if cumulative > draw {
            return Ok(i);
        }
    }

    // Rounding left the last cumulative value just under the draw.
    Ok(weights
        .iter()
        .rposition(|w| *w > 0.0)
        .unwrap_or(weights.len() - 1))
}

/// First index holding the largest weight; `None` for an empty slice.
pub fn find_max_index(weights: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &w) in weights.iter().enumerate() {
        match best {
            Some((_, b)) if w <= b => {}
            _ => best = Some((i, w)),
        }
    }
    best.map(|(i, _)| i)
}
