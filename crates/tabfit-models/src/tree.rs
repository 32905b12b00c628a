//! CART regression tree grown by exhaustive variance-reduction splits.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::matrix::FeatureMatrix;

/// Nodes with fewer samples than this become leaves.
const MIN_SAMPLES_SPLIT: usize = 2;

/// Gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Node {
    Leaf { value: f64 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Grows a tree over the rows named by `samples` (duplicates allowed).
    pub(crate) fn grow<R: Rng>(
        features: &FeatureMatrix,
        labels: &[f64],
        samples: Vec<usize>,
        rng: &mut R,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, samples)];

        while let Some((slot, samples)) = pending.pop() {
            let split = if samples.len() >= MIN_SAMPLES_SPLIT {
                best_split(features, labels, &samples, rng)
            } else {
                None
            };

            let Some(split) = split else {
                nodes[slot] = Node::Leaf { value: mean(labels, &samples) };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&row| features.get(row, split.feature) <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[slot] =
                Node::Split { feature: split.feature, threshold: split.threshold, left, right };

            pending.push((right, right_samples));
            pending.push((left, left_samples));
        }

        Self { nodes }
    }

    pub(crate) fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn mean(labels: &[f64], samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&i| labels[i]).sum::<f64>() / samples.len() as f64
}

fn sum_squared_error(sum: f64, sum_sq: f64, n: f64) -> f64 {
    sum_sq - sum * sum / n
}

/// Scans every feature (in shuffled order, ties go to the first seen) for the
/// threshold that most reduces the summed squared error.
fn best_split<R: Rng>(
    features: &FeatureMatrix,
    labels: &[f64],
    samples: &[usize],
    rng: &mut R,
) -> Option<Split> {
    let n = samples.len() as f64;
    let total: f64 = samples.iter().map(|&i| labels[i]).sum();
    let total_sq: f64 = samples.iter().map(|&i| labels[i] * labels[i]).sum();
    let parent_sse = sum_squared_error(total, total_sq, n);
    if parent_sse <= MIN_GAIN {
        return None;
    }

    let mut order: Vec<usize> = (0..features.n_cols()).collect();
    order.shuffle(rng);

    let mut best: Option<Split> = None;
    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(samples.len());

    for feature in order {
        pairs.clear();
        pairs.extend(samples.iter().map(|&i| (features.get(i, feature), labels[i])));
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 1..pairs.len() {
            let (prev_x, prev_y) = pairs[i - 1];
            left_sum += prev_y;
            left_sq += prev_y * prev_y;

            let x = pairs[i].0;
            if prev_x >= x {
                continue;
            }

            let left_n = i as f64;
            let right_n = n - left_n;
            let left_sse = sum_squared_error(left_sum, left_sq, left_n);
            let right_sse = sum_squared_error(total - left_sum, total_sq - left_sq, right_n);
            let gain = parent_sse - (left_sse + right_sse);

            if gain > MIN_GAIN && best.is_none_or(|b| gain > b.gain) {
                let mid = prev_x + (x - prev_x) / 2.0;
                let threshold = if mid >= x { prev_x } else { mid };
                best = Some(Split { feature, threshold, gain });
            }
        }
    }

    best
}
