//! CART regression tree.
//!
//! Splits minimise the summed squared error of the two children. Candidate
//! thresholds are midpoints between consecutive distinct feature values,
//! found with one sorted sweep per feature and running sums, so a node costs
//! O(features · n log n).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::model::{check_row_width, check_training_shape, ModelError, Regressor};

/// Decision tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth (None = grow until leaves are pure or too small)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    /// Seed for the per-node feature shuffle
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    config: TreeConfig,
    root: Option<Node>,
    n_features: usize,
}

impl DecisionTreeRegressor {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
        }
    }

    /// Fit on the rows of `x` selected by `indices` (repeats allowed, as in a
    /// bootstrap sample), drawing feature shuffles from `rng`.
    pub(crate) fn fit_indices(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        rng: &mut StdRng,
    ) -> Result<(), ModelError> {
        self.n_features = check_training_shape(x, y)?;
        if indices.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let mut idx = indices.to_vec();
        self.root = Some(self.build(x, y, &mut idx, 0, rng));
        Ok(())
    }

    /// Depth of the fitted tree (a lone leaf has depth 1).
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map(walk).unwrap_or(0)
    }

    fn build(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &mut [usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let n = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;
        let sse: f64 = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || n < self.config.min_samples_split || sse <= 1e-12 {
            return Node::Leaf { value: mean };
        }

        let Some(best) = self.best_split(x, y, indices, sse, rng) else {
            return Node::Leaf { value: mean };
        };

        // Partition in place: left block holds rows with value <= threshold.
        let mut split_at = 0;
        for k in 0..n {
            if x[indices[k]][best.feature] <= best.threshold {
                indices.swap(k, split_at);
                split_at += 1;
            }
        }
        // Midpoints between adjacent floats can round onto one side.
        if split_at == 0 || split_at == n {
            return Node::Leaf { value: mean };
        }
        let (left_idx, right_idx) = indices.split_at_mut(split_at);
        let left = self.build(x, y, left_idx, depth + 1, rng);
        let right = self.build(x, y, right_idx, depth + 1, rng);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        parent_sse: f64,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);
        features.truncate(self.config.max_features.unwrap_or(self.n_features).max(1));

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

        let mut best: Option<SplitCandidate> = None;
        let mut order: Vec<usize> = indices.to_vec();

        for &feature in &features {
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..(n - 1) {
                let yi = y[order[k]];
                left_sum += yi;
                left_sq += yi * yi;

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let here = x[order[k]][feature];
                let next = x[order[k + 1]][feature];
                if next <= here {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        sse,
                    });
                }
            }
        }

        // Require a real reduction; running sums carry rounding noise.
        best.filter(|b| b.sse < parent_sse - 1e-12 * parent_sse.max(1.0))
    }

    fn traverse(node: &Node, row: &[f64]) -> f64 {
        match node {
            Node::Leaf { value } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    Self::traverse(left, row)
                } else {
                    Self::traverse(right, row)
                }
            }
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn name(&self) -> &str {
        "decision_tree"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.fit_indices(x, y, &indices, &mut rng)
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64, ModelError> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        check_row_width(row, self.n_features)?;
        Ok(Self::traverse(root, row))
    }
}
