//! Random forest regressor: bootstrap-aggregated CART trees.
//!
//! Trees are grown in parallel with rayon. Tree `i` draws its bootstrap
//! sample and feature shuffles from `SeedHierarchy::rng_for("tree", i)`, so
//! the fitted forest depends only on the seed, never on thread scheduling.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::tree::{DecisionTreeRegressor, TreeConfig};
use crate::model::{check_row_width, check_training_shape, ModelError, Regressor};
use crate::rng::SeedHierarchy;

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum depth of each tree (None = unbounded)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Master seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be >= 1".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(
                "min_samples_split must be >= 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be >= 1".into(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidParameter(
                "max_features must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<DecisionTreeRegressor>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        self.config.validate()?;
        let n_features = check_training_shape(x, y)?;
        let n = x.len();
        let seeds = SeedHierarchy::new(self.config.seed);

        let trees: Result<Vec<DecisionTreeRegressor>, ModelError> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = seeds.rng_for("tree", i as u64);
                let indices: Vec<usize> = if self.config.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };

                let mut tree = DecisionTreeRegressor::new(TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: self.config.max_features,
                    seed: seeds.sub_seed("tree", i as u64),
                });
                tree.fit_indices(x, y, &indices, &mut rng)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.n_features = n_features;
        debug!(
            trees = self.trees.len(),
            rows = n,
            features = n_features,
            "random forest fitted"
        );
        Ok(())
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_row_width(row, self.n_features)?;
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_one(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_line(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| 2.0 * i as f64 + ((i * 37) % 11) as f64 * 0.1)
            .collect();
        (x, y)
    }

    fn small_forest(seed: u64) -> RandomForestRegressor {
        RandomForestRegressor::new(ForestConfig {
            n_estimators: 20,
            seed,
            ..ForestConfig::default()
        })
    }

    #[test]
    fn same_seed_same_predictions() {
        let (x, y) = noisy_line(60);
        let mut a = small_forest(7);
        let mut b = small_forest(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.n_trees(), 20);
    }

    #[test]
    fn different_seed_changes_bootstrap() {
        let (x, y) = noisy_line(60);
        let mut a = small_forest(7);
        let mut b = small_forest(8);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_ne!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn fits_training_range_closely() {
        let (x, y) = noisy_line(80);
        let mut forest = small_forest(42);
        forest.fit(&x, &y).unwrap();
        let pred = forest.predict_one(&x[40]).unwrap();
        assert!((pred - y[40]).abs() < 5.0, "pred={pred}, actual={}", y[40]);
    }

    #[test]
    fn cannot_extrapolate_past_training_max() {
        let (x, y) = noisy_line(50);
        let mut forest = small_forest(42);
        forest.fit(&x, &y).unwrap();
        let far = forest.predict_one(&[1000.0, 3.0]).unwrap();
        let max_y = y.iter().cloned().fold(f64::MIN, f64::max);
        assert!(far <= max_y);
    }

    #[test]
    fn zero_trees_rejected() {
        let (x, y) = noisy_line(10);
        let mut forest = RandomForestRegressor::new(ForestConfig {
            n_estimators: 0,
            ..ForestConfig::default()
        });
        assert!(matches!(
            forest.fit(&x, &y),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(forest.predict_one(&[1.0, 1.0]), Err(ModelError::NotFitted)));
    }
}
