//! Ridge regression (L2-regularised least squares).
//!
//! Features are standardised before fitting and the closed form
//! β = (ZᵀZ + αI)⁻¹ Zᵀ(y - ȳ) is solved by Cholesky factorisation.
//! Zero-variance columns are left out of the system and get weight 0.
//! Unlike the tree ensemble this model extrapolates, so a trending series
//! keeps trending out of sample.

use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{check_row_width, check_training_shape, ModelError, Regressor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeConfig {
    /// Regularisation strength on standardised features
    pub alpha: f64,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl RidgeConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "ridge alpha must be finite and >= 0, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RidgeRegressor {
    config: RidgeConfig,
    /// Coefficients in original feature units
    coefficients: Array1<f64>,
    intercept: f64,
    fitted: bool,
}

impl RidgeRegressor {
    pub fn new(config: RidgeConfig) -> Self {
        Self {
            config,
            coefficients: Array1::zeros(0),
            intercept: 0.0,
            fitted: false,
        }
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for RidgeRegressor {
    fn name(&self) -> &str {
        "ridge"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ModelError> {
        self.config.validate()?;
        let width = check_training_shape(x, y)?;

        let x = Array2::from_shape_fn((x.len(), width), |(i, j)| x[i][j]);
        let y = Array1::from(y.to_vec());

        let x_mean = x.mean_axis(Axis(0)).ok_or(ModelError::EmptyTrainingSet)?;
        let y_mean = y.mean().ok_or(ModelError::EmptyTrainingSet)?;
        let x_std = x.std_axis(Axis(0), 0.0);

        // Only columns that actually vary enter the system.
        let active: Vec<usize> = x_std
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > 1e-12)
            .map(|(j, _)| j)
            .collect();
        let active_mean = x_mean.select(Axis(0), &active);
        let active_std = x_std.select(Axis(0), &active);

        let z = (&x.select(Axis(1), &active) - &active_mean) / &active_std;
        let y_centered = &y - y_mean;

        // ZᵀZ + αI
        let mut gram = z.t().dot(&z);
        gram.diag_mut().mapv_inplace(|d| d + self.config.alpha);
        let rhs = z.t().dot(&y_centered);

        let beta = cholesky_solve(&gram, &rhs)?;
        let scaled = &beta / &active_std;

        let mut coefficients = Array1::<f64>::zeros(width);
        for (k, &j) in active.iter().enumerate() {
            coefficients[j] = scaled[k];
        }
        let intercept = y_mean - x_mean.dot(&coefficients);

        debug!(active = active.len(), width, alpha = self.config.alpha, "ridge fitted");
        self.coefficients = coefficients;
        self.intercept = intercept;
        self.fitted = true;
        Ok(())
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotFitted);
        }
        check_row_width(row, self.coefficients.len())?;
        Ok(self.intercept + ArrayView1::from(row).dot(&self.coefficients))
    }
}

/// Solve `a · x = b` for symmetric positive-definite `a` via a = L·Lᵀ.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum = l.row(i).slice(s![..j]).dot(&l.row(j).slice(s![..j]));
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 {
                    return Err(ModelError::Singular);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward: L·z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum = l.row(i).slice(s![..i]).dot(&z.slice(s![..i]));
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward: Lᵀ·x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum = l.column(i).slice(s![i + 1..]).dot(&x.slice(s![i + 1..]));
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line_with_tiny_alpha() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, 5.0]).collect();
        let y: Vec<f64> = (0..30).map(|i| 3.0 * i as f64 + 2.0).collect();
        let mut model = RidgeRegressor::new(RidgeConfig { alpha: 1e-9 });
        model.fit(&x, &y).unwrap();

        assert!((model.coefficients()[0] - 3.0).abs() < 1e-6);
        // Constant column carries no weight
        assert_eq!(model.coefficients()[1], 0.0);
        assert!((model.intercept() - 2.0).abs() < 1e-5);
        // Extrapolates beyond the training range
        let far = model.predict_one(&[100.0, 5.0]).unwrap();
        assert!((far - 302.0).abs() < 1e-4);
    }

    #[test]
    fn alpha_shrinks_slope() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut loose = RidgeRegressor::new(RidgeConfig { alpha: 1e-9 });
        let mut tight = RidgeRegressor::new(RidgeConfig { alpha: 100.0 });
        loose.fit(&x, &y).unwrap();
        tight.fit(&x, &y).unwrap();
        assert!(tight.coefficients()[0] < loose.coefficients()[0]);
        assert!(tight.coefficients()[0] > 0.0);
    }

    #[test]
    fn collinear_columns_need_alpha() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut singular = RidgeRegressor::new(RidgeConfig { alpha: 0.0 });
        assert!(matches!(singular.fit(&x, &y), Err(ModelError::Singular)));

        let mut ridge = RidgeRegressor::new(RidgeConfig::default());
        ridge.fit(&x, &y).unwrap();
        let a = ridge.predict_one(&[3.0, 6.0]).unwrap();
        let b = ridge.predict_one(&[4.0, 8.0]).unwrap();
        assert!(b > a);
    }

    #[test]
    fn constant_target_predicts_constant() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = vec![100.0; 10];
        let mut model = RidgeRegressor::new(RidgeConfig::default());
        model.fit(&x, &y).unwrap();
        assert!((model.predict_one(&[50.0]).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cholesky_solves_spd_system() {
        let a = ndarray::array![[4.0, 2.0], [2.0, 3.0]];
        let b = ndarray::array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        // 4x + 2y = 2, 2x + 3y = 1 -> x = 0.5, y = 0
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn unfitted_predict_errors() {
        let model = RidgeRegressor::new(RidgeConfig::default());
        assert!(matches!(model.predict_one(&[1.0]), Err(ModelError::NotFitted)));
    }

    #[test]
    fn negative_alpha_rejected() {
        let mut model = RidgeRegressor::new(RidgeConfig { alpha: -1.0 });
        assert!(matches!(
            model.fit(&[vec![1.0]], &[1.0]),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
