//! Column-wise standardization to zero mean and unit variance.

use crate::error::PipelineError;
use ndarray::{Array1, Array2};

// Columns with spread below this stay centered but unscaled.
const MIN_STD: f64 = 1e-10;

#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Learn per-column mean and (population) standard deviation.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<(), PipelineError> {
        let (rows, cols) = x.dim();
        if rows == 0 {
            return Err(PipelineError::Model(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }
        let mut mean = Array1::<f64>::zeros(cols);
        let mut std = Array1::<f64>::zeros(cols);
        for j in 0..cols {
            mean[j] = x.column(j).sum() / rows as f64;
        }
        for j in 0..cols {
            let m = mean[j];
            let var = x.column(j).iter().map(|v| (v - m).powi(2)).sum::<f64>() / rows as f64;
            std[j] = var.sqrt();
        }
        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        let (mean, std) = match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => (mean, std),
            _ => {
                return Err(PipelineError::Model(
                    "scaler not fitted; call fit() first".to_string(),
                ))
            }
        };
        if x.ncols() != mean.len() {
            return Err(PipelineError::Model(format!(
                "feature dimension mismatch: {} columns, scaler fitted on {}",
                x.ncols(),
                mean.len()
            )));
        }
        let mut out = x.clone();
        for ((_, j), value) in out.indexed_iter_mut() {
            *value -= mean[j];
            if std[j] > MIN_STD {
                *value /= std[j];
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.fit(x)?;
        self.transform(x)
    }
}
