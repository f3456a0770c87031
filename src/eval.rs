//! Copyright © 2025-2026 The Veld Authors. All Rights Reserved.
//!
//! This file is part of Veld.
//! The Veld project belongs to the Meridian Analytics team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Model Evaluation
//!
//! The regression baseline over the cleaned frame: a one-hot design
//! builder, a seeded train/test split, an OLS linear model behind the
//! [`VeldEstimator`] trait, and RMSE / R² scoring. Evaluation lines land
//! in the docs results file in the fixed `NAME - RMSE: x, R²: y` form.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VeldError};
use crate::frame::{VeldColumn, VeldFrame};
use crate::report::VeldReportWriter;
use crate::stats::ols::{fit_least_squares, VeldOlsFit};

/// File evaluation lines are appended to.
pub const EVAL_RESULTS_FILE: &str = "task-4_results.txt";

/// A fitted/fittable regression model.
pub trait VeldEstimator {
    /// Model label used in the results line.
    fn name(&self) -> &str;

    /// Fits the model on a design matrix and response.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predicts responses for new design rows.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// OLS linear regression with an intercept.
#[derive(Debug, Default)]
pub struct VeldLinearRegression {
    fit: Option<VeldOlsFit>,
}

impl VeldLinearRegression {
    /// Creates an unfitted model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted coefficients, intercept first.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fit.as_ref().map(|f| f.beta.as_slice())
    }
}

impl VeldEstimator for VeldLinearRegression {
    fn name(&self) -> &str {
        "Linear Regression"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let design: Vec<Vec<f64>> = x.iter().map(with_intercept).collect();
        self.fit = Some(fit_least_squares(&design, y)?);
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| VeldError::validation("model is not fitted"))?;
        x.iter()
            .map(|row| {
                let row = with_intercept(row);
                if row.len() != fit.beta.len() {
                    return Err(VeldError::validation(format!(
                        "row has {} features, model expects {}",
                        row.len() - 1,
                        fit.beta.len() - 1
                    )));
                }
                Ok(row.iter().zip(&fit.beta).map(|(a, b)| a * b).sum())
            })
            .collect()
    }
}

fn with_intercept(row: &Vec<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(row.len() + 1);
    out.push(1.0);
    out.extend_from_slice(row);
    out
}

/// RMSE and R² of a prediction against the held-out truth.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VeldRegressionMetrics {
    pub rmse: f64,
    pub r2: f64,
}

impl VeldRegressionMetrics {
    /// Scores predictions against observations.
    pub fn score(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        if y_true.is_empty() || y_true.len() != y_pred.len() {
            return Err(VeldError::validation(format!(
                "cannot score {} truths against {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        let n = y_true.len() as f64;
        let sse: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let mean = y_true.iter().sum::<f64>() / n;
        let sst: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
        let r2 = if sst > 0.0 { 1.0 - sse / sst } else { f64::NAN };
        Ok(Self {
            rmse: (sse / n).sqrt(),
            r2,
        })
    }

    /// The one-line form appended to the evaluation results file.
    pub fn to_result_line(&self, name: &str) -> String {
        format!("{} - RMSE: {:.2}, R²: {:.2}", name, self.rmse, self.r2)
    }
}

/// One-hot design matrix built from a frame.
#[derive(Clone, Debug)]
pub struct VeldDesign {
    /// One row of predictors per frame row.
    pub x: Vec<Vec<f64>>,
    /// Response values.
    pub y: Vec<f64>,
    /// Predictor names, dummies as `Column=Level`.
    pub feature_names: Vec<String>,
}

/// Builds a design matrix predicting `target` from every other column.
///
/// Numeric columns enter as-is; text columns are one-hot encoded with the
/// first (alphabetical) level dropped as the reference. Rows missing the
/// target or any predictor are excluded.
pub fn build_design(frame: &VeldFrame, target: &str) -> Result<VeldDesign> {
    let y_col = frame.numeric(target)?;

    let mut feature_names: Vec<String> = Vec::new();
    // Each encoder yields the predictor values for one design column.
    let mut columns: Vec<Vec<Option<f64>>> = Vec::new();

    for name in frame.column_names() {
        if name == target {
            continue;
        }
        match frame.column(name)? {
            VeldColumn::Numeric(v) => {
                feature_names.push(name.clone());
                columns.push(v.clone());
            }
            VeldColumn::Text(v) => {
                let mut levels: Vec<&str> =
                    v.iter().flatten().map(String::as_str).collect();
                levels.sort_unstable();
                levels.dedup();
                // First level is the reference; a single-level column
                // encodes to nothing.
                for level in levels.iter().skip(1) {
                    feature_names.push(format!("{}={}", name, level));
                    columns.push(
                        v.iter()
                            .map(|cell| {
                                cell.as_deref()
                                    .map(|s| if s == *level { 1.0 } else { 0.0 })
                            })
                            .collect(),
                    );
                }
                // Null text cells must still drop the row.
                if levels.len() <= 1 {
                    feature_names.push(format!("{}=<constant>", name));
                    columns.push(v.iter().map(|cell| cell.as_ref().map(|_| 0.0)).collect());
                }
            }
        }
    }
    if columns.is_empty() {
        return Err(VeldError::validation("no predictor columns in frame"));
    }

    let mut x = Vec::new();
    let mut y = Vec::new();
    'rows: for row in 0..frame.n_rows() {
        let Some(target_value) = y_col[row] else {
            continue;
        };
        let mut design_row = Vec::with_capacity(columns.len());
        for column in &columns {
            match column[row] {
                Some(v) => design_row.push(v),
                None => continue 'rows,
            }
        }
        x.push(design_row);
        y.push(target_value);
    }
    if x.is_empty() {
        return Err(VeldError::validation("no complete rows to fit on"));
    }

    // Constant-column placeholders carried no information; strip them.
    let keep: Vec<usize> = feature_names
        .iter()
        .enumerate()
        .filter(|(_, n)| !n.ends_with("=<constant>"))
        .map(|(i, _)| i)
        .collect();
    if keep.len() != feature_names.len() {
        feature_names = keep.iter().map(|i| feature_names[*i].clone()).collect();
        x = x
            .iter()
            .map(|row| keep.iter().map(|i| row[*i]).collect())
            .collect();
        if feature_names.is_empty() {
            return Err(VeldError::validation("no predictor columns in frame"));
        }
    }

    Ok(VeldDesign {
        x,
        y,
        feature_names,
    })
}

/// Deterministic shuffled train/test index split.
///
/// `test_size` is the held-out fraction in (0, 1); the split is seeded so
/// reruns score the same rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_size) || test_size <= 0.0 {
        return Err(VeldError::validation(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n_test = ((n as f64) * test_size).round() as usize;
    if n_test == 0 || n_test >= n {
        return Err(VeldError::validation(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let test = indices.split_off(n - n_test);
    Ok((indices, test))
}

/// Fits `estimator` on the train split, scores the test split and appends
/// the result line to [`EVAL_RESULTS_FILE`].
pub fn evaluate_regression(
    estimator: &mut dyn VeldEstimator,
    design: &VeldDesign,
    test_size: f64,
    seed: u64,
    writer: &VeldReportWriter,
) -> Result<VeldRegressionMetrics> {
    let (train, test) = train_test_split(design.y.len(), test_size, seed)?;
    let take = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        (
            idx.iter().map(|i| design.x[*i].clone()).collect(),
            idx.iter().map(|i| design.y[*i]).collect(),
        )
    };
    let (x_train, y_train) = take(&train);
    let (x_test, y_test) = take(&test);

    estimator.fit(&x_train, &y_train)?;
    let y_pred = estimator.predict(&x_test)?;
    let metrics = VeldRegressionMetrics::score(&y_test, &y_pred)?;

    writer.append_line(EVAL_RESULTS_FILE, &metrics.to_result_line(estimator.name()))?;
    log::info!(
        "{}: rmse = {:.4}, r2 = {:.4} on {} held-out rows",
        estimator.name(),
        metrics.rmse,
        metrics.r2,
        y_test.len()
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_frame(n: usize) -> VeldFrame {
        let mut frame = VeldFrame::new();
        let x: Vec<Option<f64>> = (0..n).map(|i| Some(i as f64)).collect();
        let g: Vec<Option<String>> = (0..n)
            .map(|i| Some(if i % 2 == 0 { "a".into() } else { "b".into() }))
            .collect();
        // y = 3 + 2x + 5*[g = b]
        let y: Vec<Option<f64>> = (0..n)
            .map(|i| Some(3.0 + 2.0 * i as f64 + if i % 2 == 1 { 5.0 } else { 0.0 }))
            .collect();
        frame.insert_numeric("x", x).unwrap();
        frame.insert_text("g", g).unwrap();
        frame.insert_numeric("y", y).unwrap();
        frame
    }

    #[test]
    fn design_one_hot_encodes_and_drops_reference() {
        let design = build_design(&linear_frame(10), "y").unwrap();
        assert_eq!(design.feature_names, vec!["x".to_string(), "g=b".to_string()]);
        assert_eq!(design.x.len(), 10);
        assert_eq!(design.x[1], vec![1.0, 1.0]);
    }

    #[test]
    fn design_drops_rows_with_missing_cells() {
        let mut frame = linear_frame(6);
        frame
            .insert_numeric(
                "extra",
                vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
            )
            .unwrap();
        let design = build_design(&frame, "y").unwrap();
        assert_eq!(design.y.len(), 5);
    }

    #[test]
    fn split_is_deterministic_and_disjoint() {
        let (train_a, test_a) = train_test_split(100, 0.2, 42).unwrap();
        let (train_b, test_b) = train_test_split(100, 0.2, 42).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(train_a.len(), 80);
        assert_eq!(test_a.len(), 20);
        assert!(test_a.iter().all(|i| !train_a.contains(i)));
    }

    #[test]
    fn split_rejects_degenerate_fractions() {
        assert!(train_test_split(10, 0.0, 42).is_err());
        assert!(train_test_split(10, 1.0, 42).is_err());
        assert!(train_test_split(2, 0.9, 42).is_err());
    }

    #[test]
    fn linear_model_recovers_exact_relationship() {
        let design = build_design(&linear_frame(40), "y").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let mut model = VeldLinearRegression::new();
        let metrics = evaluate_regression(&mut model, &design, 0.2, 42, &writer).unwrap();
        assert!(metrics.rmse < 1e-6);
        assert!((metrics.r2 - 1.0).abs() < 1e-9);

        let content =
            std::fs::read_to_string(dir.path().join(EVAL_RESULTS_FILE)).unwrap();
        assert!(content.starts_with("Linear Regression - RMSE: 0.00, R²: 1.00"));
    }

    #[test]
    fn predict_before_fit_is_an_error() {
        let model = VeldLinearRegression::new();
        assert!(model.predict(&[vec![1.0]]).is_err());
    }
}
