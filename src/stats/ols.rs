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

//! # Ordinary Least Squares
//!
//! A small dense OLS fit over the normal equations, rank-aware so that
//! collinear dummy encodings (empty factor cells) degrade gracefully
//! instead of blowing up. Shared by the two-way ANOVA decomposition and
//! the linear-regression baseline; the design matrices here are a handful
//! of columns wide, so Gaussian elimination is plenty.

use crate::errors::{Result, VeldError};

/// Result of a least-squares fit.
#[derive(Clone, Debug)]
pub struct VeldOlsFit {
    /// Coefficients; entries on dropped (collinear) pivots are zero.
    pub beta: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Effective rank of the design matrix.
    pub rank: usize,
}

/// Fits `y ~ X` by least squares on the normal equations.
///
/// Every row of `x` must have the same width. Collinear columns are
/// detected by a pivot tolerance and excluded from the rank.
pub fn fit_least_squares(x: &[Vec<f64>], y: &[f64]) -> Result<VeldOlsFit> {
    let n = x.len();
    if n == 0 || n != y.len() {
        return Err(VeldError::validation(format!(
            "design has {} rows, response has {}",
            n,
            y.len()
        )));
    }
    let p = x[0].len();
    if p == 0 || x.iter().any(|row| row.len() != p) {
        return Err(VeldError::validation("design rows have uneven width"));
    }

    // Normal equations: (X'X) beta = X'y.
    let mut xtx = vec![vec![0.0f64; p]; p];
    let mut xty = vec![0.0f64; p];
    for (row, &yi) in x.iter().zip(y) {
        for i in 0..p {
            xty[i] += row[i] * yi;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let beta = solve_rank_aware(&mut xtx, &mut xty);
    let rank = beta.1;
    let beta = beta.0;

    let mut rss = 0.0;
    for (row, &yi) in x.iter().zip(y) {
        let fitted: f64 = row.iter().zip(&beta).map(|(a, b)| a * b).sum();
        rss += (yi - fitted).powi(2);
    }

    Ok(VeldOlsFit { beta, rss, rank })
}

/// Gaussian elimination with partial pivoting; pivots below tolerance are
/// skipped and their coefficients pinned to zero. Returns (beta, rank).
fn solve_rank_aware(a: &mut [Vec<f64>], b: &mut [f64]) -> (Vec<f64>, usize) {
    let p = b.len();
    let scale = a
        .iter()
        .enumerate()
        .map(|(i, row)| row[i].abs())
        .fold(0.0f64, f64::max)
        .max(1.0);
    let tol = scale * 1e-10;

    let mut pivot_of_col: Vec<Option<usize>> = vec![None; p];
    let mut used_row = vec![false; p];
    let mut rank = 0usize;

    for col in 0..p {
        let pivot_row = (0..p)
            .filter(|r| !used_row[*r])
            .max_by(|r1, r2| {
                a[*r1][col]
                    .abs()
                    .partial_cmp(&a[*r2][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(pivot_row) = pivot_row else { break };
        if a[pivot_row][col].abs() <= tol {
            continue;
        }
        used_row[pivot_row] = true;
        pivot_of_col[col] = Some(pivot_row);
        rank += 1;

        for row in 0..p {
            if row == pivot_row || a[row][col].abs() <= 0.0 {
                continue;
            }
            let factor = a[row][col] / a[pivot_row][col];
            for k in 0..p {
                a[row][k] -= factor * a[pivot_row][k];
            }
            b[row] -= factor * b[pivot_row];
        }
    }

    let mut beta = vec![0.0f64; p];
    for col in 0..p {
        if let Some(row) = pivot_of_col[col] {
            beta[col] = b[row] / a[row][col];
        }
    }
    (beta, rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_an_exact_line() {
        // y = 2 + 3x
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, f64::from(i)]).collect();
        let y: Vec<f64> = (0..5).map(|i| 2.0 + 3.0 * f64::from(i)).collect();
        let fit = fit_least_squares(&x, &y).unwrap();
        assert!((fit.beta[0] - 2.0).abs() < 1e-9);
        assert!((fit.beta[1] - 3.0).abs() < 1e-9);
        assert!(fit.rss < 1e-12);
        assert_eq!(fit.rank, 2);
    }

    #[test]
    fn collinear_column_reduces_rank_not_fit() {
        // Third column duplicates the second.
        let x: Vec<Vec<f64>> = (0..6)
            .map(|i| vec![1.0, f64::from(i), f64::from(i)])
            .collect();
        let y: Vec<f64> = (0..6).map(|i| 1.0 + 2.0 * f64::from(i)).collect();
        let fit = fit_least_squares(&x, &y).unwrap();
        assert_eq!(fit.rank, 2);
        assert!(fit.rss < 1e-9);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        assert!(fit_least_squares(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(fit_least_squares(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
    }
}
