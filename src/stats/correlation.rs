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

//! # Pearson Correlation
//!
//! Pearson's r over paired samples with a two-sided p-value from the
//! t-transform on n - 2 degrees of freedom.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::errors::{Result, VeldError};
use crate::stats::descriptive::mean;

/// Result of a Pearson correlation test.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldPearson {
    /// Correlation coefficient in [-1, 1].
    pub correlation: f64,
    /// Two-sided p-value against r = 0.
    pub p_value: f64,
    pub n: usize,
}

/// Pearson correlation between two paired samples.
///
/// Needs at least three pairs and non-zero variance on both sides. A
/// perfectly collinear pair yields r = ±1 with p = 0.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<VeldPearson> {
    const TEST: &str = "Pearson correlation";
    if x.len() != y.len() {
        return Err(VeldError::stats(
            TEST,
            format!("unpaired samples ({} vs {})", x.len(), y.len()),
        ));
    }
    let n = x.len();
    if n < 3 {
        return Err(VeldError::stats(TEST, "needs at least three pairs"));
    }

    let mx = mean(x).unwrap_or(0.0);
    let my = mean(y).unwrap_or(0.0);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxy += (xi - mx) * (yi - my);
        sxx += (xi - mx).powi(2);
        syy += (yi - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(VeldError::stats(TEST, "a sample has zero variance"));
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let p_value = if r.abs() == 1.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| VeldError::stats(TEST, format!("bad t distribution: {}", e)))?;
        2.0 * (1.0 - dist.cdf(t.abs()))
    };

    Ok(VeldPearson {
        correlation: r,
        p_value,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line_is_exact() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let result = pearson(&x, &y).unwrap();
        assert!((result.correlation - 1.0).abs() < 1e-12);
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn anti_correlation_is_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 8.2, 5.9, 4.1, 2.0];
        let result = pearson(&x, &y).unwrap();
        assert!(result.correlation < -0.99);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn noise_is_not_significant() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [3.0, -1.0, 4.0, -2.0, 3.5, -0.5];
        let result = pearson(&x, &y).unwrap();
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0]).is_err());
        assert!(pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }
}
