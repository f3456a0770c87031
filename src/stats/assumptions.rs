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

//! # ANOVA Assumption Checks
//!
//! Shapiro-Wilk normality test (Royston's AS R94 approximation) and the
//! Levene / Brown-Forsythe homogeneity-of-variance test. Both are advisory
//! companions to the ANOVA runs; the analyses log their outcomes rather
//! than abort on violation, since loss-ratio data fails normality almost
//! by construction.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::errors::{Result, VeldError};
use crate::stats::anova::one_way_anova;
use crate::stats::descriptive::{mean, median};

/// Outcome of a Shapiro-Wilk normality test.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldShapiroWilk {
    /// The W statistic, in (0, 1]; values near 1 look normal.
    pub statistic: f64,
    pub p_value: f64,
}

/// Outcome of a Levene / Brown-Forsythe test.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldLevene {
    pub statistic: f64,
    pub p_value: f64,
}

/// Centering choice for the Levene test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeldLeveneCenter {
    /// Classic Levene: deviations from the group mean.
    Mean,
    /// Brown-Forsythe: deviations from the group median; robust to
    /// heavy tails, the usual default.
    #[default]
    Median,
}

/// Shapiro-Wilk normality test, Royston's AS R94 approximation.
///
/// Valid for 3 <= n; the p-value approximation degrades above n = 5000,
/// which is logged as a warning (matching the reference implementations)
/// rather than rejected.
pub fn shapiro_wilk(values: &[f64]) -> Result<VeldShapiroWilk> {
    const TEST: &str = "Shapiro-Wilk";
    let n = values.len();
    if n < 3 {
        return Err(VeldError::stats(TEST, "needs at least three observations"));
    }
    if n > 5000 {
        log::warn!("Shapiro-Wilk p-value is approximate above n = 5000 (n = {})", n);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let range = sorted[n - 1] - sorted[0];
    if range <= 0.0 {
        return Err(VeldError::stats(TEST, "sample is constant"));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| VeldError::stats(TEST, format!("bad normal distribution: {}", e)))?;

    // Expected normal order statistics (Blom scores).
    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect();
    let m_sum_sq: f64 = m.iter().map(|v| v * v).sum();

    // Royston's polynomial corrections to the two outer coefficients.
    let rsn = 1.0 / (n as f64).sqrt();
    let poly = |c: &[f64]| c.iter().rev().fold(0.0, |acc, coef| acc * rsn + coef);
    let mut a = vec![0.0f64; n];
    let (first_inner, phi) = if n > 5 {
        let a_n = poly(&[0.0, 0.221_157, -0.147_981, -2.071_190, 4.434_685, -2.706_056])
            + m[n - 1] / m_sum_sq.sqrt();
        let a_n1 = poly(&[0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633])
            + m[n - 2] / m_sum_sq.sqrt();
        a[n - 1] = a_n;
        a[n - 2] = a_n1;
        a[0] = -a_n;
        a[1] = -a_n1;
        let phi = (m_sum_sq - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * a_n.powi(2) - 2.0 * a_n1.powi(2));
        (2usize, phi)
    } else {
        let a_n = poly(&[0.0, 0.221_157, -0.147_981, -2.071_190, 4.434_685, -2.706_056])
            + m[n - 1] / m_sum_sq.sqrt();
        a[n - 1] = a_n;
        a[0] = -a_n;
        let phi = (m_sum_sq - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * a_n.powi(2));
        (1usize, phi)
    };
    for i in first_inner..(n - first_inner) {
        a[i] = m[i] / phi.sqrt();
    }

    let sample_mean = mean(&sorted).unwrap_or(0.0);
    let numerator: f64 = a.iter().zip(&sorted).map(|(ai, xi)| ai * xi).sum();
    let denominator: f64 = sorted.iter().map(|v| (v - sample_mean).powi(2)).sum();
    let w = (numerator * numerator / denominator).min(1.0);

    let p_value = shapiro_p_value(w, n, &normal);
    Ok(VeldShapiroWilk {
        statistic: w,
        p_value,
    })
}

/// Royston's normalizing transformation of W into an upper-tail normal
/// p-value.
fn shapiro_p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    let nf = n as f64;
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI
            * (w.sqrt().asin() - (0.75f64).sqrt().asin());
        return p.clamp(0.0, 1.0);
    }
    let (z, mu, sigma) = if n <= 11 {
        let gamma = -2.273 + 0.459 * nf;
        let wt = -(gamma - (1.0 - w).ln()).ln();
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf * nf - 0.000_671_4 * nf * nf * nf;
        let sigma =
            (1.3822 - 0.77857 * nf + 0.062767 * nf * nf - 0.002_032_2 * nf * nf * nf).exp();
        (wt, mu, sigma)
    } else {
        let u = nf.ln();
        let wt = (1.0 - w).ln();
        let mu = -1.5861 - 0.31082 * u - 0.083751 * u * u + 0.003_891_5 * u * u * u;
        let sigma = (-0.4803 - 0.082676 * u + 0.003_030_2 * u * u).exp();
        (wt, mu, sigma)
    };
    (1.0 - normal.cdf((z - mu) / sigma)).clamp(0.0, 1.0)
}

/// Levene / Brown-Forsythe test for equal variances across groups.
///
/// Computes absolute deviations from each group's center and runs a
/// one-way ANOVA over them; the F statistic of that ANOVA is Levene's W.
pub fn levene(groups: &[&[f64]], center: VeldLeveneCenter) -> Result<VeldLevene> {
    const TEST: &str = "Levene";
    if groups.len() < 2 {
        return Err(VeldError::stats(TEST, "needs at least two groups"));
    }

    let mut deviations: Vec<Vec<f64>> = Vec::with_capacity(groups.len());
    for group in groups {
        if group.len() < 2 {
            return Err(VeldError::stats(
                TEST,
                "each group needs at least two observations",
            ));
        }
        let c = match center {
            VeldLeveneCenter::Mean => mean(group),
            VeldLeveneCenter::Median => median(group),
        }
        .ok_or_else(|| VeldError::stats(TEST, "empty group"))?;
        deviations.push(group.iter().map(|v| (v - c).abs()).collect());
    }

    let views: Vec<&[f64]> = deviations.iter().map(Vec::as_slice).collect();
    let anova = one_way_anova(&views)
        .map_err(|e| VeldError::stats(TEST, e.to_string()))?;
    Ok(VeldLevene {
        statistic: anova.f_statistic,
        p_value: anova.p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Symmetric, bell-shaped sample; W should sit near 1.
    #[test]
    fn shapiro_accepts_normal_looking_data() {
        let values = [
            -1.9, -1.4, -1.1, -0.9, -0.7, -0.5, -0.35, -0.2, -0.1, 0.0, 0.05, 0.15, 0.25, 0.4,
            0.55, 0.75, 0.95, 1.2, 1.5, 2.0,
        ];
        let result = shapiro_wilk(&values).unwrap();
        assert!(result.statistic > 0.95);
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn shapiro_rejects_heavily_skewed_data() {
        let values: Vec<f64> = (0..20).map(|i| 1.5f64.powi(i)).collect();
        let result = shapiro_wilk(&values).unwrap();
        assert!(result.statistic < 0.8);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn shapiro_rejects_degenerate_samples() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
        assert!(shapiro_wilk(&[3.0, 3.0, 3.0, 3.0]).is_err());
    }

    #[test]
    fn levene_accepts_equal_spread() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let result = levene(&[&a, &b], VeldLeveneCenter::Median).unwrap();
        assert!(result.p_value > 0.9);
    }

    #[test]
    fn levene_flags_unequal_spread() {
        let a = [1.0, 1.1, 0.9, 1.05, 0.95, 1.0, 1.02, 0.98];
        let b = [1.0, 9.0, -7.0, 12.0, -10.0, 6.0, -4.0, 15.0];
        let result = levene(&[&a, &b], VeldLeveneCenter::Median).unwrap();
        assert!(result.p_value < 0.01);
    }
}
