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

//! # Tukey HSD Post-Hoc Test
//!
//! All-pairs comparison of group means after a significant one-way ANOVA.
//! Adjusted p-values come from the studentized range distribution, computed
//! by direct numerical quadrature:
//!
//! ```text
//! P(Q <= q; k, v) = Int_0^inf f_v(u) * R_k(q * u) du
//! R_k(w)          = k * Int phi(z) * (Phi(z) - Phi(z - w))^(k-1) dz
//! ```
//!
//! where `f_v` is the density of `chi_v / sqrt(v)`. For very large `v` the
//! scale integral collapses to `R_k(q)`. Unequal group sizes use the
//! Tukey-Kramer standard error.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;
use statrs::function::gamma::ln_gamma;

use crate::errors::{Result, VeldError};

const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
/// Above this many error degrees of freedom the chi scale is treated as 1.
const LARGE_DF: f64 = 5000.0;

/// One pairwise comparison in a Tukey HSD table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldTukeyPair {
    pub level_a: String,
    pub level_b: String,
    /// Mean of `level_b` minus mean of `level_a`.
    pub mean_diff: f64,
    /// Studentized-range adjusted p-value.
    pub p_adjusted: f64,
    /// Simultaneous confidence interval, lower bound.
    pub lower: f64,
    /// Simultaneous confidence interval, upper bound.
    pub upper: f64,
    pub reject: bool,
}

/// Full Tukey HSD result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldTukeyHsd {
    pub alpha: f64,
    pub q_critical: f64,
    pub pairs: Vec<VeldTukeyPair>,
}

/// Runs Tukey's HSD over the given groups at significance level `alpha`.
///
/// Needs at least two groups, each with at least two observations, and a
/// positive within-group mean square.
pub fn tukey_hsd(groups: &[(String, Vec<f64>)], alpha: f64) -> Result<VeldTukeyHsd> {
    const TEST: &str = "Tukey HSD";
    if groups.len() < 2 {
        return Err(VeldError::stats(TEST, "needs at least two groups"));
    }
    if groups.iter().any(|(_, g)| g.len() < 2) {
        return Err(VeldError::stats(
            TEST,
            "each group needs at least two observations",
        ));
    }
    if !(0.0..1.0).contains(&alpha) || alpha == 0.0 {
        return Err(VeldError::stats(TEST, "alpha must be in (0, 1)"));
    }

    let k = groups.len();
    let n: usize = groups.iter().map(|(_, g)| g.len()).sum();
    let df = n - k;

    let means: Vec<f64> = groups
        .iter()
        .map(|(_, g)| g.iter().sum::<f64>() / g.len() as f64)
        .collect();
    let ss_within: f64 = groups
        .iter()
        .zip(&means)
        .map(|((_, g), m)| g.iter().map(|v| (v - m).powi(2)).sum::<f64>())
        .sum();
    let mse = ss_within / df as f64;
    if mse <= 0.0 {
        return Err(VeldError::stats(TEST, "zero within-group variance"));
    }

    let q_critical = studentized_range_ppf(1.0 - alpha, k, df as f64);

    let mut pairs = Vec::with_capacity(k * (k - 1) / 2);
    for i in 0..k {
        for j in (i + 1)..k {
            let (na, nb) = (groups[i].1.len() as f64, groups[j].1.len() as f64);
            // Tukey-Kramer standard error for unequal group sizes.
            let se = (mse * (1.0 / na + 1.0 / nb) / 2.0).sqrt();
            let diff = means[j] - means[i];
            let q = diff.abs() / se;
            let p_adjusted = 1.0 - studentized_range_cdf(q, k, df as f64);
            let half_width = q_critical * se;
            pairs.push(VeldTukeyPair {
                level_a: groups[i].0.clone(),
                level_b: groups[j].0.clone(),
                mean_diff: diff,
                p_adjusted,
                lower: diff - half_width,
                upper: diff + half_width,
                reject: p_adjusted < alpha,
            });
        }
    }

    Ok(VeldTukeyHsd {
        alpha,
        q_critical,
        pairs,
    })
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

fn normal_pdf(z: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * z * z).exp()
}

/// CDF of the range of `k` iid standard normals at `w`.
fn normal_range_cdf(w: f64, k: usize) -> f64 {
    if w <= 0.0 {
        return 0.0;
    }
    // Simpson's rule; phi(z) is negligible outside [-8, 8].
    let (lo, hi) = (-8.0f64, 8.0f64);
    let steps = 1600usize; // even
    let h = (hi - lo) / steps as f64;
    let integrand = |z: f64| normal_pdf(z) * (normal_cdf(z) - normal_cdf(z - w)).powi(k as i32 - 1);
    let mut sum = integrand(lo) + integrand(hi);
    for step in 1..steps {
        let weight = if step % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * integrand(lo + step as f64 * h);
    }
    (k as f64 * sum * h / 3.0).clamp(0.0, 1.0)
}

/// CDF of the studentized range distribution with `k` groups and `df`
/// error degrees of freedom.
pub fn studentized_range_cdf(q: f64, k: usize, df: f64) -> f64 {
    if q <= 0.0 {
        return 0.0;
    }
    if df > LARGE_DF {
        return normal_range_cdf(q, k);
    }

    // Density of u = chi_df / sqrt(df), in log space to dodge overflow of
    // the normalizing constant at moderate df.
    let ln_const = 0.5 * df * df.ln() - ln_gamma(0.5 * df) - (0.5 * df - 1.0) * 2f64.ln();
    let ln_density = |u: f64| ln_const + (df - 1.0) * u.ln() - 0.5 * df * u * u;

    // u concentrates around 1 with spread ~ 1/sqrt(2 df).
    let spread = 12.0 / (2.0 * df).sqrt();
    let lo = (1.0 - spread).max(1e-8);
    let hi = 1.0 + spread;
    let steps = 400usize; // even
    let h = (hi - lo) / steps as f64;
    let integrand = |u: f64| ln_density(u).exp() * normal_range_cdf(q * u, k);
    let mut sum = integrand(lo) + integrand(hi);
    for step in 1..steps {
        let weight = if step % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * integrand(lo + step as f64 * h);
    }
    (sum * h / 3.0).clamp(0.0, 1.0)
}

/// Quantile of the studentized range distribution, by bisection.
pub fn studentized_range_ppf(p: f64, k: usize, df: f64) -> f64 {
    let (mut lo, mut hi) = (0.0f64, 100.0f64);
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if studentized_range_cdf(mid, k, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_values_match_published_tables() {
        // q(0.05; k=3, df=12) = 3.77, q(0.05; k=5, df=20) = 4.23.
        assert!((studentized_range_ppf(0.95, 3, 12.0) - 3.77).abs() < 0.03);
        assert!((studentized_range_ppf(0.95, 5, 20.0) - 4.23).abs() < 0.03);
    }

    #[test]
    fn large_df_limit_matches_normal_range() {
        // q(0.05; k=2, df=inf) = sqrt(2) * z_{0.975} = 2.772.
        let q = studentized_range_ppf(0.95, 2, 100_000.0);
        assert!((q - 2.772).abs() < 0.01);
    }

    #[test]
    fn cdf_is_monotone_and_bounded() {
        let mut last = 0.0;
        for step in 1..=12 {
            let q = f64::from(step) * 0.5;
            let p = studentized_range_cdf(q, 4, 10.0);
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= last);
            last = p;
        }
        assert!(last > 0.9);
    }

    #[test]
    fn separated_groups_are_rejected_together() {
        let groups = vec![
            ("low".to_string(), vec![1.0, 1.2, 0.8, 1.1, 0.9]),
            ("mid".to_string(), vec![1.1, 1.3, 0.9, 1.2, 1.0]),
            ("high".to_string(), vec![9.0, 9.2, 8.8, 9.1, 8.9]),
        ];
        let result = tukey_hsd(&groups, 0.05).unwrap();
        assert_eq!(result.pairs.len(), 3);

        let low_mid = &result.pairs[0];
        assert_eq!(low_mid.level_a, "low");
        assert_eq!(low_mid.level_b, "mid");
        assert!(!low_mid.reject);
        assert!(low_mid.p_adjusted > 0.05);
        assert!(low_mid.lower < 0.0 && low_mid.upper > 0.0);

        let low_high = &result.pairs[1];
        assert!(low_high.reject);
        assert!(low_high.p_adjusted < 0.01);
        assert!(low_high.mean_diff > 7.0);
        assert!(low_high.lower > 0.0);
    }

    #[test]
    fn degenerate_groups_are_rejected() {
        let single = vec![("a".to_string(), vec![1.0, 2.0])];
        assert!(tukey_hsd(&single, 0.05).is_err());
        let flat = vec![
            ("a".to_string(), vec![1.0, 1.0]),
            ("b".to_string(), vec![1.0, 1.0]),
        ];
        assert!(tukey_hsd(&flat, 0.05).is_err());
    }
}
