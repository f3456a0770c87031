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

//! # Two-Sample t-Tests
//!
//! Welch (unequal variances, the default) and pooled Student two-sample
//! tests, plus a pairwise runner over all level pairs of a grouped column
//! with Bonferroni correction.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::errors::{Result, VeldError};
use crate::stats::descriptive::{mean, sample_variance};

/// Variance assumption for the two-sample test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeldTTestKind {
    /// Welch's test; no equal-variance assumption.
    #[default]
    Welch,
    /// Student's test with pooled variance.
    Pooled,
}

/// Result of a two-sample t-test.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldTTest {
    pub statistic: f64,
    pub p_value: f64,
    pub df: f64,
}

/// One row of a pairwise t-test table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldPairwiseTTest {
    pub level_a: String,
    pub level_b: String,
    pub statistic: f64,
    pub p_value: f64,
    /// Bonferroni-adjusted p-value, clamped to 1.
    pub adjusted_p_value: f64,
    pub significant: bool,
}

/// Two-sample t-test; two-sided p-value. Each side needs at least two
/// observations and the combined variance must not vanish.
pub fn t_test(a: &[f64], b: &[f64], kind: VeldTTestKind) -> Result<VeldTTest> {
    const TEST: &str = "t-test";
    if a.len() < 2 || b.len() < 2 {
        return Err(VeldError::stats(
            TEST,
            "each group needs at least two observations",
        ));
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a).unwrap_or(0.0), mean(b).unwrap_or(0.0));
    let (va, vb) = (
        sample_variance(a).unwrap_or(0.0),
        sample_variance(b).unwrap_or(0.0),
    );

    let (se_sq, df) = match kind {
        VeldTTestKind::Welch => {
            let se_sq = va / na + vb / nb;
            // Welch-Satterthwaite approximation for the degrees of freedom.
            let df = se_sq.powi(2)
                / ((va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0));
            (se_sq, df)
        }
        VeldTTestKind::Pooled => {
            let pooled = ((na - 1.0) * va + (nb - 1.0) * vb) / (na + nb - 2.0);
            (pooled * (1.0 / na + 1.0 / nb), na + nb - 2.0)
        }
    };
    if se_sq <= 0.0 || !df.is_finite() || df <= 0.0 {
        return Err(VeldError::stats(TEST, "zero variance in both groups"));
    }

    let statistic = (ma - mb) / se_sq.sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| VeldError::stats(TEST, format!("bad t distribution: {}", e)))?;
    let p_value = 2.0 * (1.0 - dist.cdf(statistic.abs()));

    Ok(VeldTTest {
        statistic,
        p_value,
        df,
    })
}

/// Welch t-tests over every pair of levels, Bonferroni-corrected.
///
/// `groups` holds (level, observations); levels below `min_count`
/// observations are excluded before pairing. The adjusted p-value is the
/// raw p times the number of pairs actually tested, clamped to 1. Pairs
/// whose test cannot run (degenerate variance) are skipped with a warning.
pub fn pairwise_t_tests(
    groups: &[(String, Vec<f64>)],
    min_count: usize,
    alpha: f64,
) -> Result<Vec<VeldPairwiseTTest>> {
    let eligible: Vec<&(String, Vec<f64>)> = groups
        .iter()
        .filter(|(_, values)| values.len() >= min_count.max(2))
        .collect();
    if eligible.len() < 2 {
        return Err(VeldError::stats(
            "pairwise t-tests",
            format!("fewer than two levels with >= {} observations", min_count),
        ));
    }

    let mut rows = Vec::new();
    for (i, (name_a, values_a)) in eligible.iter().enumerate() {
        for (name_b, values_b) in eligible.iter().skip(i + 1) {
            match t_test(values_a, values_b, VeldTTestKind::Welch) {
                Ok(result) => rows.push(VeldPairwiseTTest {
                    level_a: name_a.clone(),
                    level_b: name_b.clone(),
                    statistic: result.statistic,
                    p_value: result.p_value,
                    adjusted_p_value: 0.0,
                    significant: false,
                }),
                Err(e) => {
                    log::warn!("skipping pair '{}' vs '{}': {}", name_a, name_b, e);
                }
            }
        }
    }

    let m = rows.len() as f64;
    for row in &mut rows {
        row.adjusted_p_value = (row.p_value * m).min(1.0);
        row.significant = row.adjusted_p_value < alpha;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welch_separated_means_are_significant() {
        let a = [1.0, 1.2, 0.8, 1.1, 0.9, 1.0];
        let b = [5.0, 5.3, 4.7, 5.1, 4.9, 5.0];
        let result = t_test(&a, &b, VeldTTestKind::Welch).unwrap();
        assert!(result.statistic < 0.0);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn identical_samples_yield_high_p() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = t_test(&a, &a, VeldTTestKind::Welch).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!(result.p_value > 0.99);
    }

    #[test]
    fn pooled_df_is_exact() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 3.0, 4.0, 5.0];
        let result = t_test(&a, &b, VeldTTestKind::Pooled).unwrap();
        assert!((result.df - 5.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(t_test(&[1.0], &[1.0, 2.0], VeldTTestKind::Welch).is_err());
        assert!(t_test(&[2.0, 2.0], &[2.0, 2.0], VeldTTestKind::Welch).is_err());
    }

    #[test]
    fn pairwise_applies_bonferroni() {
        let groups = vec![
            ("a".to_string(), vec![1.0, 1.1, 0.9, 1.0, 1.05]),
            ("b".to_string(), vec![1.0, 1.2, 0.8, 1.1, 0.95]),
            ("c".to_string(), vec![9.0, 9.1, 8.9, 9.0, 9.05]),
            ("tiny".to_string(), vec![1.0]),
        ];
        let rows = pairwise_t_tests(&groups, 2, 0.05).unwrap();
        // "tiny" is excluded; three levels give three pairs.
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert!((row.adjusted_p_value - (row.p_value * 3.0).min(1.0)).abs() < 1e-12);
        }
        let ab = rows
            .iter()
            .find(|r| r.level_a == "a" && r.level_b == "b")
            .unwrap();
        assert!(!ab.significant);
        let ac = rows
            .iter()
            .find(|r| r.level_a == "a" && r.level_b == "c")
            .unwrap();
        assert!(ac.significant);
    }
}
