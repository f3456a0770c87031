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

//! # Analysis of Variance
//!
//! One-way ANOVA over grouped samples and a two-way ANOVA with interaction
//! over a frame. The two-way table uses Type II sums of squares from nested
//! OLS fits (cell-means model for the full fit), with rank-aware degrees of
//! freedom so empty factor cells shrink the table instead of poisoning it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::errors::{Result, VeldError};
use crate::frame::VeldFrame;
use crate::stats::ols::fit_least_squares;

/// Result of a one-way ANOVA.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldAnova {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub ss_between: f64,
    pub ss_within: f64,
}

/// One term of a two-way ANOVA table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldAnovaTerm {
    pub ss: f64,
    pub df: usize,
    pub f_statistic: f64,
    pub p_value: f64,
}

/// Two-way ANOVA table with interaction (Type II sums of squares).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldTwoWayAnova {
    pub factor_a: VeldAnovaTerm,
    pub factor_b: VeldAnovaTerm,
    pub interaction: VeldAnovaTerm,
    pub residual_ss: f64,
    pub residual_df: usize,
}

/// One-way ANOVA over the given groups.
///
/// Requires at least two groups, none of them empty, and at least one
/// within-group degree of freedom. A zero within-group sum of squares
/// yields an infinite F and a zero p-value.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<VeldAnova> {
    const TEST: &str = "one-way ANOVA";
    if groups.len() < 2 {
        return Err(VeldError::stats(TEST, "needs at least two groups"));
    }
    if groups.iter().any(|g| g.is_empty()) {
        return Err(VeldError::stats(TEST, "empty group"));
    }

    let n: usize = groups.iter().map(|g| g.len()).sum();
    let k = groups.len();
    if n <= k {
        return Err(VeldError::stats(TEST, "no within-group degrees of freedom"));
    }

    let grand_sum: f64 = groups.iter().flat_map(|g| g.iter()).sum();
    let grand_mean = grand_sum / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let m = group.iter().sum::<f64>() / group.len() as f64;
        ss_between += group.len() as f64 * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = n - k;
    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    let (f_statistic, p_value) = if ms_within == 0.0 {
        if ms_between == 0.0 {
            // Every observation identical; nothing to test.
            (f64::NAN, f64::NAN)
        } else {
            (f64::INFINITY, 0.0)
        }
    } else {
        let f = ms_between / ms_within;
        (f, f_tail(f, df_between as f64, df_within as f64)?)
    };

    Ok(VeldAnova {
        f_statistic,
        p_value,
        df_between,
        df_within,
        ss_between,
        ss_within,
    })
}

/// Two-way ANOVA of `value_col` by two categorical columns, with the
/// interaction term. Rows holding a null in any of the three columns are
/// ignored.
pub fn two_way_anova(
    frame: &VeldFrame,
    factor_a: &str,
    factor_b: &str,
    value_col: &str,
) -> Result<VeldTwoWayAnova> {
    const TEST: &str = "two-way ANOVA";

    let a_cells = frame.text(factor_a)?;
    let b_cells = frame.text(factor_b)?;
    let values = frame.numeric(value_col)?;

    let mut a_levels: HashMap<&str, usize> = HashMap::new();
    let mut b_levels: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<(usize, usize, f64)> = Vec::new();

    for ((a, b), v) in a_cells.iter().zip(b_cells).zip(values) {
        let (Some(a), Some(b), Some(v)) = (a.as_ref(), b.as_ref(), v.as_ref()) else {
            continue;
        };
        let next_a = a_levels.len();
        let ai = *a_levels.entry(a.as_str()).or_insert(next_a);
        let next_b = b_levels.len();
        let bi = *b_levels.entry(b.as_str()).or_insert(next_b);
        rows.push((ai, bi, *v));
    }

    let n = rows.len();
    let a = a_levels.len();
    let b = b_levels.len();
    if a < 2 || b < 2 {
        return Err(VeldError::stats(TEST, "each factor needs at least two levels"));
    }

    // Full model: one mean per non-empty cell.
    let mut cell_groups: HashMap<(usize, usize), Vec<f64>> = HashMap::new();
    for (ai, bi, v) in &rows {
        cell_groups.entry((*ai, *bi)).or_default().push(*v);
    }
    let rank_full = cell_groups.len();
    if n <= rank_full {
        return Err(VeldError::stats(TEST, "no residual degrees of freedom"));
    }
    let residual_df = n - rank_full;
    let rss_full: f64 = cell_groups.values().map(|g| within_ss(g)).sum();
    let ms_resid = rss_full / residual_df as f64;

    // Single-factor models: within-level sums of squares.
    let rss_a = single_factor_rss(&rows, a, |r| r.0);
    let rss_b = single_factor_rss(&rows, b, |r| r.1);

    // Additive model: intercept + (a-1) + (b-1) dummies.
    let design: Vec<Vec<f64>> = rows
        .iter()
        .map(|(ai, bi, _)| {
            let mut row = vec![0.0; 1 + (a - 1) + (b - 1)];
            row[0] = 1.0;
            if *ai > 0 {
                row[*ai] = 1.0;
            }
            if *bi > 0 {
                row[a - 1 + *bi] = 1.0;
            }
            row
        })
        .collect();
    let y: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let additive = fit_least_squares(&design, &y)?;

    let term = |ss: f64, df: usize| -> Result<VeldAnovaTerm> {
        let ss = ss.max(0.0);
        if df == 0 {
            return Err(VeldError::stats(TEST, "zero degrees of freedom for a term"));
        }
        let f = (ss / df as f64) / ms_resid;
        Ok(VeldAnovaTerm {
            ss,
            df,
            f_statistic: f,
            p_value: f_tail(f, df as f64, residual_df as f64)?,
        })
    };

    let df_a = additive.rank.saturating_sub(b);
    let df_b = additive.rank.saturating_sub(a);
    let df_ab = rank_full.saturating_sub(additive.rank);

    Ok(VeldTwoWayAnova {
        factor_a: term(rss_b - additive.rss, df_a)?,
        factor_b: term(rss_a - additive.rss, df_b)?,
        interaction: term(additive.rss - rss_full, df_ab)?,
        residual_ss: rss_full,
        residual_df,
    })
}

fn within_ss(values: &[f64]) -> f64 {
    let m = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - m).powi(2)).sum()
}

fn single_factor_rss(rows: &[(usize, usize, f64)], levels: usize, key: fn(&(usize, usize, f64)) -> usize) -> f64 {
    let mut groups: Vec<Vec<f64>> = vec![Vec::new(); levels];
    for row in rows {
        groups[key(row)].push(row.2);
    }
    groups
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| within_ss(g))
        .sum()
}

/// Upper-tail probability of the F distribution.
fn f_tail(f: f64, df1: f64, df2: f64) -> Result<f64> {
    if !f.is_finite() {
        return Ok(if f > 0.0 { 0.0 } else { f64::NAN });
    }
    let dist = FisherSnedecor::new(df1, df2)
        .map_err(|e| VeldError::stats("ANOVA", format!("bad F distribution: {}", e)))?;
    Ok(1.0 - dist.cdf(f.max(0.0)))
}
