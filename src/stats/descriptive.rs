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

//! # Descriptive Statistics
//!
//! Scalar helpers (mean, variance, interpolated quantiles) shared by the
//! cleaning and hypothesis-testing code, plus a frame-level summary used by
//! the `profile` operation.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::frame::{VeldColumn, VeldFrame};

/// Arithmetic mean; `None` on an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n − 1 denominator); `None` below two observations.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Sample standard deviation; `None` below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Linearly interpolated quantile, `q` in `[0, 1]`; `None` on empty input.
///
/// Matches the default interpolation of the usual dataframe stacks, so the
/// IQR fences land where the original cleaning pipeline put them.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Median; `None` on empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Summary of a single numeric column.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VeldNumericSummary {
    pub count: usize,
    pub null_count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
}

/// Summary of a single text column.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VeldTextSummary {
    pub count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    pub top_level: Option<String>,
    pub top_count: usize,
}

/// Per-column summaries for a whole frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VeldFrameSummary {
    pub n_rows: usize,
    pub numeric: HashMap<String, VeldNumericSummary>,
    pub text: HashMap<String, VeldTextSummary>,
}

impl VeldFrameSummary {
    /// Computes summaries for every column of `frame`.
    pub fn compute(frame: &VeldFrame) -> Self {
        let mut summary = Self {
            n_rows: frame.n_rows(),
            ..Self::default()
        };

        for name in frame.column_names() {
            let Ok(column) = frame.column(name) else {
                continue;
            };
            match column {
                VeldColumn::Numeric(cells) => {
                    let values: Vec<f64> = cells.iter().flatten().copied().collect();
                    summary
                        .numeric
                        .insert(name.clone(), numeric_summary(&values, cells.len()));
                }
                VeldColumn::Text(cells) => {
                    let values: Vec<&str> =
                        cells.iter().flatten().map(String::as_str).collect();
                    summary
                        .text
                        .insert(name.clone(), text_summary(&values, cells.len()));
                }
            }
        }
        summary
    }
}

fn numeric_summary(values: &[f64], total: usize) -> VeldNumericSummary {
    if values.is_empty() {
        return VeldNumericSummary {
            null_count: total,
            ..VeldNumericSummary::default()
        };
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    VeldNumericSummary {
        count: values.len(),
        null_count: total - values.len(),
        mean: mean(values).unwrap_or(0.0),
        std_dev: sample_std(values).unwrap_or(0.0),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        median: median(values).unwrap_or(0.0),
        p25: quantile(values, 0.25).unwrap_or(0.0),
        p75: quantile(values, 0.75).unwrap_or(0.0),
    }
}

fn text_summary(values: &[&str], total: usize) -> VeldTextSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let top = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(k, v)| ((*k).to_string(), *v));
    VeldTextSummary {
        count: values.len(),
        null_count: total - values.len(),
        unique_count: values.iter().collect::<HashSet<_>>().len(),
        top_level: top.as_ref().map(|(k, _)| k.clone()),
        top_count: top.map_or(0, |(_, v)| v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn sample_variance_uses_n_minus_one() {
        let values = [2.0, 4.0, 6.0];
        assert_eq!(sample_variance(&values), Some(4.0));
        assert_eq!(sample_variance(&[1.0]), None);
    }

    #[test]
    fn frame_summary_covers_both_kinds() {
        let mut frame = VeldFrame::new();
        frame
            .insert_numeric("v", vec![Some(1.0), Some(3.0), None])
            .unwrap();
        frame
            .insert_text(
                "g",
                vec![Some("a".into()), Some("a".into()), Some("b".into())],
            )
            .unwrap();
        let summary = VeldFrameSummary::compute(&frame);
        assert_eq!(summary.n_rows, 3);
        let v = &summary.numeric["v"];
        assert_eq!(v.count, 2);
        assert_eq!(v.null_count, 1);
        assert!((v.mean - 2.0).abs() < 1e-12);
        let g = &summary.text["g"];
        assert_eq!(g.unique_count, 2);
        assert_eq!(g.top_level.as_deref(), Some("a"));
        assert_eq!(g.top_count, 2);
    }
}
