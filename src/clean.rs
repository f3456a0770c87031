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

//! # Veld Cleaning Module
//!
//! Data cleaning for the claims table:
//!
//! - [`VeldCategoryCleaner`] normalizes the free-text cover-category field
//!   into canonical levels
//! - [`drop_leaky_columns`] removes columns known to leak the target
//! - [`impute_missing`] fills missing numeric cells (mean/median/drop);
//!   the claims column is special-cased to zero (missing = no claim)
//! - [`remove_outliers_iqr`] trims rows outside the interquartile fences
//!
//! All steps are single-shot frame transformations; none of them keeps
//! state between calls.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::frame::{VeldColumn, VeldFrame};
use crate::stats::descriptive::{mean, median, quantile};

/// Columns that leak the outcome and are dropped before analysis.
pub const LEAKY_COLUMNS: [&str; 2] = ["NumberOfVehiclesInFleet", "CrossBorder"];

/// Column holding total claims; imputed with zero rather than the mean.
pub const CLAIMS_COLUMN: &str = "TotalClaims";

/// Level assigned to missing categorical cells.
pub const UNKNOWN_LEVEL: &str = "Unknown";

/// Missing-value strategy for [`impute_missing`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeldImputeStrategy {
    /// Fill numeric gaps with the column mean.
    #[default]
    Mean,
    /// Fill numeric gaps with the column median.
    Median,
    /// Drop every row holding any missing value.
    Drop,
}

/// Normalizes the raw cover-category field.
///
/// Raw levels come in compacted, punctuated and suffixed variants
/// (`ownDamage`, `own-damage`, `Own Damage (2015)`); this cleaner trims,
/// lowercases, strips punctuation and a trailing parenthesized year, maps
/// the known compacted names onto their canonical levels and title-cases
/// the rest.
#[derive(Debug)]
pub struct VeldCategoryCleaner {
    year_suffix: Regex,
    canonical: HashMap<&'static str, &'static str>,
}

impl Default for VeldCategoryCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl VeldCategoryCleaner {
    /// Creates a cleaner with the standard canonical map.
    pub fn new() -> Self {
        let canonical = HashMap::from([
            ("owndamage", "Own Damage"),
            ("windscreen", "Windscreen"),
            ("incomprotector", "Income Protector"),
            ("creditprotection", "Credit Protection"),
        ]);
        Self {
            // Unwrap is fine: the pattern is a literal part of the build.
            year_suffix: Regex::new(r"\s*\(\d{4}\)\s*$").expect("static regex"),
            canonical,
        }
    }

    /// Normalizes a single cell; `None` becomes the `Unknown` level.
    pub fn normalize(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return UNKNOWN_LEVEL.to_string();
        };
        let stripped = self.year_suffix.replace(raw.trim(), "");
        let compact: String = stripped
            .to_lowercase()
            .chars()
            .filter(|c| *c != '.' && *c != '-')
            .collect();
        if compact.is_empty() {
            return UNKNOWN_LEVEL.to_string();
        }
        match self.canonical.get(compact.as_str()) {
            Some(level) => (*level).to_string(),
            None => title_case(&compact),
        }
    }

    /// Normalizes `source` into a new text column named `target`.
    pub fn normalize_column(
        &self,
        frame: &mut VeldFrame,
        source: &str,
        target: &str,
    ) -> Result<()> {
        let cleaned: Vec<Option<String>> = frame
            .text(source)?
            .iter()
            .map(|cell| Some(self.normalize(cell.as_deref())))
            .collect();
        frame.insert_text(target, cleaned)
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops the known target-leaking columns when present.
pub fn drop_leaky_columns(frame: &mut VeldFrame) {
    frame.drop_columns(&LEAKY_COLUMNS);
}

/// Fills missing values in every numeric column according to `strategy`.
///
/// The claims column is excluded from mean/median imputation and filled
/// with zero instead; a policy-month without a claim row is a zero claim,
/// not an unknown one. With [`VeldImputeStrategy::Drop`] every row holding
/// any missing cell (numeric or text) is removed.
pub fn impute_missing(frame: &mut VeldFrame, strategy: VeldImputeStrategy) -> Result<()> {
    if strategy == VeldImputeStrategy::Drop {
        let all: Vec<String> = frame.column_names().to_vec();
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        return frame.drop_null_rows(&refs);
    }

    let names: Vec<String> = frame.column_names().to_vec();
    for name in names {
        let values = match frame.column(&name)? {
            VeldColumn::Numeric(v) => v.clone(),
            VeldColumn::Text(_) => continue,
        };
        if values.iter().all(Option::is_some) {
            continue;
        }
        let fill = if name == CLAIMS_COLUMN {
            Some(0.0)
        } else {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            match strategy {
                VeldImputeStrategy::Mean => mean(&present),
                VeldImputeStrategy::Median => median(&present),
                VeldImputeStrategy::Drop => unreachable!(),
            }
        };
        // A fully-null column has nothing to impute from; leave it alone.
        let Some(fill) = fill else {
            log::warn!("column '{}' is entirely missing, skipping imputation", name);
            continue;
        };
        let filled: Vec<Option<f64>> = values.iter().map(|v| v.or(Some(fill))).collect();
        frame.insert_numeric(name, filled)?;
    }
    Ok(())
}

/// Removes rows outside `[Q1 - k*IQR, Q3 + k*IQR]` for each listed column.
///
/// Columns are trimmed one after another, so each fence is computed on the
/// rows surviving the previous column. Text columns that are not
/// boolean-like are skipped; boolean-likes are coerced to 0/1 first.
/// Missing cells never cause a row to be trimmed.
pub fn remove_outliers_iqr(frame: &mut VeldFrame, columns: &[&str], factor: f64) -> Result<()> {
    for name in columns {
        if !frame.contains_column(name) {
            continue;
        }
        let Some(view) = frame.numeric_view(name)? else {
            log::warn!("column '{}' is not numeric, skipping IQR trim", name);
            continue;
        };
        let present: Vec<f64> = view.iter().flatten().copied().collect();
        let (Some(q1), Some(q3)) = (quantile(&present, 0.25), quantile(&present, 0.75)) else {
            continue;
        };
        let iqr = q3 - q1;
        let lower = q1 - factor * iqr;
        let upper = q3 + factor * iqr;

        let before = frame.n_rows();
        let mask: Vec<bool> = view
            .iter()
            .map(|cell| cell.map_or(true, |v| v >= lower && v <= upper))
            .collect();
        frame.retain_rows(&mask)?;
        log::debug!(
            "IQR trim on '{}' removed {} of {} rows",
            name,
            before - frame.n_rows(),
            before
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_cleaner_canonical_levels() {
        let cleaner = VeldCategoryCleaner::new();
        assert_eq!(cleaner.normalize(Some("  Own-Damage ")), "Own Damage");
        assert_eq!(cleaner.normalize(Some("ownDamage")), "Own Damage");
        assert_eq!(cleaner.normalize(Some("windscreen (2015)")), "Windscreen");
        assert_eq!(
            cleaner.normalize(Some("credit.protection")),
            "Credit Protection"
        );
    }

    #[test]
    fn category_cleaner_title_cases_unknown_levels() {
        let cleaner = VeldCategoryCleaner::new();
        assert_eq!(cleaner.normalize(Some("keys and alarms")), "Keys And Alarms");
        assert_eq!(cleaner.normalize(None), "Unknown");
        assert_eq!(cleaner.normalize(Some("  - ")), "Unknown");
    }

    #[test]
    fn leaky_columns_are_dropped() {
        let mut frame = VeldFrame::new();
        frame
            .insert_numeric("NumberOfVehiclesInFleet", vec![Some(1.0)])
            .unwrap();
        frame.insert_numeric("TotalClaims", vec![Some(1.0)]).unwrap();
        drop_leaky_columns(&mut frame);
        assert!(!frame.contains_column("NumberOfVehiclesInFleet"));
        assert!(frame.contains_column("TotalClaims"));
    }

    #[test]
    fn mean_imputation_skips_claims_column() {
        let mut frame = VeldFrame::new();
        frame
            .insert_numeric("SumInsured", vec![Some(10.0), None, Some(20.0)])
            .unwrap();
        frame
            .insert_numeric(CLAIMS_COLUMN, vec![Some(100.0), None, Some(300.0)])
            .unwrap();
        impute_missing(&mut frame, VeldImputeStrategy::Mean).unwrap();
        assert_eq!(frame.numeric("SumInsured").unwrap()[1], Some(15.0));
        // Missing claims mean "no claim", not "average claim".
        assert_eq!(frame.numeric(CLAIMS_COLUMN).unwrap()[1], Some(0.0));
    }

    #[test]
    fn drop_strategy_removes_incomplete_rows() {
        let mut frame = VeldFrame::new();
        frame
            .insert_numeric("a", vec![Some(1.0), None, Some(3.0)])
            .unwrap();
        frame
            .insert_text("b", vec![Some("x".into()), Some("y".into()), None])
            .unwrap();
        impute_missing(&mut frame, VeldImputeStrategy::Drop).unwrap();
        assert_eq!(frame.n_rows(), 1);
    }

    #[test]
    fn iqr_trim_removes_extreme_rows() {
        let mut frame = VeldFrame::new();
        let mut values: Vec<Option<f64>> = (1..=20).map(|v| Some(f64::from(v))).collect();
        values.push(Some(1000.0));
        frame.insert_numeric("premium", values).unwrap();
        remove_outliers_iqr(&mut frame, &["premium"], 1.5).unwrap();
        assert_eq!(frame.n_rows(), 20);
    }

    #[test]
    fn iqr_trim_skips_free_text_and_keeps_nulls() {
        let mut frame = VeldFrame::new();
        frame
            .insert_text(
                "label",
                vec![Some("a".into()), Some("b".into()), Some("c".into())],
            )
            .unwrap();
        frame
            .insert_numeric("v", vec![Some(1.0), None, Some(2.0)])
            .unwrap();
        remove_outliers_iqr(&mut frame, &["label", "v", "absent"], 1.5).unwrap();
        assert_eq!(frame.n_rows(), 3);
    }
}
