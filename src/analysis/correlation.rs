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

//! # Correlation Analysis
//!
//! Pearson correlations of the numeric features: a full pairwise matrix
//! persisted as CSV, plus headline result lines for each feature against
//! the target column. Pairs are computed on complete rows only.

use serde::{Deserialize, Serialize};

use crate::analysis::{csv_float, RESULTS_FILE};
use crate::clean::CLAIMS_COLUMN;
use crate::errors::{Result, VeldError};
use crate::frame::{VeldColumn, VeldFrame};
use crate::loader::{LOSS_RATIO_COLUMN, PREMIUM_COLUMN};
use crate::report::VeldReportWriter;
use crate::stats::{pearson, VeldPearson, VeldTestResult};

/// Correlation matrix file name.
pub const CORRELATION_MATRIX_FILE: &str = "correlation_matrix.csv";

/// Settings for the correlation analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldCorrelationConfig {
    /// Columns admitted into the matrix; empty means every numeric column.
    ///
    /// The default list keeps identifier-like numerics (policy ids, postal
    /// codes) out of the matrix when the analysis runs on the full cleaned
    /// frame.
    pub columns: Vec<String>,
    /// Column the headline result lines correlate against.
    pub target_column: String,
    /// Pairs with fewer complete rows are skipped.
    pub min_pairs: usize,
}

impl Default for VeldCorrelationConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                PREMIUM_COLUMN.to_string(),
                CLAIMS_COLUMN.to_string(),
                LOSS_RATIO_COLUMN.to_string(),
                "CalculatedPremiumPerTerm".to_string(),
                "SumInsured".to_string(),
            ],
            target_column: CLAIMS_COLUMN.to_string(),
            min_pairs: 3,
        }
    }
}

/// Outcome of the correlation analysis.
#[derive(Clone, Debug)]
pub struct VeldCorrelationReport {
    /// Numeric columns entering the matrix, in frame order.
    pub columns: Vec<String>,
    /// Correlations of each non-target column against the target.
    pub against_target: Vec<(String, VeldPearson)>,
}

/// Runs the correlation analysis and persists its artifacts.
pub fn run_correlation_analysis(
    frame: &VeldFrame,
    config: &VeldCorrelationConfig,
    writer: &VeldReportWriter,
) -> Result<VeldCorrelationReport> {
    let columns: Vec<String> = frame
        .column_names()
        .iter()
        .filter(|name| config.columns.is_empty() || config.columns.iter().any(|c| c == *name))
        .filter(|name| matches!(frame.column(name), Ok(VeldColumn::Numeric(_))))
        .cloned()
        .collect();
    if columns.len() < 2 {
        return Err(VeldError::stats(
            "correlation analysis",
            "needs at least two numeric columns",
        ));
    }
    if !columns.iter().any(|c| *c == config.target_column) {
        return Err(VeldError::schema(format!(
            "target column '{}' is not numeric or missing",
            config.target_column
        )));
    }

    // Full matrix, diagonal 1, unusable pairs as empty cells.
    let mut header: Vec<&str> = vec![""];
    header.extend(columns.iter().map(String::as_str));
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(columns.len());
    let mut against_target = Vec::new();

    for a in &columns {
        let mut row = vec![a.clone()];
        for b in &columns {
            if a == b {
                row.push("1.0000".to_string());
                continue;
            }
            match paired(frame, a, b, config.min_pairs) {
                Some((x, y)) => match pearson(&x, &y) {
                    Ok(result) => {
                        row.push(csv_float(result.correlation));
                        if b == &config.target_column {
                            against_target.push((a.clone(), result));
                        }
                    }
                    Err(e) => {
                        log::warn!("correlation '{}' vs '{}' skipped: {}", a, b, e);
                        row.push(String::new());
                    }
                },
                None => row.push(String::new()),
            }
        }
        rows.push(row);
    }
    writer.write_csv_table(CORRELATION_MATRIX_FILE, &header, &rows)?;

    for (name, result) in &against_target {
        writer.append_result(
            RESULTS_FILE,
            &VeldTestResult::new(
                format!("Pearson ({} ~ {})", name, config.target_column),
                result.correlation,
                result.p_value,
            ),
        )?;
    }

    Ok(VeldCorrelationReport {
        columns,
        against_target,
    })
}

/// Complete-row pairs of two numeric columns, `None` when too few remain.
fn paired(frame: &VeldFrame, a: &str, b: &str, min_pairs: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let va = frame.numeric(a).ok()?;
    let vb = frame.numeric(b).ok()?;
    let mut x = Vec::new();
    let mut y = Vec::new();
    for (ca, cb) in va.iter().zip(vb) {
        if let (Some(ca), Some(cb)) = (ca, cb) {
            x.push(*ca);
            y.push(*cb);
        }
    }
    (x.len() >= min_pairs.max(3)).then_some((x, y))
}
