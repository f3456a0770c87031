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

//! # Vehicle Type Analysis
//!
//! Compares claim severity across vehicle types: one-way ANOVA as the
//! omnibus test and a Bonferroni-corrected pairwise t-test table over the
//! types with enough claims to matter, plus a claims chart of the largest
//! types.

use serde::{Deserialize, Serialize};

use crate::analysis::{csv_float, log_assumption_checks, PLOTS_DIR, RESULTS_FILE};
use crate::clean::CLAIMS_COLUMN;
use crate::errors::{Result, VeldError};
use crate::frame::VeldFrame;
use crate::report::{VeldPlotKind, VeldReportWriter};
use crate::stats::{one_way_anova, pairwise_t_tests, VeldPairwiseTTest, VeldTestResult};

/// Pairwise table file name.
pub const TTEST_VEHICLE_FILE: &str = "ttest_vehicle_type.csv";

/// Settings for the vehicle-type analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldVehicleConfig {
    pub group_column: String,
    pub value_column: String,
    /// Types with fewer observations stay out of the pairwise table.
    pub min_count: usize,
    pub alpha: f64,
    pub top_n_plot: usize,
    pub check_assumptions: bool,
    pub render_plots: bool,
    /// Chart shape of the rendered plot.
    pub plot_kind: VeldPlotKind,
}

impl Default for VeldVehicleConfig {
    fn default() -> Self {
        Self {
            group_column: "VehicleType".to_string(),
            value_column: CLAIMS_COLUMN.to_string(),
            min_count: 100,
            alpha: 0.05,
            top_n_plot: 10,
            check_assumptions: true,
            render_plots: true,
            plot_kind: VeldPlotKind::Box,
        }
    }
}

/// Outcome of the vehicle-type analysis.
#[derive(Clone, Debug)]
pub struct VeldVehicleReport {
    pub anova: VeldTestResult,
    pub pairwise: Vec<VeldPairwiseTTest>,
}

/// Runs the vehicle-type claims comparison and persists its artifacts.
pub fn run_vehicle_analysis(
    frame: &VeldFrame,
    config: &VeldVehicleConfig,
    writer: &VeldReportWriter,
) -> Result<VeldVehicleReport> {
    let groups: Vec<(String, Vec<f64>)> = frame
        .group_numeric(&config.group_column, &config.value_column)?
        .into_iter()
        .filter(|(level, values)| {
            if values.len() < config.min_count {
                log::warn!(
                    "excluding {} '{}' with only {} observations",
                    config.group_column,
                    level,
                    values.len()
                );
                false
            } else {
                true
            }
        })
        .collect();
    if groups.len() < 2 {
        return Err(VeldError::stats(
            "vehicle analysis",
            format!(
                "fewer than two {} levels with >= {} observations",
                config.group_column, config.min_count
            ),
        ));
    }

    if config.check_assumptions {
        log_assumption_checks("vehicle analysis", &groups);
    }

    let views: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
    let anova = one_way_anova(&views)?;
    let result = VeldTestResult::new(
        format!("ANOVA ({})", config.group_column),
        anova.f_statistic,
        anova.p_value,
    );
    writer.append_result(RESULTS_FILE, &result)?;

    let pairwise = pairwise_t_tests(&groups, config.min_count, config.alpha)?;
    let rows: Vec<Vec<String>> = pairwise
        .iter()
        .map(|row| {
            vec![
                row.level_a.clone(),
                row.level_b.clone(),
                csv_float(row.statistic),
                csv_float(row.p_value),
                csv_float(row.adjusted_p_value),
                row.significant.to_string(),
            ]
        })
        .collect();
    writer.write_csv_table(
        TTEST_VEHICLE_FILE,
        &["group1", "group2", "statistic", "p-value", "p-adj", "significant"],
        &rows,
    )?;

    #[cfg(feature = "plot")]
    if config.render_plots {
        use crate::report::{render_group_plot, VeldPlotConfig};
        let top: Vec<(String, Vec<f64>)> =
            groups.iter().take(config.top_n_plot).cloned().collect();
        let plot_config = VeldPlotConfig::default()
            .with_title(format!("{} by {}", config.value_column, config.group_column))
            .with_labels(config.group_column.clone(), config.value_column.clone());
        let path = writer
            .docs_dir()
            .join(PLOTS_DIR)
            .join("claims_by_vehicle_type.png");
        render_group_plot(&top, config.plot_kind, &plot_config, &path)?;
    }

    Ok(VeldVehicleReport {
        anova: result,
        pairwise,
    })
}
