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

//! # Cover Category Analysis
//!
//! Loss ratio across the normalized cover categories: one-way ANOVA with a
//! Tukey post-hoc table, then a two-way ANOVA crossing cover category with
//! vehicle type to separate the main effects from their interaction. The
//! chart is a hue-split bar of the cell means.

use serde::{Deserialize, Serialize};

use crate::analysis::{csv_float, log_assumption_checks, PLOTS_DIR, RESULTS_FILE};
use crate::errors::{Result, VeldError};
use crate::frame::VeldFrame;
use crate::loader::{CLEAN_COVER_CATEGORY_COLUMN, LOSS_RATIO_COLUMN};
use crate::report::VeldReportWriter;
use crate::stats::{
    one_way_anova, tukey_hsd, two_way_anova, VeldTestResult, VeldTukeyHsd, VeldTwoWayAnova,
};

/// Post-hoc table file name.
pub const TUKEY_COVER_FILE: &str = "tukey_cover_category.csv";

/// Settings for the cover-category analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldCoverageConfig {
    pub group_column: String,
    /// Second factor of the two-way ANOVA.
    pub cross_column: String,
    pub value_column: String,
    /// Categories with fewer observations are excluded.
    pub min_group_size: usize,
    pub alpha: f64,
    pub check_assumptions: bool,
    pub render_plots: bool,
}

impl Default for VeldCoverageConfig {
    fn default() -> Self {
        Self {
            group_column: CLEAN_COVER_CATEGORY_COLUMN.to_string(),
            cross_column: "VehicleType".to_string(),
            value_column: LOSS_RATIO_COLUMN.to_string(),
            min_group_size: 30,
            alpha: 0.05,
            check_assumptions: true,
            render_plots: true,
        }
    }
}

/// Outcome of the cover-category analysis.
#[derive(Clone, Debug)]
pub struct VeldCoverageReport {
    pub anova: VeldTestResult,
    pub tukey: Option<VeldTukeyHsd>,
    /// Absent when the crossing factor is missing or single-level.
    pub two_way: Option<VeldTwoWayAnova>,
}

/// Runs the cover-category loss-ratio analysis and persists its artifacts.
pub fn run_coverage_analysis(
    frame: &VeldFrame,
    config: &VeldCoverageConfig,
    writer: &VeldReportWriter,
) -> Result<VeldCoverageReport> {
    let groups: Vec<(String, Vec<f64>)> = frame
        .group_numeric(&config.group_column, &config.value_column)?
        .into_iter()
        .filter(|(level, values)| {
            if values.len() < config.min_group_size {
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
            "coverage analysis",
            format!(
                "fewer than two {} levels with >= {} observations",
                config.group_column, config.min_group_size
            ),
        ));
    }

    if config.check_assumptions {
        log_assumption_checks("coverage analysis", &groups);
    }

    let views: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
    let anova = one_way_anova(&views)?;
    let result = VeldTestResult::new(
        format!("ANOVA ({})", config.group_column),
        anova.f_statistic,
        anova.p_value,
    );
    writer.append_result(RESULTS_FILE, &result)?;

    let tukey = if anova.p_value < config.alpha {
        let table = tukey_hsd(&groups, config.alpha)?;
        let rows: Vec<Vec<String>> = table
            .pairs
            .iter()
            .map(|pair| {
                vec![
                    pair.level_a.clone(),
                    pair.level_b.clone(),
                    csv_float(pair.mean_diff),
                    csv_float(pair.p_adjusted),
                    csv_float(pair.lower),
                    csv_float(pair.upper),
                    pair.reject.to_string(),
                ]
            })
            .collect();
        writer.write_csv_table(
            TUKEY_COVER_FILE,
            &["group1", "group2", "meandiff", "p-adj", "lower", "upper", "reject"],
            &rows,
        )?;
        Some(table)
    } else {
        None
    };

    // The two-way table is best-effort: a single-level crossing factor or
    // empty cells leave the one-way findings standing on their own.
    let two_way = match two_way_anova(
        frame,
        &config.group_column,
        &config.cross_column,
        &config.value_column,
    ) {
        Ok(table) => {
            writer.append_result(
                RESULTS_FILE,
                &VeldTestResult::new(
                    format!("Two-way ANOVA ({})", config.group_column),
                    table.factor_a.f_statistic,
                    table.factor_a.p_value,
                ),
            )?;
            writer.append_result(
                RESULTS_FILE,
                &VeldTestResult::new(
                    format!("Two-way ANOVA ({})", config.cross_column),
                    table.factor_b.f_statistic,
                    table.factor_b.p_value,
                ),
            )?;
            writer.append_result(
                RESULTS_FILE,
                &VeldTestResult::new(
                    format!(
                        "Two-way ANOVA ({} x {})",
                        config.group_column, config.cross_column
                    ),
                    table.interaction.f_statistic,
                    table.interaction.p_value,
                ),
            )?;
            Some(table)
        }
        Err(e) => {
            log::warn!("two-way ANOVA skipped: {}", e);
            None
        }
    };

    #[cfg(feature = "plot")]
    if config.render_plots && frame.contains_column(&config.cross_column) {
        use crate::report::{render_hue_bar, VeldPlotConfig};
        let categories = frame.text(&config.group_column)?;
        let hues = frame.text(&config.cross_column)?;
        let values = frame.numeric(&config.value_column)?;
        let mut cells: Vec<(String, String, Vec<f64>)> = Vec::new();
        for ((category, hue), value) in categories.iter().zip(hues).zip(values) {
            let (Some(category), Some(hue), Some(value)) =
                (category.as_ref(), hue.as_ref(), value.as_ref())
            else {
                continue;
            };
            if !groups.iter().any(|(level, _)| level == category) {
                continue;
            }
            match cells
                .iter_mut()
                .find(|(c, h, _)| c == category && h == hue)
            {
                Some((_, _, bucket)) => bucket.push(*value),
                None => cells.push((category.clone(), hue.clone(), vec![*value])),
            }
        }
        if !cells.is_empty() {
            let plot_config = VeldPlotConfig::default()
                .with_title(format!(
                    "{} by {} and {}",
                    config.value_column, config.group_column, config.cross_column
                ))
                .with_labels(config.group_column.clone(), config.value_column.clone());
            let path = writer
                .docs_dir()
                .join(PLOTS_DIR)
                .join("loss_ratio_by_cover_and_vehicle.png");
            render_hue_bar(&cells, &plot_config, &path)?;
        }
    }

    Ok(VeldCoverageReport {
        anova: result,
        tukey,
        two_way,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage_frame(effect: f64) -> VeldFrame {
        let mut frame = VeldFrame::new();
        let mut covers = Vec::new();
        let mut vehicles = Vec::new();
        let mut ratios = Vec::new();
        let noise = [0.4, -0.2, 0.3, -0.3, 0.1, -0.1];
        for (ci, cover) in ["Own Damage", "Windscreen"].iter().enumerate() {
            for (vi, vehicle) in ["SUV", "Truck"].iter().enumerate() {
                for (r, eps) in noise.iter().enumerate() {
                    covers.push(Some((*cover).to_string()));
                    vehicles.push(Some((*vehicle).to_string()));
                    let mut v =
                        10.0 + ci as f64 * effect + vi as f64 * 2.0 + eps + r as f64 * 0.01;
                    if ci == 1 && vi == 1 {
                        v += effect / 2.0;
                    }
                    ratios.push(Some(v));
                }
            }
        }
        frame
            .insert_text(CLEAN_COVER_CATEGORY_COLUMN, covers)
            .unwrap();
        frame.insert_text("VehicleType", vehicles).unwrap();
        frame.insert_numeric(LOSS_RATIO_COLUMN, ratios).unwrap();
        frame
    }

    fn test_config() -> VeldCoverageConfig {
        VeldCoverageConfig {
            min_group_size: 5,
            check_assumptions: false,
            render_plots: false,
            ..VeldCoverageConfig::default()
        }
    }

    #[test]
    fn full_table_is_written_for_strong_effects() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let report =
            run_coverage_analysis(&coverage_frame(12.0), &test_config(), &writer).unwrap();

        assert!(report.anova.p_value < 0.01);
        assert!(report.tukey.is_some());
        let two_way = report.two_way.expect("crossed factors present");
        assert!(two_way.factor_a.p_value < 0.01);

        let results = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
        let lines: Vec<&str> = results.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ANOVA (CleanCoverCategory): "));
        assert!(lines[1].starts_with("Two-way ANOVA (CleanCoverCategory): "));
        assert!(lines[2].starts_with("Two-way ANOVA (VehicleType): "));
        assert!(lines[3].starts_with("Two-way ANOVA (CleanCoverCategory x VehicleType): "));
        assert!(dir.path().join(TUKEY_COVER_FILE).exists());
    }

    #[test]
    fn weak_effects_skip_the_posthoc() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let report =
            run_coverage_analysis(&coverage_frame(0.0), &test_config(), &writer).unwrap();
        assert!(report.tukey.is_none());
        assert!(!dir.path().join(TUKEY_COVER_FILE).exists());
    }

    #[test]
    fn missing_cross_column_degrades_to_one_way() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let mut frame = coverage_frame(12.0);
        frame.drop_columns(&["VehicleType"]);
        let report = run_coverage_analysis(&frame, &test_config(), &writer).unwrap();
        assert!(report.two_way.is_none());
        assert!(report.anova.p_value < 0.01);
    }
}
