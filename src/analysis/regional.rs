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

//! # Regional Risk Analysis
//!
//! Tests whether the loss ratio differs across provinces: one-way ANOVA
//! over the provinces with enough exposure, Tukey HSD post-hoc when the
//! omnibus test is significant, and a box plot of the largest provinces.

use serde::{Deserialize, Serialize};

use crate::analysis::{log_assumption_checks, csv_float, PLOTS_DIR, RESULTS_FILE};
use crate::errors::{Result, VeldError};
use crate::frame::VeldFrame;
use crate::loader::LOSS_RATIO_COLUMN;
use crate::report::{VeldPlotKind, VeldReportWriter};
use crate::stats::{one_way_anova, tukey_hsd, VeldTestResult, VeldTukeyHsd};

/// Post-hoc table file name.
pub const TUKEY_PROVINCE_FILE: &str = "tukey_province.csv";

/// Settings for the regional analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldRegionalConfig {
    /// Grouping column.
    pub group_column: String,
    /// Value column under test.
    pub value_column: String,
    /// Provinces with fewer observations are excluded.
    pub min_group_size: usize,
    /// Significance level for the omnibus test and the post-hoc table.
    pub alpha: f64,
    /// At most this many provinces appear in the chart.
    pub top_n_plot: usize,
    /// Log Shapiro-Wilk / Levene outcomes before testing.
    pub check_assumptions: bool,
    /// Render the chart (requires the `plot` feature).
    pub render_plots: bool,
    /// Chart shape of the rendered plot.
    pub plot_kind: VeldPlotKind,
}

impl Default for VeldRegionalConfig {
    fn default() -> Self {
        Self {
            group_column: "Province".to_string(),
            value_column: LOSS_RATIO_COLUMN.to_string(),
            min_group_size: 30,
            alpha: 0.05,
            top_n_plot: 10,
            check_assumptions: true,
            render_plots: true,
            plot_kind: VeldPlotKind::Box,
        }
    }
}

/// Outcome of the regional analysis.
#[derive(Clone, Debug)]
pub struct VeldRegionalReport {
    pub anova: VeldTestResult,
    /// Present only when the omnibus test was significant.
    pub tukey: Option<VeldTukeyHsd>,
    /// Provinces that made the size cut, largest first.
    pub groups_tested: Vec<String>,
}

/// Runs the regional loss-ratio analysis and persists its artifacts.
pub fn run_regional_analysis(
    frame: &VeldFrame,
    config: &VeldRegionalConfig,
    writer: &VeldReportWriter,
) -> Result<VeldRegionalReport> {
    let all_groups = frame.group_numeric(&config.group_column, &config.value_column)?;
    let groups: Vec<(String, Vec<f64>)> = all_groups
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
            "regional analysis",
            format!(
                "fewer than two {} levels with >= {} observations",
                config.group_column, config.min_group_size
            ),
        ));
    }

    if config.check_assumptions {
        log_assumption_checks("regional analysis", &groups);
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
            TUKEY_PROVINCE_FILE,
            &["group1", "group2", "meandiff", "p-adj", "lower", "upper", "reject"],
            &rows,
        )?;
        Some(table)
    } else {
        log::info!(
            "omnibus test not significant (p = {:.4}), skipping Tukey post-hoc",
            anova.p_value
        );
        None
    };

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
            .join("loss_ratio_by_province.png");
        render_group_plot(&top, config.plot_kind, &plot_config, &path)?;
    }

    Ok(VeldRegionalReport {
        anova: result,
        tukey,
        groups_tested: groups.into_iter().map(|(level, _)| level).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regional_frame(shift: f64) -> VeldFrame {
        let mut frame = VeldFrame::new();
        let mut provinces = Vec::new();
        let mut ratios = Vec::new();
        let noise = [0.4, -0.2, 0.1, -0.3, 0.25, -0.1, 0.05, -0.15];
        for (i, province) in ["Gauteng", "Limpopo", "Mpumalanga"].iter().enumerate() {
            for (r, eps) in noise.iter().enumerate() {
                provinces.push(Some((*province).to_string()));
                ratios.push(Some(10.0 + i as f64 * shift + eps + r as f64 * 0.01));
            }
        }
        // A province too small to test.
        provinces.push(Some("Tiny".to_string()));
        ratios.push(Some(50.0));
        frame.insert_text("Province", provinces).unwrap();
        frame.insert_numeric(LOSS_RATIO_COLUMN, ratios).unwrap();
        frame
    }

    fn test_config() -> VeldRegionalConfig {
        VeldRegionalConfig {
            min_group_size: 5,
            check_assumptions: false,
            render_plots: false,
            ..VeldRegionalConfig::default()
        }
    }

    #[test]
    fn significant_differences_trigger_tukey() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let report =
            run_regional_analysis(&regional_frame(5.0), &test_config(), &writer).unwrap();

        assert_eq!(report.groups_tested.len(), 3);
        assert!(report.anova.p_value < 0.05);
        let tukey = report.tukey.expect("post-hoc should run");
        assert_eq!(tukey.pairs.len(), 3);

        let results = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
        assert!(results.starts_with("ANOVA (Province): statistic = "));
        assert!(dir.path().join(TUKEY_PROVINCE_FILE).exists());
    }

    #[test]
    fn flat_provinces_skip_tukey() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let report =
            run_regional_analysis(&regional_frame(0.0), &test_config(), &writer).unwrap();

        assert!(report.anova.p_value > 0.05);
        assert!(report.tukey.is_none());
        assert!(!dir.path().join(TUKEY_PROVINCE_FILE).exists());
    }

    #[test]
    fn default_chart_is_a_box_plot() {
        assert_eq!(VeldRegionalConfig::default().plot_kind, VeldPlotKind::Box);
    }

    #[test]
    fn too_few_groups_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let config = VeldRegionalConfig {
            min_group_size: 100,
            ..test_config()
        };
        assert!(run_regional_analysis(&regional_frame(5.0), &config, &writer).is_err());
    }
}
