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

//! # Gender Risk Analysis
//!
//! Welch t-test of claim severity between the two largest gender levels
//! (placeholder levels such as "Not specified" are ignored), plus a
//! distribution plot of the compared groups.

use serde::{Deserialize, Serialize};

use crate::analysis::{log_assumption_checks, PLOTS_DIR, RESULTS_FILE};
use crate::clean::CLAIMS_COLUMN;
use crate::errors::{Result, VeldError};
use crate::frame::VeldFrame;
use crate::report::{VeldPlotKind, VeldReportWriter};
use crate::stats::{t_test, VeldTTest, VeldTTestKind, VeldTestResult};

/// Settings for the gender analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldGenderConfig {
    pub group_column: String,
    pub value_column: String,
    /// Levels treated as missing rather than compared.
    pub placeholder_levels: Vec<String>,
    /// Each compared level needs at least this many observations.
    pub min_group_size: usize,
    pub kind: VeldTTestKind,
    pub check_assumptions: bool,
    pub render_plots: bool,
    /// Chart shape of the rendered plot.
    pub plot_kind: VeldPlotKind,
}

impl Default for VeldGenderConfig {
    fn default() -> Self {
        Self {
            group_column: "Gender".to_string(),
            value_column: CLAIMS_COLUMN.to_string(),
            placeholder_levels: vec!["Not specified".to_string(), "Unknown".to_string()],
            min_group_size: 30,
            kind: VeldTTestKind::Welch,
            check_assumptions: true,
            render_plots: true,
            plot_kind: VeldPlotKind::Box,
        }
    }
}

/// Outcome of the gender analysis.
#[derive(Clone, Debug)]
pub struct VeldGenderReport {
    pub t_test: VeldTTest,
    pub result: VeldTestResult,
    /// The two compared levels, larger first.
    pub levels: (String, String),
}

/// Runs the gender claim-severity comparison and appends its result line.
pub fn run_gender_analysis(
    frame: &VeldFrame,
    config: &VeldGenderConfig,
    writer: &VeldReportWriter,
) -> Result<VeldGenderReport> {
    let groups: Vec<(String, Vec<f64>)> = frame
        .group_numeric(&config.group_column, &config.value_column)?
        .into_iter()
        .filter(|(level, values)| {
            !config.placeholder_levels.iter().any(|p| p == level)
                && values.len() >= config.min_group_size
        })
        .collect();
    if groups.len() < 2 {
        return Err(VeldError::stats(
            "gender analysis",
            format!(
                "fewer than two usable {} levels with >= {} observations",
                config.group_column, config.min_group_size
            ),
        ));
    }
    // group_numeric orders by descending size; compare the two largest.
    let compared = &groups[..2];
    if groups.len() > 2 {
        log::warn!(
            "{} has {} usable levels, comparing the two largest ('{}', '{}')",
            config.group_column,
            groups.len(),
            compared[0].0,
            compared[1].0
        );
    }

    if config.check_assumptions {
        log_assumption_checks("gender analysis", compared);
    }

    let outcome = t_test(&compared[0].1, &compared[1].1, config.kind)?;
    let result = VeldTestResult::new(
        format!("T-test ({})", config.group_column),
        outcome.statistic,
        outcome.p_value,
    );
    writer.append_result(RESULTS_FILE, &result)?;

    #[cfg(feature = "plot")]
    if config.render_plots {
        use crate::report::{render_group_plot, VeldPlotConfig};
        let plot_config = VeldPlotConfig::default()
            .with_title(format!("{} by {}", config.value_column, config.group_column))
            .with_labels(config.group_column.clone(), config.value_column.clone());
        let path = writer
            .docs_dir()
            .join(PLOTS_DIR)
            .join("claims_by_gender.png");
        render_group_plot(compared, config.plot_kind, &plot_config, &path)?;
    }

    Ok(VeldGenderReport {
        t_test: outcome,
        result,
        levels: (compared[0].0.clone(), compared[1].0.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gender_frame(shift: f64) -> VeldFrame {
        let mut frame = VeldFrame::new();
        let mut genders = Vec::new();
        let mut claims = Vec::new();
        let noise = [0.5, -0.3, 0.2, -0.4, 0.1, -0.2];
        for (i, gender) in ["Male", "Female"].iter().enumerate() {
            for (r, eps) in noise.iter().enumerate() {
                genders.push(Some((*gender).to_string()));
                claims.push(Some(20.0 + i as f64 * shift + eps + r as f64 * 0.01));
            }
        }
        genders.push(Some("Not specified".to_string()));
        claims.push(Some(99.0));
        frame.insert_text("Gender", genders).unwrap();
        frame.insert_numeric(CLAIMS_COLUMN, claims).unwrap();
        frame
    }

    fn test_config() -> VeldGenderConfig {
        VeldGenderConfig {
            min_group_size: 3,
            check_assumptions: false,
            render_plots: false,
            ..VeldGenderConfig::default()
        }
    }

    #[test]
    fn separated_means_are_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let report = run_gender_analysis(&gender_frame(8.0), &test_config(), &writer).unwrap();

        assert!(report.result.p_value < 0.01);
        assert_eq!(report.levels.0, "Female");
        assert_eq!(report.levels.1, "Male");
        let results = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
        assert!(results.starts_with("T-test (Gender): statistic = "));
    }

    #[test]
    fn placeholder_levels_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let report = run_gender_analysis(&gender_frame(0.0), &test_config(), &writer).unwrap();
        assert_ne!(report.levels.0, "Not specified");
        assert_ne!(report.levels.1, "Not specified");
        assert!(report.result.p_value > 0.05);
    }

    #[test]
    fn default_chart_is_a_box_plot() {
        assert_eq!(VeldGenderConfig::default().plot_kind, VeldPlotKind::Box);
    }

    #[test]
    fn single_usable_level_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = VeldReportWriter::new(dir.path());
        let config = VeldGenderConfig {
            min_group_size: 7,
            ..test_config()
        };
        assert!(run_gender_analysis(&gender_frame(1.0), &config, &writer).is_err());
    }
}
