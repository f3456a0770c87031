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

//! # Hypothesis Analyses
//!
//! The five claim analyses, each a single entry point taking the cleaned
//! analysis frame and a report writer:
//!
//! - [`regional`]: loss ratio by province (one-way ANOVA, Tukey post-hoc)
//! - [`gender`]: claim severity by gender (Welch t-test)
//! - [`vehicle`]: claims by vehicle type (ANOVA plus pairwise t-tests)
//! - [`coverage`]: loss ratio by cover category, alone and crossed with
//!   vehicle type (one-way and two-way ANOVA)
//! - [`correlation`]: Pearson correlations of the numeric features
//!
//! Every analysis appends its headline test lines to the shared results
//! file, writes post-hoc tables as CSV and, with the `plot` feature,
//! renders its chart under `plots/` inside the docs directory.

pub mod correlation;
pub mod coverage;
pub mod gender;
pub mod regional;
pub mod vehicle;

pub use correlation::{run_correlation_analysis, VeldCorrelationConfig, VeldCorrelationReport};
pub use coverage::{run_coverage_analysis, VeldCoverageConfig, VeldCoverageReport};
pub use gender::{run_gender_analysis, VeldGenderConfig, VeldGenderReport};
pub use regional::{run_regional_analysis, VeldRegionalConfig, VeldRegionalReport};
pub use vehicle::{run_vehicle_analysis, VeldVehicleConfig, VeldVehicleReport};

use crate::stats::{levene, shapiro_wilk, VeldLeveneCenter};

/// File the headline test lines are appended to.
pub const RESULTS_FILE: &str = "task-3_results.txt";

/// Subdirectory of the docs dir that charts land in.
pub const PLOTS_DIR: &str = "plots";

/// Logs Shapiro-Wilk and Levene outcomes for the grouped samples.
///
/// Loss-ratio data fails normality almost by construction, so these are
/// advisory only; the caller proceeds with the planned test either way.
pub(crate) fn log_assumption_checks(label: &str, groups: &[(String, Vec<f64>)]) {
    for (level, values) in groups {
        match shapiro_wilk(values) {
            Ok(result) if result.p_value < 0.05 => log::warn!(
                "{}: '{}' departs from normality (W = {:.4}, p = {:.4})",
                label,
                level,
                result.statistic,
                result.p_value
            ),
            Ok(_) => {}
            Err(e) => log::debug!("{}: Shapiro-Wilk skipped for '{}': {}", label, level, e),
        }
    }

    let views: Vec<&[f64]> = groups.iter().map(|(_, v)| v.as_slice()).collect();
    match levene(&views, VeldLeveneCenter::Median) {
        Ok(result) if result.p_value < 0.05 => log::warn!(
            "{}: variances look unequal (Levene W = {:.4}, p = {:.4})",
            label,
            result.statistic,
            result.p_value
        ),
        Ok(_) => {}
        Err(e) => log::debug!("{}: Levene skipped: {}", label, e),
    }
}

/// Formats a float for a CSV cell the way the post-hoc tables expect.
pub(crate) fn csv_float(v: f64) -> String {
    format!("{:.4}", v)
}
