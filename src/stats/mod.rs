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

//! # Veld Statistics Module
//!
//! Classical hypothesis tests over grouped claims data: one-way and
//! two-way ANOVA, Tukey HSD post-hoc, Welch/Student t-tests with Bonferroni
//! correction, Pearson correlation, and the Shapiro-Wilk / Levene
//! assumption checks. Descriptive helpers and the small OLS fit live here
//! too.

pub mod anova;
pub mod assumptions;
pub mod correlation;
pub mod descriptive;
pub mod ols;
pub mod ttest;
pub mod tukey;

use serde::{Deserialize, Serialize};

pub use anova::{one_way_anova, two_way_anova, VeldAnova, VeldAnovaTerm, VeldTwoWayAnova};
pub use assumptions::{levene, shapiro_wilk, VeldLevene, VeldLeveneCenter, VeldShapiroWilk};
pub use correlation::{pearson, VeldPearson};
pub use descriptive::{VeldFrameSummary, VeldNumericSummary, VeldTextSummary};
pub use ttest::{pairwise_t_tests, t_test, VeldPairwiseTTest, VeldTTest, VeldTTestKind};
pub use tukey::{tukey_hsd, VeldTukeyHsd, VeldTukeyPair};

/// A named test outcome, the unit every analysis appends to the results
/// file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldTestResult {
    /// Human-readable test label, e.g. `ANOVA (Province)`.
    pub test: String,
    pub statistic: f64,
    pub p_value: f64,
}

impl VeldTestResult {
    /// Creates a named result.
    pub fn new(test: impl Into<String>, statistic: f64, p_value: f64) -> Self {
        Self {
            test: test.into(),
            statistic,
            p_value,
        }
    }

    /// The one-line form appended to the results file.
    pub fn to_result_line(&self) -> String {
        format!(
            "{}: statistic = {:.4}, p-value = {:.4}",
            self.test, self.statistic, self.p_value
        )
    }
}
