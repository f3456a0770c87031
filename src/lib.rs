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

//! # Veld Core Library
//!
//! Veld is an exploratory-analysis and hypothesis-testing toolkit for
//! insurance claims data. It ingests a raw pipe-delimited policy extract,
//! cleans it into an analysis frame, runs classical significance tests
//! over the risk segments and writes every finding into a docs directory.
//!
//! ## Module Overview
//!
//! The library is organized into the following major modules:
//!
//! - **frame**: Column-oriented nullable table all analyses operate on
//! - **ingest**: Delimited-file reading with format detection and type
//!   inference
//! - **clean**: Category normalization, imputation, leaky-column and
//!   IQR-outlier removal
//! - **loader**: The fixed raw-extract-to-analysis-frame pipeline,
//!   including the derived loss ratio
//! - **stats**: ANOVA (one- and two-way), Tukey HSD, t-tests, Pearson
//!   correlation and the Shapiro-Wilk / Levene assumption checks
//! - **analysis**: The five claims analyses (regional, gender, vehicle,
//!   coverage, correlation) gluing stats to reporting
//! - **report**: Result lines, CSV tables and optional PNG charts
//! - **eval**: One-hot design building, seeded splits and the OLS
//!   regression baseline with RMSE / R² scoring
//!
//! ## Feature Flags
//!
//! - `plot`: Enables PNG chart rendering through plotters (on by default)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use veld::analysis::{run_regional_analysis, VeldRegionalConfig};
//! use veld::loader::VeldLoader;
//! use veld::report::VeldReportWriter;
//!
//! # fn main() -> veld::Result<()> {
//! let frame = VeldLoader::new().load_analysis(Path::new("data/claims.txt"))?;
//! let writer = VeldReportWriter::new("docs");
//! let report = run_regional_analysis(&frame, &VeldRegionalConfig::default(), &writer)?;
//! println!("{}", report.anova.to_result_line());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, VeldError>` for explicit error
//! handling. Common error types include schema mismatches in the loaded
//! table, invalid test inputs and I/O failures while writing reports.

pub mod analysis;
pub mod clean;
pub mod errors;
pub mod eval;
pub mod frame;
pub mod ingest;
pub mod loader;
pub mod report;
pub mod stats;

pub use errors::{Result, VeldError};
pub use frame::{VeldColumn, VeldFrame};
pub use loader::{VeldLoader, VeldLoaderConfig};

pub use analysis::{
    run_correlation_analysis, run_coverage_analysis, run_gender_analysis,
    run_regional_analysis, run_vehicle_analysis, VeldCorrelationConfig, VeldCoverageConfig,
    VeldGenderConfig, VeldRegionalConfig, VeldVehicleConfig,
};
pub use clean::{VeldCategoryCleaner, VeldImputeStrategy};
pub use eval::{
    build_design, evaluate_regression, train_test_split, VeldEstimator, VeldLinearRegression,
    VeldRegressionMetrics,
};
pub use ingest::{VeldFormatDetector, VeldReaderConfig, VeldTableFormat, VeldTableReader};
pub use report::{VeldPlotConfig, VeldPlotKind, VeldReportWriter};
pub use stats::{
    levene, one_way_anova, pairwise_t_tests, pearson, shapiro_wilk, t_test, tukey_hsd,
    two_way_anova, VeldFrameSummary, VeldTestResult,
};
