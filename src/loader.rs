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

//! # Claims Loader
//!
//! One entry point turning the raw pipe-delimited extract into an
//! analysis-ready frame. The pipeline is fixed:
//!
//! 1. read the raw file with type inference ([`crate::ingest`])
//! 2. drop the target-leaking columns
//! 3. impute missing numerics (claims to zero, the rest per strategy)
//! 4. normalize `CoverCategory` into `CleanCoverCategory`
//! 5. derive `LossRatio` = claims / premium * 100 (zero-premium rows
//!    become null, never infinite)
//! 6. optionally persist a cleaned CSV copy next to the docs
//!
//! [`VeldLoader::load_analysis`] additionally projects onto the analysis
//! feature subset, drops incomplete rows and trims IQR outliers.

use std::path::{Path, PathBuf};

use crate::clean::{
    drop_leaky_columns, impute_missing, remove_outliers_iqr, VeldCategoryCleaner,
    VeldImputeStrategy, CLAIMS_COLUMN,
};
use crate::errors::Result;
use crate::frame::VeldFrame;
use crate::ingest::{VeldReaderConfig, VeldTableReader};
use crate::report::write_frame_csv;

/// Premium column the loss ratio divides by.
pub const PREMIUM_COLUMN: &str = "TotalPremium";

/// Derived loss-ratio column, in percent.
pub const LOSS_RATIO_COLUMN: &str = "LossRatio";

/// Raw free-text cover-category column.
pub const COVER_CATEGORY_COLUMN: &str = "CoverCategory";

/// Normalized cover-category column added by the loader.
pub const CLEAN_COVER_CATEGORY_COLUMN: &str = "CleanCoverCategory";

/// Feature subset every analysis works on.
pub const ANALYSIS_COLUMNS: [&str; 9] = [
    CLAIMS_COLUMN,
    LOSS_RATIO_COLUMN,
    "CalculatedPremiumPerTerm",
    "SumInsured",
    "Province",
    "Gender",
    "VehicleType",
    CLEAN_COVER_CATEGORY_COLUMN,
    COVER_CATEGORY_COLUMN,
];

/// Configuration of the load pipeline.
#[derive(Clone, Debug)]
pub struct VeldLoaderConfig {
    /// Missing-value strategy for numeric columns other than claims.
    pub impute: VeldImputeStrategy,
    /// IQR fence multiplier used by [`VeldLoader::load_analysis`].
    pub iqr_factor: f64,
    /// Whether `load_analysis` trims IQR outliers at all.
    pub trim_outliers: bool,
    /// When set, the cleaned full frame is persisted here as CSV.
    pub cleaned_copy: Option<PathBuf>,
    /// Raw reader settings (delimiter override, bad-row tolerance).
    pub reader: VeldReaderConfig,
}

impl Default for VeldLoaderConfig {
    fn default() -> Self {
        Self {
            impute: VeldImputeStrategy::Mean,
            iqr_factor: 1.5,
            trim_outliers: true,
            cleaned_copy: None,
            reader: VeldReaderConfig::default(),
        }
    }
}

/// Loads and cleans the raw claims extract.
#[derive(Debug, Default)]
pub struct VeldLoader {
    config: VeldLoaderConfig,
}

impl VeldLoader {
    /// Creates a loader with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the loader configuration.
    pub fn with_config(mut self, config: VeldLoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the full cleaning pipeline on the raw file at `path` and
    /// returns the cleaned frame with every surviving column.
    pub fn load(&self, path: &Path) -> Result<VeldFrame> {
        let reader = VeldTableReader::new().with_config(self.config.reader.clone());
        let mut frame = reader.read_path(path)?;

        drop_leaky_columns(&mut frame);
        impute_missing(&mut frame, self.config.impute)?;

        if frame.contains_column(COVER_CATEGORY_COLUMN) {
            VeldCategoryCleaner::new().normalize_column(
                &mut frame,
                COVER_CATEGORY_COLUMN,
                CLEAN_COVER_CATEGORY_COLUMN,
            )?;
        }
        derive_loss_ratio(&mut frame)?;

        if let Some(copy) = &self.config.cleaned_copy {
            write_frame_csv(&frame, copy)?;
        }
        Ok(frame)
    }

    /// Loads, then projects onto the analysis subset via
    /// [`VeldLoader::analysis_frame`].
    pub fn load_analysis(&self, path: &Path) -> Result<VeldFrame> {
        let frame = self.load(path)?;
        self.analysis_frame(&frame)
    }

    /// Projects a cleaned frame onto [`ANALYSIS_COLUMNS`] (those present),
    /// drops incomplete rows and trims IQR outliers on the numeric
    /// features.
    pub fn analysis_frame(&self, frame: &VeldFrame) -> Result<VeldFrame> {
        let present: Vec<&str> = ANALYSIS_COLUMNS
            .iter()
            .copied()
            .filter(|name| frame.contains_column(name))
            .collect();
        let mut subset = frame.select(&present)?;
        subset.drop_null_rows(&present)?;

        if self.config.trim_outliers {
            let numeric: Vec<&str> = present
                .iter()
                .copied()
                .filter(|name| subset.numeric(name).is_ok())
                .collect();
            remove_outliers_iqr(&mut subset, &numeric, self.config.iqr_factor)?;
        }
        log::info!(
            "analysis frame: {} rows x {} columns",
            subset.n_rows(),
            subset.n_columns()
        );
        Ok(subset)
    }
}

/// Adds the `LossRatio` column, claims over premium in percent.
///
/// A zero or missing premium yields a null ratio; the raw extract holds
/// plenty of zero-premium rows and an infinite ratio would poison every
/// downstream mean.
pub fn derive_loss_ratio(frame: &mut VeldFrame) -> Result<()> {
    let claims = frame.numeric(CLAIMS_COLUMN)?;
    let premiums = frame.numeric(PREMIUM_COLUMN)?;
    let ratios: Vec<Option<f64>> = claims
        .iter()
        .zip(premiums)
        .map(|(claim, premium)| match (claim, premium) {
            (Some(c), Some(p)) => {
                let ratio = c / p * 100.0;
                ratio.is_finite().then_some(ratio)
            }
            _ => None,
        })
        .collect();
    frame.insert_numeric(LOSS_RATIO_COLUMN, ratios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_extract(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn sample_extract() -> tempfile::NamedTempFile {
        write_extract(&[
            "Province|Gender|VehicleType|CoverCategory|TotalPremium|TotalClaims|CalculatedPremiumPerTerm|SumInsured|CrossBorder",
            "Gauteng|Male|SUV|ownDamage|100|50|10|5000|No",
            "Limpopo|Female|Truck|windscreen|200||20|6000|No",
            "Gauteng|Male|SUV|ownDamage|0|10|12|5500|Yes",
            "Mpumalanga|Female|SUV|keys and alarms|150|30|15|5200|No",
        ])
    }

    #[test]
    fn load_derives_ratio_and_cleans_categories() {
        let file = sample_extract();
        let frame = VeldLoader::new().load(file.path()).unwrap();

        assert!(!frame.contains_column("CrossBorder"));
        let ratios = frame.numeric(LOSS_RATIO_COLUMN).unwrap();
        assert_eq!(ratios[0], Some(50.0));
        // Missing claims imputed to zero, so the ratio is 0, not null.
        assert_eq!(ratios[1], Some(0.0));
        // Zero premium never produces an infinite ratio.
        assert_eq!(ratios[2], None);

        let clean = frame.text(CLEAN_COVER_CATEGORY_COLUMN).unwrap();
        assert_eq!(clean[0].as_deref(), Some("Own Damage"));
        assert_eq!(clean[3].as_deref(), Some("Keys And Alarms"));
    }

    #[test]
    fn load_analysis_projects_and_drops_incomplete_rows() {
        let file = sample_extract();
        let config = VeldLoaderConfig {
            trim_outliers: false,
            ..VeldLoaderConfig::default()
        };
        let frame = VeldLoader::new()
            .with_config(config)
            .load_analysis(file.path())
            .unwrap();

        // The zero-premium row has a null ratio and is dropped.
        assert_eq!(frame.n_rows(), 3);
        assert!(frame.contains_column(LOSS_RATIO_COLUMN));
        assert!(!frame.contains_column(PREMIUM_COLUMN));
    }

    #[test]
    fn cleaned_copy_is_persisted() {
        let file = sample_extract();
        let dir = tempfile::tempdir().unwrap();
        let copy = dir.path().join("processed").join("cleaned.csv");
        let config = VeldLoaderConfig {
            cleaned_copy: Some(copy.clone()),
            ..VeldLoaderConfig::default()
        };
        VeldLoader::new()
            .with_config(config)
            .load(file.path())
            .unwrap();
        let content = std::fs::read_to_string(copy).unwrap();
        assert!(content.lines().next().unwrap().contains("LossRatio"));
        assert_eq!(content.lines().count(), 5);
    }
}
