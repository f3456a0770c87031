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

//! End-to-end flow over a synthetic claims extract: load and clean the raw
//! file, run every analysis, evaluate the regression baseline, and check
//! the docs artifacts they leave behind.

use std::io::Write;
use std::path::PathBuf;

use veld::analysis::{
    correlation::CORRELATION_MATRIX_FILE, regional::TUKEY_PROVINCE_FILE,
    vehicle::TTEST_VEHICLE_FILE, run_correlation_analysis, run_coverage_analysis,
    run_gender_analysis, run_regional_analysis, run_vehicle_analysis, VeldCorrelationConfig,
    VeldCoverageConfig, VeldGenderConfig, VeldRegionalConfig, VeldVehicleConfig, RESULTS_FILE,
};
use veld::eval::{build_design, evaluate_regression, VeldLinearRegression, EVAL_RESULTS_FILE};
use veld::loader::{VeldLoader, VeldLoaderConfig, LOSS_RATIO_COLUMN};
use veld::report::VeldReportWriter;

/// Writes a pipe-delimited extract with three provinces, two genders, two
/// vehicle types and two cover categories, with systematic differences
/// baked into every segment.
fn synthetic_extract(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("claims.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "UnderwrittenCoverID|Province|Gender|VehicleType|CoverCategory|TotalPremium|TotalClaims|CalculatedPremiumPerTerm|SumInsured|CrossBorder"
    )
    .unwrap();

    let provinces = ["Gauteng", "Limpopo", "Mpumalanga"];
    let genders = ["Male", "Female"];
    let vehicles = ["SUV", "Truck"];
    let covers = ["ownDamage", "windscreen"];
    let noise = [3.0, -2.0, 1.5, -1.0, 2.5, -3.0, 0.5, -0.5];

    let mut id = 0;
    for (pi, province) in provinces.iter().enumerate() {
        for (gi, gender) in genders.iter().enumerate() {
            for (vi, vehicle) in vehicles.iter().enumerate() {
                for (ci, cover) in covers.iter().enumerate() {
                    for eps in &noise {
                        id += 1;
                        let premium = 100.0;
                        let claims = 30.0
                            + pi as f64 * 25.0
                            + gi as f64 * 10.0
                            + vi as f64 * 15.0
                            + ci as f64 * 8.0
                            + eps;
                        writeln!(
                            file,
                            "{}|{}|{}|{}|{}|{}|{:.2}|{:.2}|{}|No",
                            id,
                            province,
                            gender,
                            vehicle,
                            cover,
                            premium,
                            claims,
                            10.0 + claims / 10.0,
                            5000 + id
                        )
                        .unwrap();
                    }
                }
            }
        }
    }
    // A ragged row and a zero-premium row; both must be survivable.
    writeln!(file, "bad|row|with|too|few").unwrap();
    writeln!(file, "9999|Gauteng|Male|SUV|ownDamage|0|50|15|9000|No").unwrap();
    path
}

struct Flow {
    full: veld::VeldFrame,
    frame: veld::VeldFrame,
    writer: VeldReportWriter,
    docs: PathBuf,
    _dir: tempfile::TempDir,
}

fn run_loader() -> Flow {
    let dir = tempfile::tempdir().unwrap();
    let input = synthetic_extract(dir.path());
    let docs = dir.path().join("docs");
    let loader = VeldLoader::new().with_config(VeldLoaderConfig {
        trim_outliers: false,
        cleaned_copy: Some(dir.path().join("claims_cleaned.csv")),
        ..VeldLoaderConfig::default()
    });
    let full = loader.load(&input).unwrap();
    let frame = loader.analysis_frame(&full).unwrap();
    Flow {
        full,
        frame,
        writer: VeldReportWriter::new(&docs),
        docs,
        _dir: dir,
    }
}

#[test]
fn loader_produces_analysis_frame() {
    let flow = run_loader();
    // 3 * 2 * 2 * 2 * 8 clean rows; the ragged and zero-premium rows are gone.
    assert_eq!(flow.frame.n_rows(), 192);
    assert!(flow.frame.contains_column(LOSS_RATIO_COLUMN));
    assert!(flow.frame.contains_column("CleanCoverCategory"));
    assert!(!flow.frame.contains_column("CrossBorder"));

    let clean = flow.frame.text("CleanCoverCategory").unwrap();
    assert!(clean
        .iter()
        .flatten()
        .all(|c| c == "Own Damage" || c == "Windscreen"));
}

#[test]
fn analyses_append_results_and_tables() {
    let flow = run_loader();
    let no_plots = |mut c: VeldRegionalConfig| {
        c.render_plots = false;
        c
    };

    let regional = run_regional_analysis(
        &flow.frame,
        &no_plots(VeldRegionalConfig {
            min_group_size: 20,
            ..VeldRegionalConfig::default()
        }),
        &flow.writer,
    )
    .unwrap();
    assert!(regional.anova.p_value < 0.01);
    assert!(regional.tukey.is_some());

    let coverage = run_coverage_analysis(
        &flow.frame,
        &VeldCoverageConfig {
            min_group_size: 20,
            render_plots: false,
            ..VeldCoverageConfig::default()
        },
        &flow.writer,
    )
    .unwrap();
    assert!(coverage.two_way.is_some());

    let gender = run_gender_analysis(
        &flow.frame,
        &VeldGenderConfig {
            min_group_size: 20,
            render_plots: false,
            ..VeldGenderConfig::default()
        },
        &flow.writer,
    )
    .unwrap();
    assert!(gender.result.p_value < 0.05);

    let vehicle = run_vehicle_analysis(
        &flow.frame,
        &VeldVehicleConfig {
            min_count: 20,
            render_plots: false,
            ..VeldVehicleConfig::default()
        },
        &flow.writer,
    )
    .unwrap();
    assert_eq!(vehicle.pairwise.len(), 1);

    // Correlation runs on the full cleaned frame, where TotalPremium
    // still exists.
    run_correlation_analysis(&flow.full, &VeldCorrelationConfig::default(), &flow.writer)
        .unwrap();

    let results = std::fs::read_to_string(flow.docs.join(RESULTS_FILE)).unwrap();
    assert!(results.contains("ANOVA (Province): statistic = "));
    assert!(results.contains("T-test (Gender): statistic = "));
    assert!(results.contains("ANOVA (VehicleType): statistic = "));
    assert!(results.contains("Two-way ANOVA (CleanCoverCategory x VehicleType): "));
    assert!(results.contains("Pearson (TotalPremium ~ TotalClaims): statistic = "));
    assert!(results.contains("Pearson (LossRatio ~ TotalClaims): statistic = "));
    for line in results.lines() {
        assert!(line.contains(": statistic = "));
        assert!(line.contains(", p-value = "));
    }

    assert!(flow.docs.join(TUKEY_PROVINCE_FILE).exists());
    assert!(flow.docs.join(TTEST_VEHICLE_FILE).exists());
    assert!(flow.docs.join(CORRELATION_MATRIX_FILE).exists());
}

#[test]
fn regression_baseline_is_scored_and_logged() {
    let flow = run_loader();
    let design = build_design(&flow.frame, LOSS_RATIO_COLUMN).unwrap();
    assert!(design
        .feature_names
        .iter()
        .any(|name| name.starts_with("Province=")));

    let mut model = VeldLinearRegression::new();
    let metrics =
        evaluate_regression(&mut model, &design, 0.2, 42, &flow.writer).unwrap();
    // The synthetic ratio is a near-linear function of the features.
    assert!(metrics.r2 > 0.9);

    let content = std::fs::read_to_string(flow.docs.join(EVAL_RESULTS_FILE)).unwrap();
    assert!(content.starts_with("Linear Regression - RMSE: "));
    assert!(content.contains(", R²: "));
}

#[cfg(feature = "plot")]
#[test]
fn regional_analysis_renders_chart() {
    let flow = run_loader();
    run_regional_analysis(
        &flow.frame,
        &VeldRegionalConfig {
            min_group_size: 20,
            ..VeldRegionalConfig::default()
        },
        &flow.writer,
    )
    .unwrap();
    let chart = flow.docs.join("plots").join("loss_ratio_by_province.png");
    assert!(chart.exists());
    assert!(chart.metadata().unwrap().len() > 0);
}

#[cfg(feature = "plot")]
#[test]
fn gender_chart_honors_configured_kind() {
    use veld::report::VeldPlotKind;

    let flow = run_loader();
    run_gender_analysis(
        &flow.frame,
        &VeldGenderConfig {
            min_group_size: 20,
            plot_kind: VeldPlotKind::Violin,
            ..VeldGenderConfig::default()
        },
        &flow.writer,
    )
    .unwrap();
    let chart = flow.docs.join("plots").join("claims_by_gender.png");
    assert!(chart.exists());
    assert!(chart.metadata().unwrap().len() > 0);
}
