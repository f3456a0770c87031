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

//! # Veld CLI
//!
//! Command-line front end over the library: one subcommand per analysis,
//! plus cleaning, profiling, model evaluation and an `all` runner. Every
//! command loads the raw extract through the same pipeline and writes its
//! findings under the docs directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use veld::analysis::{
    run_correlation_analysis, run_coverage_analysis, run_gender_analysis,
    run_regional_analysis, run_vehicle_analysis, VeldCorrelationConfig, VeldCoverageConfig,
    VeldGenderConfig, VeldRegionalConfig, VeldVehicleConfig,
};
use veld::eval::{build_design, evaluate_regression, VeldLinearRegression};
use veld::loader::{VeldLoader, VeldLoaderConfig, LOSS_RATIO_COLUMN};
use veld::report::{write_frame_csv, VeldReportWriter};
use veld::stats::VeldFrameSummary;
use veld::VeldFrame;

#[derive(Parser)]
#[command(
    name = "veld",
    version,
    about = "Exploratory analysis and hypothesis testing for insurance-claims portfolios"
)]
struct Cli {
    /// Raw pipe-delimited claims extract.
    #[arg(short, long, global = true, default_value = "data/claims.txt")]
    input: PathBuf,

    /// Directory results, tables and charts are written to.
    #[arg(short, long, global = true, default_value = "docs")]
    docs: PathBuf,

    /// Skip chart rendering even when the plot feature is compiled in.
    #[arg(long, global = true)]
    no_plots: bool,

    /// Keep IQR outliers in the analysis frame.
    #[arg(long, global = true)]
    keep_outliers: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the raw extract and write the cleaned CSV copy.
    Clean {
        /// Output path of the cleaned copy.
        #[arg(short, long, default_value = "data/claims_cleaned.csv")]
        output: PathBuf,
    },
    /// Print per-column summaries of the analysis frame as JSON.
    Profile,
    /// Loss ratio by province: one-way ANOVA with Tukey post-hoc.
    Regional {
        #[arg(long, default_value_t = 30)]
        min_group_size: usize,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// Loss ratio by cover category, alone and crossed with vehicle type.
    Coverage {
        #[arg(long, default_value_t = 30)]
        min_group_size: usize,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// Claim severity by gender: Welch t-test.
    Gender {
        #[arg(long, default_value_t = 30)]
        min_group_size: usize,
    },
    /// Claims by vehicle type: ANOVA plus pairwise t-tests.
    Vehicle {
        #[arg(long, default_value_t = 100)]
        min_count: usize,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
    },
    /// Pearson correlations of the numeric features.
    Corr,
    /// Fit and score the regression baseline on a held-out split.
    Eval {
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Run every analysis and the evaluation in sequence.
    All,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let loader = VeldLoader::new().with_config(VeldLoaderConfig {
        trim_outliers: !cli.keep_outliers,
        ..VeldLoaderConfig::default()
    });
    let writer = VeldReportWriter::new(&cli.docs);

    match &cli.command {
        Command::Clean { output } => {
            let frame = loader
                .load(&cli.input)
                .with_context(|| format!("loading {}", cli.input.display()))?;
            write_frame_csv(&frame, output)?;
            println!(
                "cleaned {} rows x {} columns into {}",
                frame.n_rows(),
                frame.n_columns(),
                output.display()
            );
        }
        Command::Profile => {
            let frame = load_analysis(&loader, &cli)?;
            let summary = VeldFrameSummary::compute(&frame);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Regional {
            min_group_size,
            alpha,
        } => {
            let frame = load_analysis(&loader, &cli)?;
            let config = VeldRegionalConfig {
                min_group_size: *min_group_size,
                alpha: *alpha,
                render_plots: !cli.no_plots,
                ..VeldRegionalConfig::default()
            };
            let report = run_regional_analysis(&frame, &config, &writer)?;
            println!("{}", report.anova.to_result_line());
        }
        Command::Coverage {
            min_group_size,
            alpha,
        } => {
            let frame = load_analysis(&loader, &cli)?;
            let config = VeldCoverageConfig {
                min_group_size: *min_group_size,
                alpha: *alpha,
                render_plots: !cli.no_plots,
                ..VeldCoverageConfig::default()
            };
            let report = run_coverage_analysis(&frame, &config, &writer)?;
            println!("{}", report.anova.to_result_line());
        }
        Command::Gender { min_group_size } => {
            let frame = load_analysis(&loader, &cli)?;
            let config = VeldGenderConfig {
                min_group_size: *min_group_size,
                render_plots: !cli.no_plots,
                ..VeldGenderConfig::default()
            };
            let report = run_gender_analysis(&frame, &config, &writer)?;
            println!("{}", report.result.to_result_line());
        }
        Command::Vehicle { min_count, alpha } => {
            let frame = load_analysis(&loader, &cli)?;
            let config = VeldVehicleConfig {
                min_count: *min_count,
                alpha: *alpha,
                render_plots: !cli.no_plots,
                ..VeldVehicleConfig::default()
            };
            let report = run_vehicle_analysis(&frame, &config, &writer)?;
            println!("{}", report.anova.to_result_line());
        }
        Command::Corr => {
            // The analysis projection drops TotalPremium; correlate on the
            // full cleaned frame instead.
            let frame = load_full(&loader, &cli)?;
            let config = VeldCorrelationConfig::default();
            let report = run_correlation_analysis(&frame, &config, &writer)?;
            for (name, result) in &report.against_target {
                println!(
                    "{} ~ {}: r = {:.4}, p = {:.4}",
                    name, config.target_column, result.correlation, result.p_value
                );
            }
        }
        Command::Eval { test_size, seed } => {
            let frame = load_analysis(&loader, &cli)?;
            run_eval(&frame, *test_size, *seed, &writer)?;
        }
        Command::All => {
            let full = load_full(&loader, &cli)?;
            let frame = loader.analysis_frame(&full)?;
            let render_plots = !cli.no_plots;
            let report = run_regional_analysis(
                &frame,
                &VeldRegionalConfig {
                    render_plots,
                    ..VeldRegionalConfig::default()
                },
                &writer,
            )?;
            println!("{}", report.anova.to_result_line());
            let report = run_coverage_analysis(
                &frame,
                &VeldCoverageConfig {
                    render_plots,
                    ..VeldCoverageConfig::default()
                },
                &writer,
            )?;
            println!("{}", report.anova.to_result_line());
            let report = run_gender_analysis(
                &frame,
                &VeldGenderConfig {
                    render_plots,
                    ..VeldGenderConfig::default()
                },
                &writer,
            )?;
            println!("{}", report.result.to_result_line());
            let report = run_vehicle_analysis(
                &frame,
                &VeldVehicleConfig {
                    render_plots,
                    ..VeldVehicleConfig::default()
                },
                &writer,
            )?;
            println!("{}", report.anova.to_result_line());
            run_correlation_analysis(&full, &VeldCorrelationConfig::default(), &writer)?;
            run_eval(&frame, 0.2, 42, &writer)?;
        }
    }
    Ok(())
}

fn load_analysis(loader: &VeldLoader, cli: &Cli) -> anyhow::Result<VeldFrame> {
    loader
        .load_analysis(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))
}

fn load_full(loader: &VeldLoader, cli: &Cli) -> anyhow::Result<VeldFrame> {
    loader
        .load(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))
}

fn run_eval(
    frame: &VeldFrame,
    test_size: f64,
    seed: u64,
    writer: &VeldReportWriter,
) -> anyhow::Result<()> {
    let design = build_design(frame, LOSS_RATIO_COLUMN)?;
    let mut model = VeldLinearRegression::new();
    let metrics = evaluate_regression(&mut model, &design, test_size, seed, writer)?;
    println!("{}", metrics.to_result_line("Linear Regression"));
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
