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

//! # Chart Rendering
//!
//! Renders grouped distributions to PNG: box, violin (Gaussian-KDE
//! silhouette, widths normalized per group), bar (mean with a +-1 sd
//! whisker) and line (group means). A hue-split bar variant backs the
//! two-way ANOVA plot. Everything draws through the plotters bitmap
//! backend.

use std::path::Path;

use plotters::prelude::*;

use crate::errors::{Result, VeldError};
use crate::report::{VeldPlotConfig, VeldPlotKind};
use crate::stats::descriptive::{mean, quantile, sample_std};

/// Renders one chart of `groups` to `path` according to `kind`.
pub fn render_group_plot(
    groups: &[(String, Vec<f64>)],
    kind: VeldPlotKind,
    config: &VeldPlotConfig,
    path: &Path,
) -> Result<()> {
    if groups.is_empty() || groups.iter().all(|(_, v)| v.is_empty()) {
        return Err(VeldError::plot("nothing to plot"));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match kind {
        VeldPlotKind::Box => render_box(groups, config, path),
        VeldPlotKind::Violin => render_violin(groups, config, path),
        VeldPlotKind::Bar => render_bar(groups, config, path),
        VeldPlotKind::Line => render_line(groups, config, path),
    }?;
    log::info!("rendered {:?} plot to {}", kind, path.display());
    Ok(())
}

fn render_box(
    groups: &[(String, Vec<f64>)],
    config: &VeldPlotConfig,
    path: &Path,
) -> Result<()> {
    let labels: Vec<String> = groups.iter().map(|(n, _)| n.clone()).collect();
    let quartiles: Vec<Quartiles> = groups
        .iter()
        .map(|(_, v)| {
            let v32: Vec<f32> = v.iter().map(|x| *x as f32).collect();
            Quartiles::new(&v32)
        })
        .collect();
    let (y_min, y_max) = pad_range(
        quartiles
            .iter()
            .flat_map(|q| q.values().to_vec())
            .map(f64::from),
    );

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(to_plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(labels[..].into_segmented(), y_min as f32..y_max as f32)
        .map_err(to_plot_err)?;
    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .draw()
        .map_err(to_plot_err)?;

    chart
        .draw_series(labels.iter().zip(&quartiles).map(|(label, q)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(label), q)
                .width(20)
                .style(BLUE.filled())
        }))
        .map_err(to_plot_err)?;
    root.present().map_err(to_plot_err)?;
    Ok(())
}

fn render_violin(
    groups: &[(String, Vec<f64>)],
    config: &VeldPlotConfig,
    path: &Path,
) -> Result<()> {
    let silhouettes: Vec<Vec<(f64, f64)>> = groups
        .iter()
        .map(|(_, v)| kde_silhouette(v, 80))
        .collect();
    let (y_min, y_max) = pad_range(
        silhouettes
            .iter()
            .flat_map(|s| s.iter().map(|(y, _)| *y)),
    );
    let n = groups.len() as f64;

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(to_plot_err)?;
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.6..(n - 0.4), y_min..y_max)
        .map_err(to_plot_err)?;
    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .x_labels(groups.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx < 0.0 || (x - idx).abs() > 0.25 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(to_plot_err)?;

    for (i, ((_, values), silhouette)) in groups.iter().zip(&silhouettes).enumerate() {
        let center = i as f64;
        let peak = silhouette
            .iter()
            .map(|(_, d)| *d)
            .fold(f64::MIN, f64::max)
            .max(f64::MIN_POSITIVE);
        // "scale width": every violin gets the same maximum half-width.
        let scale = 0.4 / peak;
        let mut polygon: Vec<(f64, f64)> = silhouette
            .iter()
            .map(|(y, d)| (center + d * scale, *y))
            .collect();
        polygon.extend(silhouette.iter().rev().map(|(y, d)| (center - d * scale, *y)));
        let color = Palette99::pick(i);
        chart
            .draw_series(std::iter::once(Polygon::new(
                polygon,
                color.mix(0.35).filled(),
            )))
            .map_err(to_plot_err)?;

        // Inner quartile bar, like the seaborn inner="box" default.
        if let (Some(q1), Some(q3)) = (quantile(values, 0.25), quantile(values, 0.75)) {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(center, q1), (center, q3)],
                    BLACK.stroke_width(3),
                )))
                .map_err(to_plot_err)?;
        }
    }
    root.present().map_err(to_plot_err)?;
    Ok(())
}

fn render_bar(
    groups: &[(String, Vec<f64>)],
    config: &VeldPlotConfig,
    path: &Path,
) -> Result<()> {
    let stats: Vec<(f64, f64)> = groups
        .iter()
        .map(|(_, v)| (mean(v).unwrap_or(0.0), sample_std(v).unwrap_or(0.0)))
        .collect();
    let (y_min, y_max) = pad_range(
        stats
            .iter()
            .flat_map(|(m, s)| [m - s, m + s, 0.0])
    );
    let n = groups.len() as f64;
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(to_plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.6..(n - 0.4), y_min..y_max)
        .map_err(to_plot_err)?;
    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .x_labels(groups.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx < 0.0 || (x - idx).abs() > 0.25 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(to_plot_err)?;

    for (i, (m, s)) in stats.iter().enumerate() {
        let x = i as f64;
        let color = Palette99::pick(i);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.35, 0.0), (x + 0.35, *m)],
                color.filled(),
            )))
            .map_err(to_plot_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x, m - s), (x, m + s)],
                BLACK.stroke_width(2),
            )))
            .map_err(to_plot_err)?;
    }
    root.present().map_err(to_plot_err)?;
    Ok(())
}

fn render_line(
    groups: &[(String, Vec<f64>)],
    config: &VeldPlotConfig,
    path: &Path,
) -> Result<()> {
    let means: Vec<f64> = groups
        .iter()
        .map(|(_, v)| mean(v).unwrap_or(0.0))
        .collect();
    let (y_min, y_max) = pad_range(means.iter().copied());
    let n = groups.len() as f64;
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(to_plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.6..(n - 0.4), y_min..y_max)
        .map_err(to_plot_err)?;
    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .x_labels(groups.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx < 0.0 || (x - idx).abs() > 0.25 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(to_plot_err)?;

    let points: Vec<(f64, f64)> = means.iter().enumerate().map(|(i, m)| (i as f64, *m)).collect();
    chart
        .draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(2)))
        .map_err(to_plot_err)?;
    chart
        .draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())))
        .map_err(to_plot_err)?;
    root.present().map_err(to_plot_err)?;
    Ok(())
}

/// Renders a hue-split bar chart of cell means: one bar cluster per
/// category, one bar per hue level, used by the two-way ANOVA analysis.
/// `cells` holds (category, hue, observations).
pub fn render_hue_bar(
    cells: &[(String, String, Vec<f64>)],
    config: &VeldPlotConfig,
    path: &Path,
) -> Result<()> {
    if cells.is_empty() {
        return Err(VeldError::plot("nothing to plot"));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut categories: Vec<&str> = Vec::new();
    let mut hues: Vec<&str> = Vec::new();
    for (cat, hue, _) in cells {
        if !categories.contains(&cat.as_str()) {
            categories.push(cat);
        }
        if !hues.contains(&hue.as_str()) {
            hues.push(hue);
        }
    }
    let labels: Vec<String> = categories.iter().map(|c| (*c).to_string()).collect();

    let stats: Vec<(usize, usize, f64, f64)> = cells
        .iter()
        .map(|(cat, hue, v)| {
            let ci = categories.iter().position(|c| c == cat).unwrap_or(0);
            let hi = hues.iter().position(|h| h == hue).unwrap_or(0);
            (ci, hi, mean(v).unwrap_or(0.0), sample_std(v).unwrap_or(0.0))
        })
        .collect();
    let (y_min, y_max) = pad_range(
        stats
            .iter()
            .flat_map(|(_, _, m, s)| [m - s, m + s, 0.0]),
    );
    let n = categories.len() as f64;

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(to_plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.6..(n - 0.4), y_min..y_max)
        .map_err(to_plot_err)?;
    chart
        .configure_mesh()
        .x_desc(&config.x_label)
        .y_desc(&config.y_label)
        .x_labels(categories.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx < 0.0 || (x - idx).abs() > 0.25 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(to_plot_err)?;

    let width = 0.8 / hues.len() as f64;
    for (hi, hue) in hues.iter().enumerate() {
        let color = Palette99::pick(hi);
        let bars: Vec<(f64, f64, f64)> = stats
            .iter()
            .filter(|(_, h, _, _)| *h == hi)
            .map(|(ci, _, m, s)| (*ci as f64 - 0.4 + hi as f64 * width, *m, *s))
            .collect();
        chart
            .draw_series(bars.iter().map(|(x0, m, _)| {
                Rectangle::new([(*x0, 0.0), (*x0 + width, *m)], color.filled())
            }))
            .map_err(to_plot_err)?
            .label(*hue)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], Palette99::pick(hi).filled())
            });
        chart
            .draw_series(bars.iter().map(|(x0, m, s)| {
                PathElement::new(
                    vec![(*x0 + width / 2.0, m - s), (*x0 + width / 2.0, m + s)],
                    BLACK.stroke_width(1),
                )
            }))
            .map_err(to_plot_err)?;
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(to_plot_err)?;
    root.present().map_err(to_plot_err)?;
    log::info!("rendered hue bar plot to {}", path.display());
    Ok(())
}

/// Gaussian KDE evaluated over a regular grid, Silverman bandwidth.
/// Returns (value, density) pairs.
fn kde_silhouette(values: &[f64], grid: usize) -> Vec<(f64, f64)> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let std = sample_std(values).unwrap_or(0.0);
    let iqr = match (quantile(values, 0.75), quantile(values, 0.25)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let spread = if iqr > 0.0 {
        std.min(iqr / 1.34)
    } else {
        std
    };
    let bandwidth = if spread > 0.0 {
        0.9 * spread * n.powf(-0.2)
    } else {
        // Degenerate sample; draw a thin sliver rather than nothing.
        1e-3_f64.max(values[0].abs() * 1e-3)
    };

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = (min - 3.0 * bandwidth, max + 3.0 * bandwidth);
    let step = (hi - lo) / (grid.max(2) - 1) as f64;

    (0..grid.max(2))
        .map(|i| {
            let y = lo + i as f64 * step;
            let density = values
                .iter()
                .map(|v| {
                    let z = (y - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
            (y, density)
        })
        .collect()
}

fn pad_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = (max - min).max(1e-9);
    (min - 0.05 * span, max + 0.05 * span)
}

fn to_plot_err<E: std::fmt::Display>(e: E) -> VeldError {
    VeldError::plot(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::VeldPlotConfig;

    fn groups() -> Vec<(String, Vec<f64>)> {
        vec![
            ("Gauteng".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 2.5]),
            ("Limpopo".to_string(), vec![2.0, 2.5, 3.5, 4.5, 6.0, 3.0]),
        ]
    }

    #[test]
    fn every_kind_renders_a_png() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [
            VeldPlotKind::Box,
            VeldPlotKind::Violin,
            VeldPlotKind::Bar,
            VeldPlotKind::Line,
        ] {
            let path = dir.path().join(format!("{:?}.png", kind));
            render_group_plot(&groups(), kind, &VeldPlotConfig::default(), &path).unwrap();
            assert!(path.metadata().unwrap().len() > 0);
        }
    }

    #[test]
    fn hue_bar_renders_cells() {
        let dir = tempfile::tempdir().unwrap();
        let cells = vec![
            ("Own Damage".to_string(), "SUV".to_string(), vec![1.0, 2.0]),
            ("Own Damage".to_string(), "Truck".to_string(), vec![2.0, 3.0]),
            ("Windscreen".to_string(), "SUV".to_string(), vec![0.5, 1.5]),
            ("Windscreen".to_string(), "Truck".to_string(), vec![1.5, 2.5]),
        ];
        let path = dir.path().join("hue.png");
        render_hue_bar(&cells, &VeldPlotConfig::default(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_groups_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let empty: Vec<(String, Vec<f64>)> = Vec::new();
        assert!(render_group_plot(
            &empty,
            VeldPlotKind::Box,
            &VeldPlotConfig::default(),
            &path
        )
        .is_err());
    }

    #[test]
    fn kde_integrates_to_roughly_one() {
        let values = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0];
        let silhouette = kde_silhouette(&values, 200);
        let step = silhouette[1].0 - silhouette[0].0;
        let mass: f64 = silhouette.iter().map(|(_, d)| d * step).sum();
        assert!((mass - 1.0).abs() < 0.05);
    }
}
