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

//! # Reporting
//!
//! Persists analysis artifacts: appended result lines and CSV tables via
//! [`VeldReportWriter`], and PNG charts through the optional `plot`
//! feature. Plot kinds and configuration are always available so analysis
//! configs stay feature-independent; only the rendering itself is gated.

#[cfg(feature = "plot")]
pub mod plot;
pub mod writer;

use serde::{Deserialize, Serialize};

#[cfg(feature = "plot")]
pub use plot::{render_group_plot, render_hue_bar};
pub use writer::{write_frame_csv, VeldReportWriter};

/// The chart shapes the analyses know how to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeldPlotKind {
    /// Quartile box with whiskers per group.
    Box,
    /// KDE silhouette per group with an inner quartile bar.
    Violin,
    /// Group mean with a one-standard-deviation whisker.
    Bar,
    /// Group means joined by a line.
    Line,
}

/// Size and labeling of a rendered chart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VeldPlotConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for VeldPlotConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
        }
    }
}

impl VeldPlotConfig {
    /// Sets the chart title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets both axis labels.
    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }
}
