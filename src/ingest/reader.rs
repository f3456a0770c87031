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

//! # Raw Table Reader
//!
//! Reads a delimited raw file into a [`VeldFrame`]. Malformed rows are
//! skipped with a warning up to a configurable limit, mirroring how the raw
//! claims extract is full of ragged lines. Column types are inferred after
//! the fact: a column is numeric when every non-empty cell parses as `f64`,
//! otherwise it stays text. Empty cells become nulls either way.
//!
//! Header names are sanitised on the way in: surrounding whitespace and a
//! trailing carriage return are stripped, so a raw `TotalClaims\r` header
//! (CRLF extract read with bare `\n` terminators) becomes `TotalClaims`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::{Result, VeldError};
use crate::frame::VeldFrame;
use crate::ingest::format::{VeldFormatDetector, VeldTableFormat};

/// Configuration for the raw table reader.
#[derive(Clone, Debug)]
pub struct VeldReaderConfig {
    /// Delimiter override; when `None` the format detector decides.
    pub format: Option<VeldTableFormat>,
    /// Skip malformed rows instead of failing on the first one.
    pub skip_errors: bool,
    /// Maximum number of malformed rows tolerated before giving up.
    pub max_errors: usize,
    /// Trim surrounding whitespace from every cell.
    pub trim_cells: bool,
}

impl Default for VeldReaderConfig {
    fn default() -> Self {
        Self {
            format: None,
            skip_errors: true,
            max_errors: 100,
            trim_cells: true,
        }
    }
}

/// Reader turning a raw delimited file into a typed [`VeldFrame`].
#[derive(Debug, Default)]
pub struct VeldTableReader {
    config: VeldReaderConfig,
    detector: VeldFormatDetector,
}

impl VeldTableReader {
    /// Creates a reader with default configuration.
    pub fn new() -> Self {
        Self {
            config: VeldReaderConfig::default(),
            detector: VeldFormatDetector::new(),
        }
    }

    /// Replaces the reader configuration.
    pub fn with_config(mut self, config: VeldReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads the file at `path` into a frame.
    pub fn read_path(&self, path: &Path) -> Result<VeldFrame> {
        let format = match self.config.format {
            Some(format) => format,
            None => self.detector.detect_from_path(path)?,
        };

        let file = File::open(path)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(format.delimiter())
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| VeldError::validation(format!("header error: {}", e)))?
            .iter()
            .map(sanitize_header)
            .collect();
        if headers.is_empty() {
            return Err(VeldError::validation(format!(
                "no header row in {}",
                path.display()
            )));
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut error_count = 0usize;

        for (idx, row) in csv_reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error_count += 1;
                    if !self.config.skip_errors || error_count > self.config.max_errors {
                        return Err(VeldError::validation(format!(
                            "too many bad rows ({}): last error at row {}: {}",
                            error_count, idx, e
                        )));
                    }
                    log::warn!("skipping bad row {}: {}", idx, e);
                    continue;
                }
            };
            if row.len() != headers.len() {
                error_count += 1;
                if !self.config.skip_errors || error_count > self.config.max_errors {
                    return Err(VeldError::validation(format!(
                        "too many bad rows ({}): row {} has {} fields, expected {}",
                        error_count,
                        idx,
                        row.len(),
                        headers.len()
                    )));
                }
                log::warn!(
                    "skipping row {}: {} fields, expected {}",
                    idx,
                    row.len(),
                    headers.len()
                );
                continue;
            }
            for (col, field) in row.iter().enumerate() {
                let field = if self.config.trim_cells {
                    field.trim()
                } else {
                    field
                };
                if field.is_empty() {
                    cells[col].push(None);
                } else {
                    cells[col].push(Some(field.to_string()));
                }
            }
        }

        let mut frame = VeldFrame::new();
        for (name, raw) in headers.into_iter().zip(cells) {
            if is_numeric_column(&raw) {
                let parsed = raw
                    .iter()
                    .map(|c| c.as_deref().map(|s| s.parse::<f64>().unwrap_or(f64::NAN)))
                    .map(|c| c.filter(|v| v.is_finite()))
                    .collect();
                frame.insert_numeric(name, parsed)?;
            } else {
                frame.insert_text(name, raw)?;
            }
        }

        log::info!(
            "read {} rows x {} columns from {} ({} bad rows skipped)",
            frame.n_rows(),
            frame.n_columns(),
            path.display(),
            error_count
        );
        Ok(frame)
    }
}

fn sanitize_header(raw: &str) -> String {
    raw.trim_end_matches('\r').trim().to_string()
}

fn is_numeric_column(cells: &[Option<String>]) -> bool {
    let mut saw_value = false;
    for cell in cells.iter().flatten() {
        if cell.parse::<f64>().is_err() {
            return false;
        }
        saw_value = true;
    }
    saw_value
}
