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

//! # Result Writer
//!
//! Appends analysis outcomes to a docs directory: one-line test results go
//! to a shared append-only text file, tabular outcomes (Tukey tables,
//! pairwise t-tests) become CSV files. The docs directory is created on
//! first use.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::frame::VeldFrame;
use crate::stats::VeldTestResult;

/// Appends text and CSV results under a docs directory.
#[derive(Clone, Debug)]
pub struct VeldReportWriter {
    docs_dir: PathBuf,
}

impl VeldReportWriter {
    /// Creates a writer rooted at `docs_dir`. Nothing is touched on disk
    /// until the first write.
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
        }
    }

    /// The directory results land in.
    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Appends one formatted test-result line to `file_name`.
    pub fn append_result(&self, file_name: &str, result: &VeldTestResult) -> Result<PathBuf> {
        self.append_line(file_name, &result.to_result_line())
    }

    /// Appends a raw line to `file_name`, creating directory and file as
    /// needed.
    pub fn append_line(&self, file_name: &str, line: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.docs_dir)?;
        let path = self.docs_dir.join(file_name);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line)?;
        log::info!("appended result to {}", path.display());
        Ok(path)
    }

    /// Writes a CSV table to `file_name`, replacing any previous file.
    pub fn write_csv_table(
        &self,
        file_name: &str,
        header: &[&str],
        rows: &[Vec<String>],
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.docs_dir)?;
        let path = self.docs_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        log::info!("wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}

/// Persists a frame as a plain CSV file, nulls as empty cells. Used for
/// the cleaned-copy snapshot the loader drops next to the raw extract.
pub fn write_frame_csv(frame: &VeldFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(frame.column_names())?;

    let names = frame.column_names().to_vec();
    for row in 0..frame.n_rows() {
        let mut record: Vec<String> = Vec::with_capacity(names.len());
        for name in &names {
            let cell = match frame.column(name)? {
                crate::frame::VeldColumn::Numeric(v) => {
                    v[row].map(|x| format_number(x)).unwrap_or_default()
                }
                crate::frame::VeldColumn::Text(v) => v[row].clone().unwrap_or_default(),
            };
            record.push(cell);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    log::info!("persisted cleaned copy to {}", path.display());
    Ok(())
}

fn format_number(x: f64) -> String {
    if x == x.trunc() && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}
