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

//! # Table Format Detection
//!
//! Detects the delimiter of a raw tabular file. Raw claims extracts arrive
//! pipe-delimited with a `.txt` extension, so extension alone is not enough;
//! detection falls back to sniffing the first line and counting candidate
//! delimiters.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VeldError};

/// Recognised tabular layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeldTableFormat {
    /// Pipe-delimited (`|`), the raw claims extract layout.
    Pipe,
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
}

impl VeldTableFormat {
    /// The delimiter byte for this format.
    pub fn delimiter(self) -> u8 {
        match self {
            VeldTableFormat::Pipe => b'|',
            VeldTableFormat::Csv => b',',
            VeldTableFormat::Tsv => b'\t',
        }
    }
}

/// Detects the table format of a file from its extension, falling back to
/// sniffing the header line.
#[derive(Debug, Default)]
pub struct VeldFormatDetector;

impl VeldFormatDetector {
    /// Creates a new detector.
    pub fn new() -> Self {
        Self
    }

    /// Detects the format of the file at `path`.
    pub fn detect_from_path(&self, path: &Path) -> Result<VeldTableFormat> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => return Ok(VeldTableFormat::Csv),
            Some("tsv") => return Ok(VeldTableFormat::Tsv),
            _ => {}
        }

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut first_line = String::new();
        reader.read_line(&mut first_line)?;
        self.detect_from_line(&first_line, path)
    }

    fn detect_from_line(&self, line: &str, path: &Path) -> Result<VeldTableFormat> {
        let candidates = [
            (VeldTableFormat::Pipe, line.matches('|').count()),
            (VeldTableFormat::Tsv, line.matches('\t').count()),
            (VeldTableFormat::Csv, line.matches(',').count()),
        ];
        candidates
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .max_by_key(|(_, count)| *count)
            .map(|(format, _)| format)
            .ok_or_else(|| {
                VeldError::validation(format!(
                    "could not detect a delimiter in {}",
                    path.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extension_wins_for_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a|b|c").unwrap();
        let detector = VeldFormatDetector::new();
        assert_eq!(
            detector.detect_from_path(file.path()).unwrap(),
            VeldTableFormat::Csv
        );
    }

    #[test]
    fn txt_extract_is_sniffed_as_pipe() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "PolicyID|Province|TotalPremium|TotalClaims").unwrap();
        let detector = VeldFormatDetector::new();
        assert_eq!(
            detector.detect_from_path(file.path()).unwrap(),
            VeldTableFormat::Pipe
        );
    }

    #[test]
    fn undetectable_header_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "justoneword").unwrap();
        let detector = VeldFormatDetector::new();
        assert!(detector.detect_from_path(file.path()).is_err());
    }
}
