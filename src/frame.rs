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

//! # Veld Frame Module
//!
//! This module provides the core tabular data structure that flows through
//! Veld analyses. A [`VeldFrame`] is a column-oriented table with nullable
//! numeric and text columns; every cleaning step and statistical test in the
//! crate operates on one.
//!
//! ## Design Principles
//!
//! - **Nullable by default**: missing values are first-class (`Option`), so
//!   imputation and row dropping are explicit operations rather than schema
//!   constraints
//! - **Order-preserving**: columns keep their ingest order, which keeps
//!   persisted cleaned copies diffable against the raw file
//! - **Fail-loud accessors**: asking for a numeric view of a text column is
//!   a schema error, not a silent coercion
//!
//! ## Usage Example
//!
//! ```rust
//! use veld::frame::{VeldColumn, VeldFrame};
//!
//! let mut frame = VeldFrame::new();
//! frame
//!     .insert_numeric("TotalClaims", vec![Some(10.0), None, Some(4.5)])
//!     .unwrap();
//! frame
//!     .insert_text(
//!         "Province",
//!         vec![
//!             Some("Gauteng".into()),
//!             Some("Limpopo".into()),
//!             Some("Gauteng".into()),
//!         ],
//!     )
//!     .unwrap();
//!
//! assert_eq!(frame.n_rows(), 3);
//! let groups = frame.group_numeric("Province", "TotalClaims").unwrap();
//! assert_eq!(groups.len(), 2);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VeldError};

/// A single nullable column of a [`VeldFrame`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum VeldColumn {
    /// Floating point values; `None` marks a missing cell.
    Numeric(Vec<Option<f64>>),
    /// Free-text or categorical values; `None` marks a missing cell.
    Text(Vec<Option<String>>),
}

impl VeldColumn {
    /// Number of cells in the column, including missing ones.
    pub fn len(&self) -> usize {
        match self {
            VeldColumn::Numeric(v) => v.len(),
            VeldColumn::Text(v) => v.len(),
        }
    }

    /// Whether the column has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        match self {
            VeldColumn::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            VeldColumn::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    fn is_null_at(&self, row: usize) -> bool {
        match self {
            VeldColumn::Numeric(v) => v[row].is_none(),
            VeldColumn::Text(v) => v[row].is_none(),
        }
    }
}

/// Column-oriented table used by every Veld analysis.
///
/// Columns are stored in ingest order. All columns always have the same
/// length; the length-changing operations (`retain_rows`, `drop_null_rows`)
/// apply to every column at once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VeldFrame {
    names: Vec<String>,
    columns: HashMap<String, VeldColumn>,
}

impl VeldFrame {
    /// Creates an empty frame with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows. An empty frame has zero rows.
    pub fn n_rows(&self) -> usize {
        self.names
            .first()
            .and_then(|n| self.columns.get(n))
            .map_or(0, VeldColumn::len)
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Column names in ingest order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column with the given name exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Borrows a column by name.
    pub fn column(&self, name: &str) -> Result<&VeldColumn> {
        self.columns
            .get(name)
            .ok_or_else(|| VeldError::schema(format!("column '{}' not found", name)))
    }

    /// Borrows a numeric column view, or fails with a schema error.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            VeldColumn::Numeric(v) => Ok(v),
            VeldColumn::Text(_) => Err(VeldError::schema(format!(
                "column '{}' is text, expected numeric",
                name
            ))),
        }
    }

    /// Borrows a text column view, or fails with a schema error.
    pub fn text(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            VeldColumn::Text(v) => Ok(v),
            VeldColumn::Numeric(_) => Err(VeldError::schema(format!(
                "column '{}' is numeric, expected text",
                name
            ))),
        }
    }

    /// Non-null values of a numeric column.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.numeric(name)?.iter().flatten().copied().collect())
    }

    /// Inserts or replaces a column. Length must match the frame unless the
    /// frame is still empty.
    pub fn insert_column(&mut self, name: impl Into<String>, column: VeldColumn) -> Result<()> {
        let name = name.into();
        if !self.names.is_empty() && column.len() != self.n_rows() {
            return Err(VeldError::validation(format!(
                "column '{}' has {} rows, frame has {}",
                name,
                column.len(),
                self.n_rows()
            )));
        }
        if !self.columns.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Inserts or replaces a numeric column.
    pub fn insert_numeric(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<()> {
        self.insert_column(name, VeldColumn::Numeric(values))
    }

    /// Inserts or replaces a text column.
    pub fn insert_text(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Result<()> {
        self.insert_column(name, VeldColumn::Text(values))
    }

    /// Removes the named columns. Missing names are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        for name in names {
            if self.columns.remove(*name).is_some() {
                self.names.retain(|n| n != name);
            }
        }
    }

    /// Keeps only the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.n_rows() {
            return Err(VeldError::validation(format!(
                "mask has {} entries, frame has {} rows",
                mask.len(),
                self.n_rows()
            )));
        }
        for column in self.columns.values_mut() {
            match column {
                VeldColumn::Numeric(v) => {
                    let mut keep = mask.iter();
                    v.retain(|_| *keep.next().unwrap());
                }
                VeldColumn::Text(v) => {
                    let mut keep = mask.iter();
                    v.retain(|_| *keep.next().unwrap());
                }
            }
        }
        Ok(())
    }

    /// Projects the frame onto the given columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<VeldFrame> {
        let mut out = VeldFrame::new();
        for name in names {
            out.insert_column(*name, self.column(name)?.clone())?;
        }
        Ok(out)
    }

    /// Drops every row that has a missing value in any of the given columns.
    pub fn drop_null_rows(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            self.column(name)?;
        }
        let mask: Vec<bool> = (0..self.n_rows())
            .map(|row| names.iter().all(|n| !self.columns[*n].is_null_at(row)))
            .collect();
        self.retain_rows(&mask)
    }

    /// Level counts for a text column, ordered by descending frequency.
    /// Ties break on the level name so the ordering is deterministic.
    pub fn value_counts(&self, name: &str) -> Result<Vec<(String, usize)>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for cell in self.text(name)?.iter().flatten() {
            *counts.entry(cell.as_str()).or_insert(0) += 1;
        }
        let mut out: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    /// Splits a numeric column by the levels of a text column, keeping only
    /// non-null pairs. Groups come back ordered by descending size.
    pub fn group_numeric(
        &self,
        group_col: &str,
        value_col: &str,
    ) -> Result<Vec<(String, Vec<f64>)>> {
        let groups = self.text(group_col)?;
        let values = self.numeric(value_col)?;

        let mut by_level: HashMap<&str, Vec<f64>> = HashMap::new();
        for (level, value) in groups.iter().zip(values) {
            if let (Some(level), Some(value)) = (level, value) {
                by_level.entry(level.as_str()).or_default().push(*value);
            }
        }
        let mut out: Vec<(String, Vec<f64>)> = by_level
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        out.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    /// Numeric view of a column for trimming purposes.
    ///
    /// Numeric columns are borrowed as-is; boolean-like text columns
    /// ("true"/"false", "yes"/"no", "0"/"1") are coerced to 0/1. Any other
    /// text column yields `None`, signalling the caller to skip it.
    pub fn numeric_view(&self, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        match self.column(name)? {
            VeldColumn::Numeric(v) => Ok(Some(v.clone())),
            VeldColumn::Text(v) => {
                let mut out = Vec::with_capacity(v.len());
                for cell in v {
                    match cell.as_deref().map(str::trim) {
                        None => out.push(None),
                        Some(s) => match coerce_bool(s) {
                            Some(b) => out.push(Some(f64::from(u8::from(b)))),
                            None => return Ok(None),
                        },
                    }
                }
                Ok(Some(out))
            }
        }
    }
}

fn coerce_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VeldFrame {
        let mut frame = VeldFrame::new();
        frame
            .insert_numeric("claims", vec![Some(1.0), Some(2.0), None, Some(4.0)])
            .unwrap();
        frame
            .insert_text(
                "province",
                vec![
                    Some("Gauteng".into()),
                    Some("Limpopo".into()),
                    Some("Gauteng".into()),
                    None,
                ],
            )
            .unwrap();
        frame
    }

    #[test]
    fn typed_accessors_enforce_schema() {
        let frame = sample();
        assert!(frame.numeric("claims").is_ok());
        assert!(matches!(
            frame.numeric("province"),
            Err(VeldError::Schema { .. })
        ));
        assert!(matches!(
            frame.text("missing"),
            Err(VeldError::Schema { .. })
        ));
    }

    #[test]
    fn insert_rejects_length_mismatch() {
        let mut frame = sample();
        let err = frame.insert_numeric("bad", vec![Some(1.0)]);
        assert!(matches!(err, Err(VeldError::Validation { .. })));
    }

    #[test]
    fn drop_null_rows_filters_every_column() {
        let mut frame = sample();
        frame.drop_null_rows(&["claims", "province"]).unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.numeric_values("claims").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn group_numeric_skips_null_pairs() {
        let frame = sample();
        let groups = frame.group_numeric("province", "claims").unwrap();
        // Gauteng has a null claim, Limpopo a single value; the null-province
        // row disappears entirely.
        assert_eq!(groups.len(), 2);
        let gauteng = groups.iter().find(|(n, _)| n == "Gauteng").unwrap();
        assert_eq!(gauteng.1, vec![1.0]);
    }

    #[test]
    fn value_counts_is_deterministic() {
        let frame = sample();
        let counts = frame.value_counts("province").unwrap();
        assert_eq!(counts[0], ("Gauteng".to_string(), 2));
        assert_eq!(counts[1], ("Limpopo".to_string(), 1));
    }

    #[test]
    fn numeric_view_coerces_booleans() {
        let mut frame = VeldFrame::new();
        frame
            .insert_text("flag", vec![Some("Yes".into()), Some("no".into()), None])
            .unwrap();
        frame
            .insert_text("label", vec![Some("a".into()), Some("b".into()), None])
            .unwrap();
        let view = frame.numeric_view("flag").unwrap().unwrap();
        assert_eq!(view, vec![Some(1.0), Some(0.0), None]);
        assert!(frame.numeric_view("label").unwrap().is_none());
    }
}
