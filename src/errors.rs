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

//! # Veld Error Module
//!
//! This module defines the error types and utilities used throughout Veld
//! for consistent error handling and reporting.
//!
//! ## Error Categories
//!
//! - **Io**: Filesystem errors while reading raw data or writing reports
//! - **Schema**: Missing columns or type mismatches in the loaded table
//! - **Validation**: Invalid parameters or inputs
//! - **Stats**: A statistical procedure could not be run on the given data
//!   (too few groups, zero variance, unsupported sample size)
//! - **Plot**: Chart rendering failures
//! - **Internal**: Unexpected internal failures

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Veld.
pub type Result<T> = std::result::Result<T, VeldError>;

/// Canonical error enumeration for Veld.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum VeldError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Errors caused by a missing column or incompatible column type.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A statistical test could not be carried out on the given data.
    #[error("'{test}' failed: {message}")]
    Stats { test: String, message: String },

    /// Chart rendering failures.
    #[error("plot error: {0}")]
    Plot(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for VeldError {
    fn from(err: io::Error) -> Self {
        VeldError::Io(err.to_string())
    }
}

impl From<csv::Error> for VeldError {
    fn from(err: csv::Error) -> Self {
        VeldError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VeldError {
    fn from(err: serde_json::Error) -> Self {
        VeldError::Serde(err.to_string())
    }
}

impl VeldError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        VeldError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct schema errors.
    pub fn schema<T: Into<String>>(message: T) -> Self {
        VeldError::Schema {
            message: message.into(),
        }
    }

    /// Helper to construct statistics errors.
    pub fn stats(test: impl Into<String>, message: impl Into<String>) -> Self {
        VeldError::Stats {
            test: test.into(),
            message: message.into(),
        }
    }

    /// Helper to construct plot errors.
    pub fn plot<T: Into<String>>(message: T) -> Self {
        VeldError::Plot(message.into())
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        VeldError::Internal(message.into())
    }
}
