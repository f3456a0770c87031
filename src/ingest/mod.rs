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

//! # Veld Ingest Module
//!
//! Data ingestion for raw claims extracts: delimiter detection and a
//! bad-row-tolerant table reader with per-column type inference.

pub mod format;
pub mod reader;

pub use format::{VeldFormatDetector, VeldTableFormat};
pub use reader::{VeldReaderConfig, VeldTableReader};
