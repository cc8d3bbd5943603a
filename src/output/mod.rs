//
//  scm-bitbucket
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output
//!
//! Every command prints a single JSON document on stdout. Pretty printing
//! is the default; `--compact` writes one line for piping into other tools.

pub mod json;

use serde::Serialize;

pub use json::{write_json, write_json_compact, write_json_to};

/// How command results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented JSON
    #[default]
    Pretty,
    /// Single-line JSON
    Compact,
}

/// Writes command results to stdout in the selected format.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Writes a value to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Pretty => write_json(value),
            OutputFormat::Compact => write_json_compact(value),
        }
    }
}
