//
//  scm-bitbucket
//  output/json.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # JSON Output
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`write_json`] | Pretty-printed JSON on stdout |
//! | [`write_json_compact`] | One line of JSON on stdout |
//! | [`write_json_to`] | Either form to any writer |
//!
//! ## Example
//!
//! ```rust,ignore
//! use scm_bitbucket::output::json::write_json;
//!
//! write_json(&serde_json::json!({ "admin": true, "push": true, "pull": true }))?;
//! ```

use std::io::{self, Write};

use serde::Serialize;

/// Writes a value as pretty-printed JSON to stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or stdout is not
/// writable.
pub fn write_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    write_json_to(&mut io::stdout().lock(), value, false)
}

/// Writes a value as compact JSON to stdout.
pub fn write_json_compact<T: Serialize>(value: &T) -> anyhow::Result<()> {
    write_json_to(&mut io::stdout().lock(), value, true)
}

/// Writes a value as JSON followed by a newline to a custom writer.
///
/// # Example
///
/// ```rust
/// use scm_bitbucket::output::json::write_json_to;
///
/// let mut buffer = Vec::new();
/// write_json_to(&mut buffer, &serde_json::json!({"name": "PR-1"}), true).unwrap();
/// assert_eq!(String::from_utf8(buffer).unwrap(), "{\"name\":\"PR-1\"}\n");
/// ```
pub fn write_json_to<W: Write, T: Serialize>(
    writer: &mut W,
    value: &T,
    compact: bool,
) -> anyhow::Result<()> {
    if compact {
        serde_json::to_writer(&mut *writer, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_output() {
        let mut buffer = Vec::new();
        write_json_to(&mut buffer, &json!({"admin": true}), false).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "{\n  \"admin\": true\n}\n");
    }

    #[test]
    fn test_compact_output() {
        let mut buffer = Vec::new();
        write_json_to(&mut buffer, &vec![json!({"name": "main"}), json!({"name": "dev"})], true)
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "[{\"name\":\"main\"},{\"name\":\"dev\"}]\n");
    }
}
