//! Output formatting for CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use mdag_core::{Hash, Link, ObjectType};
use serde::Serialize;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Write output using the configured format.
    ///
    /// The `data` parameter must be a serializable struct that includes
    /// `success: bool` and `result_code: u8` fields.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    /// In text mode, writes the error message directly.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init` command.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub root: String,
    pub algorithm: String,
    pub chunk_threshold: usize,
}

/// Object added during `add` command.
#[derive(Debug, Clone, Serialize)]
pub struct AddedObject {
    pub hash: Hash,
    pub path: String,
    pub size: u64,
}

/// Output for `add` command.
#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub success: bool,
    pub result_code: u8,
    pub objects: Vec<AddedObject>,
}

/// Link information for `ls` command.
#[derive(Debug, Clone, Serialize)]
pub struct LinkInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub hash: Hash,
    pub size: u64,
}

impl LinkInfo {
    pub fn new(link: &Link, object_type: ObjectType) -> Self {
        Self {
            name: link.name().to_string(),
            object_type,
            hash: link.hash(),
            size: link.size(),
        }
    }
}

/// Output for `ls` command.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub hash: Hash,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub links: Vec<LinkInfo>,
}

/// Output for `stat` command.
#[derive(Debug, Serialize)]
pub struct StatOutput {
    pub success: bool,
    pub result_code: u8,
    pub hash: Hash,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub link_count: usize,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdag_core::{Algorithm, HashFunction};

    #[test]
    fn test_ls_output_json_shape() {
        let hash = Algorithm::Blake3.digest(b"x");
        let output = LsOutput {
            success: true,
            result_code: 0,
            hash,
            object_type: ObjectType::Tree,
            links: vec![LinkInfo {
                name: "a.txt".to_string(),
                object_type: ObjectType::Blob,
                hash,
                size: 1,
            }],
        };

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["type"], "tree");
        assert_eq!(value["hash"], hash.to_hex());
        assert_eq!(value["links"][0]["name"], "a.txt");
        assert_eq!(value["links"][0]["type"], "blob");
        assert_eq!(value["links"][0]["size"], 1);
    }

    #[test]
    fn test_chunk_link_omits_name() {
        let link = Link::chunk(Algorithm::Blake3.digest(b"chunk"), 4);
        let value = serde_json::to_value(LinkInfo::new(&link, ObjectType::Blob)).unwrap();
        assert!(value.get("name").is_none());
        assert_eq!(value["size"], 4);
    }
}
