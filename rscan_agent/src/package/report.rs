//! Per-package report model, one JSON record per package.

use std::collections::BTreeMap;

use rscan_matcher::FileAnalysis;
use serde::Serialize;

/// Typed fields from the DESCRIPTION file. Unrecognized fields are
/// dropped; dependency lists carry bare package names with version
/// constraints stripped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Description {
    pub package: String,
    pub title: String,
    pub version: String,
    pub license: String,
    pub description: String,
    pub imports: Vec<String>,
    pub depends: Vec<String>,
    pub suggests: Vec<String>,
    pub bioc_views: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Namespace {
    /// Raw directive calls; the exports/imports lists are derived from
    /// them and are what the report carries.
    #[serde(skip)]
    pub calls: Vec<NamespaceCall>,
    pub exports: Vec<String>,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceCall {
    pub name: String,
    pub args: Vec<String>,
    pub opts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseError {
    /// Which pipeline stage failed: DESCRIPTION, NAMESPACE, SOURCE_R or
    /// ARCHIVE.
    pub stage: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RFileReport {
    pub name: String,
    pub n_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FileAnalysis>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageReport {
    pub url: String,
    pub description: Description,
    pub namespace: Namespace,
    /// File count per lowercased extension; extensionless files count
    /// under `NONE`.
    pub file_extensions: BTreeMap<String, u64>,
    pub r_files: Vec<RFileReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    pub parse_errors: Vec<ParseError>,
}

impl PackageReport {
    pub fn fetch_failure(url: &str, message: &str) -> PackageReport {
        PackageReport {
            url: url.to_string(),
            fetch_error: Some(message.to_string()),
            ..PackageReport::default()
        }
    }

    pub fn push_error(&mut self, stage: &str, file: &str, message: impl ToString) {
        self.parse_errors.push(ParseError {
            stage: stage.to_string(),
            file: file.to_string(),
            message: message.to_string(),
        });
    }
}
