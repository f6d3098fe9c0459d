//! Source descriptor types.
//!
//! These mirror the externally owned descriptor schema: field names are
//! serde-renamed to the wire form (`sourceUrl`, `validationRegex`,
//! `transformers[].type`). The descriptor is read once per reconciliation
//! and never mutated by the pipeline.

use serde::{Deserialize, Serialize};
use url::Url;

/// An ordered list of membership-identifying strings.
///
/// Every pipeline stage produces a fresh list; the input list stays valid
/// for diagnostics after a stage fails.
pub type SubjectList = Vec<String>;

/// Supported remote document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// One subject per line.
    Plaintext,
    /// A JSON array of strings.
    Json,
}

impl SourceFormat {
    /// Wire name of the format, as it appears in descriptors.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transformer kinds declared in the descriptor schema.
///
/// The enum is closed: dispatch happens through a kind → stage-function
/// table in the pipeline crate, so adding a kind means adding one table
/// entry, never editing existing stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformerKind {
    Prefix,
    Suffix,
    RegexReplace,
    RegexRemove,
    RegexKeep,
    CamelCase,
    JsonPathExtract,
}

impl TransformerKind {
    /// Wire name of the kind, as it appears in descriptors.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::RegexReplace => "regexReplace",
            Self::RegexRemove => "regexRemove",
            Self::RegexKeep => "regexKeep",
            Self::CamelCase => "camelCase",
            Self::JsonPathExtract => "jsonPathExtract",
        }
    }
}

impl std::fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transformer stage: a kind plus its configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerSpec {
    /// Kind of transformer.
    #[serde(rename = "type")]
    pub kind: TransformerKind,
    /// Value of the transformer (pattern, prefix text, ...). May be empty.
    #[serde(default)]
    pub value: String,
}

impl TransformerSpec {
    /// Create a new transformer spec.
    pub fn new(kind: TransformerKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Declarative configuration for one remote subject source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    /// URL to fetch the document from.
    pub source_url: Url,
    /// Format of the fetched document.
    pub format: SourceFormat,
    /// Regular expression every subject must match before syncing.
    pub validation_regex: String,
    /// Ordered list of transformers; order is application order.
    #[serde(default)]
    pub transformers: Vec<TransformerSpec>,
}

impl SourceDescriptor {
    /// Create a descriptor with no transformers.
    pub fn new(source_url: Url, format: SourceFormat, validation_regex: impl Into<String>) -> Self {
        Self {
            source_url,
            format,
            validation_regex: validation_regex.into(),
            transformers: Vec::new(),
        }
    }

    /// Append a transformer stage.
    #[must_use]
    pub fn with_transformer(mut self, spec: TransformerSpec) -> Self {
        self.transformers.push(spec);
        self
    }
}
