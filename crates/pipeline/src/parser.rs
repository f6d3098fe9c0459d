//! Format-keyed subject parsers.
//!
//! The registry is the extension point for new document formats: parsers are
//! looked up by [`SourceFormat`], and adding a format means one new
//! registration, never an edit to an existing parser.

use std::collections::HashMap;

use groupsync_core::{ParseError, SourceFormat, SubjectList};

/// Capability to decode raw bytes into an ordered subject list.
pub trait SubjectParser: Send + Sync {
    /// Parse the document body into subjects, preserving document order.
    fn parse(&self, body: &[u8]) -> Result<SubjectList, ParseError>;
}

/// Parser for line-oriented plaintext documents.
///
/// Each line becomes one subject, kept verbatim (no trimming); a trailing
/// newline does not produce an extra empty subject. Empty input is an empty
/// list, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextParser;

impl SubjectParser for PlaintextParser {
    fn parse(&self, body: &[u8]) -> Result<SubjectList, ParseError> {
        let text = std::str::from_utf8(body)
            .map_err(|e| ParseError::malformed(format!("document is not UTF-8: {e}")))?;

        Ok(text.lines().map(str::to_owned).collect())
    }
}

/// Parser for JSON documents holding an array of strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl SubjectParser for JsonParser {
    fn parse(&self, body: &[u8]) -> Result<SubjectList, ParseError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ParseError::malformed(e.to_string()))?;

        // Decode manually instead of straight into Vec<String> so a
        // well-formed document of the wrong shape reports Schema, not
        // Malformed.
        match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s),
                    other => Err(ParseError::schema(format!(
                        "expected array of strings, found element of type {}",
                        json_type(&other)
                    ))),
                })
                .collect(),
            other => Err(ParseError::schema(format!(
                "expected a JSON array of strings, found {}",
                json_type(&other)
            ))),
        }
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Registry of parsers keyed by source format.
pub struct ParserRegistry {
    parsers: HashMap<SourceFormat, Box<dyn SubjectParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser for a format, replacing any existing one.
    pub fn register(&mut self, format: SourceFormat, parser: Box<dyn SubjectParser>) {
        self.parsers.insert(format, parser);
    }

    /// Check whether a parser is registered for the format.
    ///
    /// The orchestrator calls this before fetching so an unsupported format
    /// never wastes a network call.
    pub fn supports(&self, format: SourceFormat) -> bool {
        self.parsers.contains_key(&format)
    }

    /// Parse a document body with the parser registered for `format`.
    pub fn parse(&self, format: SourceFormat, body: &[u8]) -> Result<SubjectList, ParseError> {
        let parser = self
            .parsers
            .get(&format)
            .ok_or_else(|| ParseError::unsupported_format(format.as_str()))?;
        parser.parse(body)
    }
}

impl Default for ParserRegistry {
    /// Registry with the two built-in formats.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(SourceFormat::Plaintext, Box::new(PlaintextParser));
        registry.register(SourceFormat::Json, Box::new(JsonParser));
        registry
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_plaintext_one_subject_per_line() {
        let subjects = PlaintextParser.parse(b"alice\nbob\ncarol\n").unwrap();
        assert_eq!(subjects, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_plaintext_preserves_order_and_content() {
        let subjects = PlaintextParser.parse(b"zeta\n alpha \nzeta").unwrap();
        // Lines are kept verbatim: no trimming, no dedup.
        assert_eq!(subjects, vec!["zeta", " alpha ", "zeta"]);
    }

    #[test]
    fn test_plaintext_empty_input_is_empty_list() {
        let subjects = PlaintextParser.parse(b"").unwrap();
        assert!(subjects.is_empty());
    }

    #[test]
    fn test_plaintext_rejects_non_utf8() {
        let err = PlaintextParser.parse(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn test_json_array_of_strings() {
        let subjects = JsonParser.parse(br#"["alice","bob"]"#).unwrap();
        assert_eq!(subjects, vec!["alice", "bob"]);
    }

    #[test]
    fn test_json_empty_array() {
        let subjects = JsonParser.parse(b"[]").unwrap();
        assert!(subjects.is_empty());
    }

    #[test]
    fn test_json_wrong_shape_is_schema_error() {
        let err = JsonParser.parse(br#"{"users":["alice"]}"#).unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));

        let err = JsonParser.parse(br#"["alice", 42]"#).unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
    }

    #[test]
    fn test_json_garbage_is_malformed() {
        let err = JsonParser.parse(b"not json").unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn test_registry_dispatches_by_format() {
        let registry = ParserRegistry::default();
        assert!(registry.supports(SourceFormat::Plaintext));
        assert!(registry.supports(SourceFormat::Json));

        let subjects = registry.parse(SourceFormat::Plaintext, b"alice\n").unwrap();
        assert_eq!(subjects, vec!["alice"]);
    }

    #[test]
    fn test_empty_registry_reports_unsupported_format() {
        let registry = ParserRegistry::new();
        let err = registry.parse(SourceFormat::Json, b"[]").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat { .. }));
    }
}
