//! Reference `ContentParser` implementation for plain text and Markdown.

use super::traits::{ContentParser, ParsedDocument};
use crate::error::{ParsingError, ParsingResult};

const EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Decodes UTF-8 text content verbatim. Handles the `.txt`/`.md` cases
/// spec.md's scenario 1 exercises; everything else is a declared
/// Non-goal until a concrete parser is registered for it.
pub struct PlainTextParser;

impl PlainTextParser {
    /// Construct the parser. Stateless, so this never fails.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentParser for PlainTextParser {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn parse(&self, content: &[u8], file_path: &str) -> ParsingResult<ParsedDocument> {
        let text = std::str::from_utf8(content).map_err(|e| {
            ParsingError::ParseError(format!("{file_path}: invalid UTF-8: {e}"))
        })?;
        Ok(ParsedDocument::Text(text.to_string()))
    }

    fn supports(&self, extension: &str) -> bool {
        EXTENSIONS.contains(&extension)
    }

    fn extensions(&self) -> &[&str] {
        EXTENSIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utf8_text_verbatim() {
        let parser = PlainTextParser::new();
        let parsed = parser.parse("hello world".as_bytes(), "a.txt").unwrap();
        assert_eq!(parsed, ParsedDocument::Text("hello world".to_string()));
    }

    #[test]
    fn parses_empty_file_to_empty_document() {
        let parser = PlainTextParser::new();
        let parsed = parser.parse(b"", "empty.txt").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let parser = PlainTextParser::new();
        let err = parser.parse(&[0xFF, 0xFE, 0xFD], "bad.txt").unwrap_err();
        assert!(matches!(err, ParsingError::ParseError(_)));
    }

    #[test]
    fn supports_txt_and_md() {
        let parser = PlainTextParser::new();
        assert!(parser.supports("txt"));
        assert!(parser.supports("md"));
        assert!(!parser.supports("pdf"));
    }
}
