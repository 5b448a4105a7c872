//! The parser capability contract: one trait every document format plugs
//! into, and a registry that dispatches by file extension.

use crate::error::{ParsingError, ParsingResult};

/// A single sheet inside a spreadsheet document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetData {
    /// Sheet name as reported by the source file.
    pub name: String,
    /// Row-major cell values, already stringified.
    pub rows: Vec<Vec<String>>,
}

/// The shape of a parsed document before chunking.
///
/// A parser commits to one variant based on the source format; the chunker
/// picks its splitting strategy and `Location` kind from which variant it
/// receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDocument {
    /// Flat text content (plain text, Markdown, code, CSV-as-text, …).
    Text(String),
    /// Content split into pages (e.g. PDF).
    Paginated(Vec<String>),
    /// Content split into slides (e.g. presentation decks).
    Slides(Vec<String>),
    /// Tabular content split into named sheets.
    Spreadsheet(Vec<SheetData>),
}

impl ParsedDocument {
    /// True if this document has no content at all (used for the
    /// empty-file edge case: zero chunks, no embeddings).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Paginated(pages) => pages.iter().all(|p| p.is_empty()),
            Self::Slides(slides) => slides.iter().all(|s| s.is_empty()),
            Self::Spreadsheet(sheets) => sheets.iter().all(|s| s.rows.is_empty()),
        }
    }
}

/// Parses raw file bytes into a [`ParsedDocument`].
///
/// Implementations can use whatever strategy fits the format: a text
/// decoder, a PDF/Office library, or a heuristic line splitter. Only a
/// single reference implementation ([`PlainTextParser`]) ships here;
/// other extensions intentionally return [`ParsingError::UnsupportedType`]
/// until a concrete backend is registered for them.
///
/// [`PlainTextParser`]: crate::parsing::PlainTextParser
pub trait ContentParser: Send + Sync {
    /// Identifies this parser in logs and metadata responses.
    fn name(&self) -> &str;

    /// Parse raw file content into a `ParsedDocument`.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError::ParseError`] if `content` cannot be decoded
    /// or interpreted according to this parser's format.
    fn parse(&self, content: &[u8], file_path: &str) -> ParsingResult<ParsedDocument>;

    /// Whether this parser handles files with this extension (no leading dot,
    /// lowercase, e.g. `"md"`).
    fn supports(&self, extension: &str) -> bool;

    /// Extensions this parser declares support for.
    fn extensions(&self) -> &[&str];
}

type BoxedContentParser = Box<dyn ContentParser>;

/// Dispatches to the registered parser whose `extensions()` cover a given
/// file, returning [`ParsingError::UnsupportedType`] when none do.
pub struct ParserRegistry {
    parsers: Vec<BoxedContentParser>,
}

impl ParserRegistry {
    /// An empty registry; register parsers with [`Self::register`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser. Later registrations are not preferred over
    /// earlier ones for the same extension — first match wins.
    pub fn register(&mut self, parser: BoxedContentParser) {
        self.parsers.push(parser);
    }

    fn find_parser(&self, extension: &str) -> Option<&dyn ContentParser> {
        self.parsers
            .iter()
            .find(|p| p.supports(extension))
            .map(std::convert::AsRef::as_ref)
    }

    /// Parse `content` for `file_path`, dispatching by its extension.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError::UnsupportedType`] if no parser declares
    /// support for the file's extension, or whatever error the matched
    /// parser returns.
    pub fn parse(&self, content: &[u8], file_path: &str) -> ParsingResult<ParsedDocument> {
        let extension = extension_of(file_path);
        match self.find_parser(&extension) {
            Some(parser) => parser.parse(content, file_path),
            None => Err(ParsingError::UnsupportedType(extension)),
        }
    }

    /// Whether some registered parser supports this extension.
    #[must_use]
    pub fn supports(&self, extension: &str) -> bool {
        self.find_parser(extension).is_some()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_of(file_path: &str) -> String {
    std::path::Path::new(file_path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::PlainTextParser;

    #[test]
    fn dispatches_to_matching_parser() {
        let mut registry = ParserRegistry::new();
        registry.register(Box::new(PlainTextParser::new()));

        let parsed = registry.parse(b"hello", "notes.md").unwrap();
        assert_eq!(parsed, ParsedDocument::Text("hello".to_string()));
    }

    #[test]
    fn rejects_unknown_extension() {
        let registry = ParserRegistry::new();
        let err = registry.parse(b"binary", "doc.pdf").unwrap_err();
        assert!(matches!(err, ParsingError::UnsupportedType(_)));
    }
}
