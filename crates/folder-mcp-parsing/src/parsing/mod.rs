//! Document parsing: the capability contract plus one reference
//! implementation.

pub mod plain_text;
pub mod traits;

pub use plain_text::PlainTextParser;
pub use traits::{ContentParser, ParsedDocument, ParserRegistry, SheetData};
