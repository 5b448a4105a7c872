//! Token-budget-aware splitting of a [`ParsedDocument`] into [`ChunkDraft`]s.

use super::model::{ChunkDraft, ChunkKind, Location, SemanticMetadata};
use super::split::{pack, split_to_budget};
use super::traits::TokenCounterRef;
use crate::error::ParsingResult;
use crate::parsing::{ParsedDocument, SheetData};
use unicode_normalization::UnicodeNormalization;

/// Target/soft/hard token limits a chunk must respect.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    /// Desired chunk size.
    pub target: usize,
    /// Soft cap: packing stops adding content once it would cross this.
    pub soft_cap: usize,
    /// Hard cap: a single chunk is never allowed to exceed this.
    pub hard_cap: usize,
}

impl TokenBudget {
    /// Derive soft/hard caps from `target` using the given multipliers
    /// (spec default: soft 1.5×, hard 2×).
    #[must_use]
    pub fn new(target: usize, soft_cap_multiplier: f64, hard_cap_multiplier: f64) -> Self {
        Self {
            target,
            soft_cap: (target as f64 * soft_cap_multiplier) as usize,
            hard_cap: (target as f64 * hard_cap_multiplier) as usize,
        }
    }
}

/// Splits parsed documents into chunks that respect a [`TokenBudget`],
/// carrying positional [`Location`] and default [`SemanticMetadata`].
pub struct ChunkingService {
    counter: TokenCounterRef,
    budget: TokenBudget,
}

impl ChunkingService {
    /// Build a chunker using `counter` for token accounting and `budget`
    /// for its size limits.
    #[must_use]
    pub fn new(counter: TokenCounterRef, budget: TokenBudget) -> Self {
        Self { counter, budget }
    }

    /// Chunk a parsed document, picking the `Location` shape and default
    /// `ChunkKind` from its variant.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ParsingError`] if chunking invariants can't
    /// be upheld (in practice, only reachable via future parser additions).
    pub fn chunk(&self, parsed: &ParsedDocument) -> ParsingResult<Vec<ChunkDraft>> {
        let chunks = match parsed {
            ParsedDocument::Text(text) => self.chunk_text(text, ChunkKind::Prose),
            ParsedDocument::Paginated(pages) => self.chunk_pages(pages),
            ParsedDocument::Slides(slides) => self.chunk_slides(slides),
            ParsedDocument::Spreadsheet(sheets) => self.chunk_spreadsheet(sheets),
        };
        Ok(chunks)
    }

    fn leaves_for(&self, text: &str) -> Vec<String> {
        let split = split_to_budget(text, self.counter.as_ref(), self.budget.hard_cap);
        pack(split, self.counter.as_ref(), self.budget.soft_cap)
    }

    fn chunk_text(&self, text: &str, kind: ChunkKind) -> Vec<ChunkDraft> {
        let pieces = self.leaves_for(text);
        let metadata = SemanticMetadata::default_for(kind);

        let mut drafts = Vec::with_capacity(pieces.len());
        let mut current_line = 1usize;

        for (ordinal, piece) in pieces.into_iter().enumerate() {
            let start_line = current_line;
            let mut newlines = 0usize;
            for ch in piece.chars() {
                if ch == '\n' {
                    newlines += 1;
                }
            }
            current_line += newlines;
            let end_line = if piece.ends_with('\n') {
                current_line.saturating_sub(1).max(start_line)
            } else {
                current_line
            };

            drafts.push(self.build_draft(
                ordinal,
                piece,
                Location::Lines {
                    start: start_line,
                    end: end_line,
                },
                metadata.clone(),
            ));
        }

        drafts
    }

    fn chunk_pages(&self, pages: &[String]) -> Vec<ChunkDraft> {
        let metadata = SemanticMetadata::default_for(ChunkKind::Prose);
        let mut drafts = Vec::new();
        let mut ordinal = 0usize;

        for (page_idx, page) in pages.iter().enumerate() {
            for piece in self.leaves_for(page) {
                drafts.push(self.build_draft(
                    ordinal,
                    piece,
                    Location::Page {
                        number: page_idx + 1,
                    },
                    metadata.clone(),
                ));
                ordinal += 1;
            }
        }

        drafts
    }

    fn chunk_slides(&self, slides: &[String]) -> Vec<ChunkDraft> {
        let metadata = SemanticMetadata::default_for(ChunkKind::Prose);
        let mut drafts = Vec::new();
        let mut ordinal = 0usize;

        for (slide_idx, slide) in slides.iter().enumerate() {
            for piece in self.leaves_for(slide) {
                drafts.push(self.build_draft(
                    ordinal,
                    piece,
                    Location::Slide {
                        number: slide_idx + 1,
                    },
                    metadata.clone(),
                ));
                ordinal += 1;
            }
        }

        drafts
    }

    fn chunk_spreadsheet(&self, sheets: &[SheetData]) -> Vec<ChunkDraft> {
        let metadata = SemanticMetadata::default_for(ChunkKind::Table);
        let mut drafts = Vec::new();
        let mut ordinal = 0usize;

        for sheet in sheets {
            let row_texts: Vec<String> = sheet
                .rows
                .iter()
                .map(|row| row.join("\t"))
                .collect();

            let mut row_start = 1usize;
            let mut buf_rows: Vec<String> = Vec::new();
            let mut buf_tokens = 0usize;

            let flush = |drafts: &mut Vec<ChunkDraft>,
                         ordinal: &mut usize,
                         buf_rows: &mut Vec<String>,
                         row_start: usize,
                         row_end: usize,
                         service: &Self| {
                if buf_rows.is_empty() {
                    return;
                }
                let content = buf_rows.join("\n");
                let range = if row_start == row_end {
                    format!("{row_start}")
                } else {
                    format!("{row_start}-{row_end}")
                };
                drafts.push(service.build_draft(
                    *ordinal,
                    content,
                    Location::Sheet {
                        name: sheet.name.clone(),
                        range,
                    },
                    metadata.clone(),
                ));
                *ordinal += 1;
                buf_rows.clear();
            };

            for (idx, row) in row_texts.iter().enumerate() {
                let row_tokens = self.counter.count(row);
                if !buf_rows.is_empty() && buf_tokens + row_tokens > self.budget.soft_cap {
                    flush(
                        &mut drafts,
                        &mut ordinal,
                        &mut buf_rows,
                        row_start,
                        row_start + buf_rows.len() - 1,
                        self,
                    );
                    row_start = idx + 1;
                    buf_tokens = 0;
                }
                buf_rows.push(row.clone());
                buf_tokens += row_tokens;
            }
            flush(
                &mut drafts,
                &mut ordinal,
                &mut buf_rows,
                row_start,
                row_start + buf_rows.len().saturating_sub(1),
                self,
            );
        }

        drafts
    }

    fn build_draft(
        &self,
        ordinal: usize,
        content: String,
        location: Location,
        semantic_metadata: SemanticMetadata,
    ) -> ChunkDraft {
        let token_count = self.counter.count(&content);
        let content_hash = content_hash_for(&content);
        ChunkDraft {
            ordinal,
            content,
            content_hash,
            token_count,
            location,
            semantic_metadata,
        }
    }
}

/// Hash the NFC-normalized, trailing-whitespace-stripped chunk text, per
/// §4.2's content hash rule. The stored `content` keeps the raw substring;
/// only the hash input is normalized.
fn content_hash_for(content: &str) -> String {
    let normalized: String = content.trim_end().nfc().collect();
    folder_mcp_common::content_hash(normalized.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::heuristic_counter::HeuristicCounter;
    use std::sync::Arc;

    fn service(target: usize) -> ChunkingService {
        let counter: TokenCounterRef = Arc::new(HeuristicCounter::new("heuristic", 8192));
        ChunkingService::new(counter, TokenBudget::new(target, 1.5, 2.0))
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        let svc = service(400);
        let chunks = svc.chunk(&ParsedDocument::Text(String::new())).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn concatenating_chunks_reproduces_original_text() {
        let svc = service(20);
        let text = "First paragraph here.\n\nSecond paragraph is a little bit longer than the first one.\n\nThird and final paragraph.";
        let chunks = svc.chunk(&ParsedDocument::Text(text.to_string())).unwrap();
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn ordinals_are_dense_and_increasing() {
        let svc = service(10);
        let text = "a.\n\nb.\n\nc.\n\nd.\n\ne.";
        let chunks = svc.chunk(&ParsedDocument::Text(text.to_string())).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
        }
    }

    #[test]
    fn page_chunks_carry_page_location() {
        let svc = service(400);
        let pages = vec!["page one content".to_string(), "page two content".to_string()];
        let chunks = svc.chunk(&ParsedDocument::Paginated(pages)).unwrap();
        assert_eq!(chunks[0].location, Location::Page { number: 1 });
        assert_eq!(chunks[1].location, Location::Page { number: 2 });
    }

    #[test]
    fn spreadsheet_chunks_carry_sheet_location() {
        let svc = service(400);
        let sheets = vec![SheetData {
            name: "Sheet1".to_string(),
            rows: vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ],
        }];
        let chunks = svc.chunk(&ParsedDocument::Spreadsheet(sheets)).unwrap();
        assert_eq!(chunks.len(), 1);
        match &chunks[0].location {
            Location::Sheet { name, range } => {
                assert_eq!(name, "Sheet1");
                assert_eq!(range, "1-2");
            }
            other => panic!("expected Sheet location, got {other:?}"),
        }
    }

    #[test]
    fn content_hash_is_stable_under_trailing_whitespace() {
        assert_eq!(
            content_hash_for("hello world"),
            content_hash_for("hello world   \n")
        );
    }
}
