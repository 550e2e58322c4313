// file: src/parser/mod.rs
// description: document text extraction for plain text and markdown files
// reference: https://docs.rs/pulldown-cmark

use crate::error::{AnalysisError, Result};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text from a document on disk. Plain text files are read
    /// as-is; markdown is reduced to plain text so formatting syntax does not
    /// leak into inference prompts. Unknown extensions and unreadable files
    /// are fatal for the run.
    pub fn extract(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(AnalysisError::Extraction {
                path: path.to_path_buf(),
                message: "not a file".to_string(),
            });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let content = fs::read_to_string(path).map_err(|e| AnalysisError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let text = match extension.as_str() {
            "txt" | "text" => content,
            "md" | "markdown" => Self::markdown_to_plain_text(&content),
            other => {
                return Err(AnalysisError::Extraction {
                    path: path.to_path_buf(),
                    message: format!("unsupported file type: .{}", other),
                });
            }
        };

        debug!(
            "Extracted {} chars from {}",
            text.chars().count(),
            path.display()
        );
        Ok(text)
    }

    fn markdown_to_plain_text(content: &str) -> String {
        let parser = Parser::new(content);
        let mut plain_text = String::new();
        let mut in_code_block = false;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(TagEnd::CodeBlock) => in_code_block = false,
                Event::Text(text) => {
                    // Code blocks in a contract document are almost always
                    // preformatted tables or schedules; keep them verbatim.
                    plain_text.push_str(&text);
                    if !in_code_block {
                        plain_text.push(' ');
                    }
                }
                Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                    plain_text.push('\n');
                }
                Event::SoftBreak | Event::HardBreak => {
                    plain_text.push('\n');
                }
                _ => {}
            }
        }

        plain_text.trim().to_string()
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_extract_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "contract.txt", "Clause 1. Payment terms.");

        let extractor = TextExtractor::new();
        let text = extractor.extract(&path).unwrap();
        assert_eq!(text, "Clause 1. Payment terms.");
    }

    #[test]
    fn test_extract_markdown_strips_syntax() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "contract.md",
            "# Service Agreement\n\nThe **Provider** shall deliver...\n",
        );

        let extractor = TextExtractor::new();
        let text = extractor.extract(&path).unwrap();
        assert!(text.contains("Service Agreement"));
        assert!(text.contains("Provider"));
        assert!(!text.contains('#'));
        assert!(!text.contains("**"));
    }

    #[test]
    fn test_unsupported_extension_is_extraction_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "contract.pdf", "%PDF-1.4");

        let extractor = TextExtractor::new();
        let err = extractor.extract(&path).unwrap_err();
        assert!(matches!(err, AnalysisError::Extraction { .. }));
    }

    #[test]
    fn test_missing_file_is_extraction_failure() {
        let extractor = TextExtractor::new();
        let err = extractor.extract(Path::new("/nonexistent/contract.txt"));
        assert!(matches!(err, Err(AnalysisError::Extraction { .. })));
    }
}
