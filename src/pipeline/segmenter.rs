// file: src/pipeline/segmenter.rs
// description: separator-preferring text segmentation with bounded size and overlap
// reference: recursive character splitting over a separator preference list

use crate::config::SegmenterConfig;
use crate::models::{Document, Segment};
use std::collections::VecDeque;
use std::ops::Range;
use tracing::debug;

/// Splits document text into ordered, possibly overlapping segments, each at
/// most `size` characters. Splitting prefers semantic boundaries (paragraph,
/// line, sentence, clause) over hard cuts, trying each separator in order
/// until a piece fits. Every produced segment is a contiguous substring of the
/// input, and the segments in order cover the whole input.
pub struct Segmenter {
    size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl Segmenter {
    pub fn new(size: usize, overlap: usize, separators: Vec<String>) -> Self {
        debug_assert!(overlap < size);
        Self {
            size,
            overlap,
            separators,
        }
    }

    pub fn from_config(config: &SegmenterConfig) -> Self {
        Self::new(
            config.segment_size,
            config.overlap,
            config.separators.clone(),
        )
    }

    pub fn segment(&self, document: &Document) -> Vec<Segment> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Segment::new(index, text, document.id))
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        if char_count(text) <= self.size {
            return vec![text.to_string()];
        }

        let mut pieces = Vec::new();
        self.split_ranges(text, 0..text.len(), 0, &mut pieces);

        let chunks = self.merge_pieces(text, &pieces);
        debug!(
            "Split {} chars into {} segments",
            char_count(text),
            chunks.len()
        );

        chunks
            .into_iter()
            .map(|range| text[range].to_string())
            .collect()
    }

    /// Break `range` into pieces of at most `size` characters, preferring the
    /// separator at `level` and descending to finer separators only when a
    /// piece still does not fit. An exhausted separator list means a hard cut.
    fn split_ranges(&self, text: &str, range: Range<usize>, level: usize, out: &mut Vec<Range<usize>>) {
        let slice = &text[range.clone()];
        if char_count(slice) <= self.size {
            if !slice.is_empty() {
                out.push(range);
            }
            return;
        }

        let Some(separator) = self.separators.get(level) else {
            self.hard_cut(text, range, out);
            return;
        };

        if separator.is_empty() {
            self.hard_cut(text, range, out);
            return;
        }

        let sub_ranges = split_inclusive_ranges(slice, separator, range.start);
        if sub_ranges.len() <= 1 {
            // Separator absent; descend without making progress here.
            self.split_ranges(text, range, level + 1, out);
            return;
        }

        for sub in sub_ranges {
            if char_count(&text[sub.clone()]) <= self.size {
                out.push(sub);
            } else {
                self.split_ranges(text, sub, level + 1, out);
            }
        }
    }

    fn hard_cut(&self, text: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
        let slice = &text[range.clone()];
        let mut start = range.start;
        let mut chars_in_piece = 0;

        for (offset, _) in slice.char_indices() {
            if chars_in_piece == self.size {
                out.push(start..range.start + offset);
                start = range.start + offset;
                chars_in_piece = 0;
            }
            chars_in_piece += 1;
        }
        if start < range.end {
            out.push(start..range.end);
        }
    }

    /// Greedily pack pieces into chunks of at most `size` characters. When a
    /// chunk closes, an `overlap`-sized tail of its pieces seeds the next
    /// chunk so clauses spanning a boundary appear whole in one segment.
    fn merge_pieces(&self, text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<Range<usize>> = VecDeque::new();
        let mut window_chars = 0;

        for piece in pieces {
            let piece_chars = char_count(&text[piece.clone()]);

            if window_chars + piece_chars > self.size && !window.is_empty() {
                chunks.push(window_range(&window));

                while window_chars > self.overlap
                    || (window_chars + piece_chars > self.size && window_chars > 0)
                {
                    let front = window.pop_front().expect("window is non-empty");
                    window_chars -= char_count(&text[front]);
                }
            }

            // Overlap carry only makes sense for adjacent text. A gap cannot
            // occur with contiguous pieces, but guard the invariant anyway.
            debug_assert!(
                window.back().is_none_or(|back| back.end == piece.start),
                "pieces must be contiguous"
            );

            window.push_back(piece.clone());
            window_chars += piece_chars;
        }

        if !window.is_empty() {
            chunks.push(window_range(&window));
        }

        chunks
    }
}

fn window_range(window: &VecDeque<Range<usize>>) -> Range<usize> {
    let start = window.front().expect("window is non-empty").start;
    let end = window.back().expect("window is non-empty").end;
    start..end
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Split `slice` on `separator`, keeping each separator attached to the piece
/// before it. Offsets are absolute (shifted by `base`).
fn split_inclusive_ranges(slice: &str, separator: &str, base: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for (index, _) in slice.match_indices(separator) {
        let end = index + separator.len();
        ranges.push(base + start..base + end);
        start = end;
    }

    if start < slice.len() {
        ranges.push(base + start..base + slice.len());
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn segmenter(size: usize, overlap: usize) -> Segmenter {
        let config = Config::default_config().segmenter;
        Segmenter::new(size, overlap, config.separators)
    }

    /// Every chunk must be a contiguous substring, in order, with each chunk
    /// starting at or before the previous chunk's end (overlap, never a gap),
    /// and the final chunk reaching the end of the input.
    fn assert_coverage(text: &str, chunks: &[String]) {
        let mut prev_end = 0;
        let mut search_from = 0;

        for chunk in chunks {
            let start = text[search_from..]
                .find(chunk.as_str())
                .map(|pos| pos + search_from)
                .expect("chunk must be a substring of the input");
            assert!(start <= prev_end, "gap between segments");
            prev_end = start + chunk.len();
            search_from = start + 1;
        }

        assert_eq!(prev_end, text.len(), "input tail not covered");
    }

    #[test]
    fn test_empty_input_yields_no_segments() {
        assert!(segmenter(100, 20).split_text("").is_empty());
    }

    #[test]
    fn test_short_input_yields_one_segment() {
        let chunks = segmenter(100, 20).split_text("A short contract clause.");
        assert_eq!(chunks, vec!["A short contract clause.".to_string()]);
    }

    #[test]
    fn test_paragraph_boundaries_preferred() {
        let text = "First paragraph of the agreement.\n\nSecond paragraph with terms.\n\nThird paragraph on liability.";
        let chunks = segmenter(40, 0).split_text(text);

        assert!(chunks.len() >= 2);
        assert!(chunks[0].contains("First paragraph"));
        assert_coverage(text, &chunks);
    }

    #[test]
    fn test_size_bound_respected() {
        let sentence = "The supplier shall deliver goods on time. ";
        let text = sentence.repeat(50);
        let size = 100;
        let chunks = segmenter(size, 20).split_text(&text);

        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= size,
                "segment exceeds size bound: {} chars",
                chunk.chars().count()
            );
        }
        assert_coverage(&text, &chunks);
    }

    #[test]
    fn test_overlap_present_between_segments() {
        let sentence = "Clause text continues here. ";
        let text = sentence.repeat(30);
        let chunks = segmenter(100, 40).split_text(&text);

        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let prev_tail: String = pair[0].chars().rev().take(20).collect::<String>()
                .chars().rev().collect();
            assert!(
                pair[1].starts_with(&prev_tail) || pair[1].contains(&prev_tail),
                "expected overlap carry between adjacent segments"
            );
        }
    }

    #[test]
    fn test_hard_cut_on_unbroken_text() {
        let text = "x".repeat(250);
        let chunks = segmenter(100, 0).split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[2].len(), 50);
        assert_coverage(&text, &chunks);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "本合同由甲方与乙方签订。".repeat(40);
        let chunks = segmenter(100, 10).split_text(&text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_coverage(&text, &chunks);
    }

    #[test]
    fn test_segment_indices_contiguous_from_zero() {
        let doc = Document::new(
            "contract.txt".to_string(),
            "The parties agree as follows. ".repeat(20),
        );
        let segments = segmenter(80, 10).segment(&doc);

        for (expected, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, expected);
            assert_eq!(segment.document_id, doc.id);
        }
    }
}
