//! Semantic splitting of narration text into paced segments.
//!
//! Paragraph breaks always split. Paragraphs longer than
//! [`SplitConfig::max_words`] are split between sentences, and a single
//! over-long sentence between words. Concatenating `text + separator` of all
//! segments gives back the input minus its leading whitespace.

use crate::conversation::message::PacingHint;
use crate::core::text::word_count;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::time::Duration;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…'];
const CLOSING_MARKS: &[char] = &['"', '\'', ')', ']', '”', '’', '*', '_'];

/// Tuning for segment length and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// Upper bound on words per segment (sentences are kept whole when possible)
    pub max_words: usize,
    /// Display time per word before clamping
    pub per_word: Duration,
    pub min_display: Duration,
    pub max_display: Duration,
    /// Gap after short, declarative segments
    pub short_gap: Duration,
    /// Gap after ordinary segments
    pub base_gap: Duration,
    /// Gap after a segment ending in a question
    pub question_gap: Duration,
    /// Segments at or below this word count use `short_gap`
    pub short_segment_words: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_words: 40,
            per_word: Duration::from_millis(300),
            min_display: Duration::from_millis(1500),
            max_display: Duration::from_secs(8),
            short_gap: Duration::from_millis(400),
            base_gap: Duration::from_millis(800),
            question_gap: Duration::from_millis(1500),
            short_segment_words: 6,
        }
    }
}

impl SplitConfig {
    pub fn with_max_words(mut self, max: usize) -> Self {
        self.max_words = max.max(1);
        self
    }

    /// Pacing for a segment of text.
    pub fn pacing_for(&self, text: &str) -> PacingHint {
        let words = word_count(text);
        let raw = self.per_word.saturating_mul(words as u32);
        let display_duration = raw.clamp(self.min_display, self.max_display.max(self.min_display));

        let gap_after = if is_question(text) {
            self.question_gap
        } else if words <= self.short_segment_words {
            self.short_gap
        } else {
            self.base_gap
        };

        PacingHint {
            display_duration,
            gap_after,
        }
    }
}

/// One displayable piece of a narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationSegment {
    /// Segment text without surrounding whitespace
    pub text: String,
    /// Whitespace that followed the segment in the source text
    pub separator: String,
    pub word_count: usize,
    pub pacing: PacingHint,
}

/// Split `text` lazily into narration segments.
pub fn split_narration(text: impl Into<String>, config: &SplitConfig) -> NarrationSegments {
    NarrationSegments {
        text: text.into(),
        cursor: 0,
        pending: VecDeque::new(),
        config: *config,
    }
}

/// Lazy, finite iterator over [`NarrationSegment`]s.
///
/// Consumes its text; once exhausted it cannot be restarted.
#[derive(Debug)]
pub struct NarrationSegments {
    text: String,
    cursor: usize,
    pending: VecDeque<(usize, usize)>,
    config: SplitConfig,
}

impl NarrationSegments {
    fn load_next_paragraph(&mut self) -> bool {
        let rest = &self.text[self.cursor..];
        let skipped = rest.len() - rest.trim_start().len();
        self.cursor += skipped;
        if self.cursor >= self.text.len() {
            return false;
        }

        let end = paragraph_end(&self.text, self.cursor);
        let content_end = self.cursor + self.text[self.cursor..end].trim_end().len();
        let ranges = split_paragraph(&self.text, self.cursor, content_end, self.config.max_words);
        self.pending.extend(ranges);
        self.cursor = content_end;
        true
    }
}

impl Iterator for NarrationSegments {
    type Item = NarrationSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() && !self.load_next_paragraph() {
            return None;
        }
        let (start, end) = self.pending.pop_front()?;

        let after = &self.text[end..];
        let separator_len = after.len() - after.trim_start().len();
        let text = self.text[start..end].to_string();
        let separator = self.text[end..end + separator_len].to_string();

        Some(NarrationSegment {
            word_count: word_count(&text),
            pacing: self.config.pacing_for(&text),
            text,
            separator,
        })
    }
}

impl FusedIterator for NarrationSegments {}

/// End (exclusive) of the paragraph starting at `from`: the first blank line.
fn paragraph_end(text: &str, from: usize) -> usize {
    let mut offset = from;
    for line in text[from..].split_inclusive('\n') {
        if offset > from && line.trim().is_empty() {
            return offset;
        }
        offset += line.len();
    }
    text.len()
}

fn split_paragraph(text: &str, start: usize, end: usize, max_words: usize) -> Vec<(usize, usize)> {
    if word_count(&text[start..end]) <= max_words {
        return vec![(start, end)];
    }

    let mut ranges = Vec::new();
    let mut group: Option<(usize, usize, usize)> = None; // (start, end, words)

    for (s_start, s_end) in sentence_ranges(text, start, end) {
        let words = word_count(&text[s_start..s_end]);

        if words > max_words {
            if let Some((g_start, g_end, _)) = group.take() {
                ranges.push((g_start, g_end));
            }
            ranges.extend(word_chunks(text, s_start, s_end, max_words));
            continue;
        }

        group = match group {
            Some((g_start, _, g_words)) if g_words + words <= max_words => {
                Some((g_start, s_end, g_words + words))
            }
            Some((g_start, g_end, _)) => {
                ranges.push((g_start, g_end));
                Some((s_start, s_end, words))
            }
            None => Some((s_start, s_end, words)),
        };
    }

    if let Some((g_start, g_end, _)) = group {
        ranges.push((g_start, g_end));
    }
    ranges
}

/// Sentence ranges within `[start, end)`, each trimmed of whitespace.
fn sentence_ranges(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let slice = &text[start..end];
    let mut ranges = Vec::new();
    let mut sentence_start: Option<usize> = None;
    let mut chars = slice.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if sentence_start.is_none() {
            sentence_start = Some(idx);
        }
        if !SENTENCE_TERMINATORS.contains(&c) {
            continue;
        }

        let mut sentence_end = idx + c.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if SENTENCE_TERMINATORS.contains(&next) || CLOSING_MARKS.contains(&next) {
                sentence_end = next_idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let at_boundary = match chars.peek() {
            Some(&(_, next)) => next.is_whitespace(),
            None => true,
        };
        if at_boundary {
            if let Some(s) = sentence_start.take() {
                ranges.push((start + s, start + sentence_end));
            }
        }
    }

    if let Some(s) = sentence_start {
        let tail = slice[s..].trim_end();
        ranges.push((start + s, start + s + tail.len()));
    }
    ranges
}

/// Split `[start, end)` into runs of at most `max_words` whole words.
fn word_chunks(text: &str, start: usize, end: usize, max_words: usize) -> Vec<(usize, usize)> {
    let slice = &text[start..end];
    let mut words = Vec::new();
    let mut word_start: Option<usize> = None;
    for (idx, c) in slice.char_indices() {
        match (c.is_whitespace(), word_start) {
            (false, None) => word_start = Some(idx),
            (true, Some(ws)) => {
                words.push((start + ws, start + idx));
                word_start = None;
            }
            _ => {}
        }
    }
    if let Some(ws) = word_start {
        words.push((start + ws, end));
    }

    words
        .chunks(max_words.max(1))
        .filter_map(|chunk| Some((chunk.first()?.0, chunk.last()?.1)))
        .collect()
}

fn is_question(text: &str) -> bool {
    text.trim_end()
        .trim_end_matches(CLOSING_MARKS)
        .ends_with('?')
}
