//! Narration pacing from TOML (`[narration]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tutor_domain::SplitConfig;

/// Raw narration split configuration. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNarrationConfig {
    pub max_words: usize,
    pub per_word_ms: u64,
    pub min_display_ms: u64,
    pub max_display_ms: u64,
    pub short_gap_ms: u64,
    pub base_gap_ms: u64,
    pub question_gap_ms: u64,
    pub short_segment_words: usize,
}

impl Default for FileNarrationConfig {
    fn default() -> Self {
        let split = SplitConfig::default();
        Self {
            max_words: split.max_words,
            per_word_ms: millis(split.per_word),
            min_display_ms: millis(split.min_display),
            max_display_ms: millis(split.max_display),
            short_gap_ms: millis(split.short_gap),
            base_gap_ms: millis(split.base_gap),
            question_gap_ms: millis(split.question_gap),
            short_segment_words: split.short_segment_words,
        }
    }
}

impl FileNarrationConfig {
    pub fn to_split_config(&self) -> SplitConfig {
        SplitConfig {
            max_words: self.max_words,
            per_word: Duration::from_millis(self.per_word_ms),
            min_display: Duration::from_millis(self.min_display_ms),
            max_display: Duration::from_millis(self.max_display_ms),
            short_gap: Duration::from_millis(self.short_gap_ms),
            base_gap: Duration::from_millis(self.base_gap_ms),
            question_gap: Duration::from_millis(self.question_gap_ms),
            short_segment_words: self.short_segment_words,
        }
        .with_max_words(self.max_words)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
