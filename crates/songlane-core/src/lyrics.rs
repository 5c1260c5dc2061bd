use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use unicode_general_category::{GeneralCategory, get_general_category};

use crate::{
    error::SongError,
    note::EditOutcome,
    search,
    time::{DEFAULT_PPQ, Tick},
};

/// Marks a line that has no lyric yet.
pub const PLACEHOLDER_WORD: &str = "^%%^";

/// Span of the placeholder left behind when a line is emptied: two 4/4 bars.
pub const CLEARED_LINE_SPAN: Tick = DEFAULT_PPQ as Tick * 4 * 2;

pub type LyricTokenizer = dyn Fn(&str) -> Vec<String>;

/// Splits text into lyric tokens.
///
/// Whitespace characters and CJK ideographs or kana are single tokens.
/// Punctuation is a token of its own, except an apostrophe directly after an
/// ASCII alphanumeric run, which stays in that run (`don't`). Everything else
/// accumulates into words.
#[must_use]
pub fn default_lyric_tokenizer(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in input.chars() {
        if ch.is_whitespace() || is_cjk(ch) {
            flush(&mut tokens, &mut current);
            tokens.push(ch.to_string());
        } else if is_punctuation(ch) {
            if ch == '\'' && !current.is_empty() && current.chars().all(|c| c.is_ascii_alphanumeric()) {
                current.push(ch);
            } else {
                flush(&mut tokens, &mut current);
                tokens.push(ch.to_string());
            }
        } else {
            current.push(ch);
        }
    }
    flush(&mut tokens, &mut current);
    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch,
        '\u{3040}'..='\u{30ff}'
            | '\u{3400}'..='\u{4dbf}'
            | '\u{4e00}'..='\u{9fff}'
            | '\u{f900}'..='\u{faff}'
            | '\u{ff66}'..='\u{ff9f}'
    )
}

fn is_punctuation(ch: char) -> bool {
    matches!(
        get_general_category(ch),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LyricWord {
    word: String,
    start_tick: Tick,
    end_tick: Tick,
}

impl LyricWord {
    fn new(word: impl Into<String>, start_tick: Tick, end_tick: Tick) -> Self {
        Self {
            word: word.into(),
            start_tick,
            end_tick,
        }
    }

    fn placeholder(start_tick: Tick, end_tick: Tick) -> Self {
        Self::new(PLACEHOLDER_WORD, start_tick, end_tick)
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn start_tick(&self) -> Tick {
        self.start_tick
    }

    #[must_use]
    pub fn end_tick(&self) -> Tick {
        self.end_tick
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.word == PLACEHOLDER_WORD
    }
}

/// One lyric line. Words are sorted by start tick and the list is never
/// empty: an empty line holds a single placeholder word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LyricLine {
    words: Vec<LyricWord>,
}

impl LyricLine {
    fn new(start_tick: Tick, length: Tick) -> Self {
        Self {
            words: vec![LyricWord::placeholder(start_tick, start_tick + length)],
        }
    }

    #[must_use]
    pub fn words(&self) -> &[LyricWord] {
        &self.words
    }

    #[must_use]
    pub fn word_at(&self, index: usize) -> Option<&LyricWord> {
        self.words.get(index)
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Whether the line only holds the placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.words.as_slice(), [only] if only.is_placeholder())
    }

    #[must_use]
    pub fn sentence(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        self.words.iter().map(LyricWord::word).collect()
    }

    #[must_use]
    pub fn start_tick(&self) -> Tick {
        self.words.first().map_or(0, LyricWord::start_tick)
    }

    #[must_use]
    pub fn end_tick(&self) -> Tick {
        self.words
            .iter()
            .map(LyricWord::end_tick)
            .max()
            .unwrap_or(0)
    }

    /// Adds a word, replacing the placeholder of an empty line. Returns the
    /// word's index.
    pub fn create_word(&mut self, word: impl Into<String>, start_tick: Tick, end_tick: Tick) -> usize {
        if self.is_empty() {
            self.words.clear();
        }
        let index = search::first_gt(&self.words, &start_tick, |word| word.start_tick);
        self.words
            .insert(index, LyricWord::new(word, start_tick, end_tick));
        index
    }

    /// Replaces the words with the tokens of `text`, spread evenly over
    /// `[start_tick, end_tick]`. The last token absorbs the rounding so it
    /// ends exactly at `end_tick`. Text without tokens or an inverted range
    /// leaves the line as is.
    pub fn set_words_from_string(
        &mut self,
        text: &str,
        start_tick: Tick,
        end_tick: Tick,
        tokenizer: Option<&LyricTokenizer>,
    ) -> bool {
        if end_tick < start_tick {
            warn!(start_tick, end_tick, "lyric reflow rejected for inverted range");
            return false;
        }
        let tokens = match tokenizer {
            Some(tokenize) => tokenize(text),
            None => default_lyric_tokenizer(text),
        };
        if tokens.is_empty() {
            return false;
        }
        let count = tokens.len() as Tick;
        let tick_per_word = (end_tick - start_tick) / count;
        self.words = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| {
                let index = index as Tick;
                let start = start_tick + index * tick_per_word;
                let end = if index == count - 1 {
                    end_tick
                } else {
                    start_tick + (index + 1) * tick_per_word
                };
                LyricWord::new(token, start, end)
            })
            .collect();
        self.sort_words();
        debug!(count, tick_per_word, "lyric line reflowed");
        true
    }

    /// Removes the first word equal to `word`.
    pub fn remove_word(&mut self, word: &LyricWord) -> bool {
        match self.words.iter().position(|existing| existing == word) {
            Some(index) => self.remove_word_at_index(index).is_some(),
            None => false,
        }
    }

    /// Removing the last word leaves a placeholder in its place.
    pub fn remove_word_at_index(&mut self, index: usize) -> Option<LyricWord> {
        if index >= self.words.len() {
            return None;
        }
        if self.words.len() == 1 {
            let removed = self.words[0].clone();
            self.clear();
            return Some(removed);
        }
        Some(self.words.remove(index))
    }

    /// Moves a word's start. A start past the word's end removes the word.
    pub fn set_word_start_tick(&mut self, index: usize, start_tick: Tick) -> EditOutcome {
        let Some(word) = self.words.get_mut(index) else {
            return EditOutcome::NotFound;
        };
        if start_tick > word.end_tick {
            self.remove_word_at_index(index);
            return EditOutcome::Deleted;
        }
        if word.start_tick == start_tick {
            return EditOutcome::Unchanged;
        }
        word.start_tick = start_tick;
        self.sort_words();
        EditOutcome::Updated
    }

    pub fn move_word_to(&mut self, index: usize, start_tick: Tick, end_tick: Tick) -> bool {
        let Some(word) = self.words.get_mut(index) else {
            return false;
        };
        word.start_tick = start_tick;
        word.end_tick = end_tick;
        self.sort_words();
        true
    }

    /// Empty text is refused.
    pub fn set_word_text(&mut self, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        match self.words.get_mut(index) {
            Some(word) if !text.is_empty() => {
                word.word = text;
                true
            }
            _ => false,
        }
    }

    /// Scales every word proportionally into `[start_tick, end_tick]`.
    pub fn move_to(&mut self, start_tick: Tick, end_tick: Tick) {
        let original_start = self.start_tick();
        let original_length = self.end_tick() - original_start;
        let start_tick = start_tick.max(0);
        let end_tick = end_tick.max(start_tick);
        if original_length == 0 {
            for word in &mut self.words {
                word.start_tick = start_tick;
                word.end_tick = end_tick;
            }
            return;
        }
        let ratio = (end_tick - start_tick) as f64 / original_length as f64;
        let scale = |tick: Tick| start_tick + ((tick - original_start) as f64 * ratio) as Tick;
        for word in &mut self.words {
            word.start_tick = scale(word.start_tick);
            word.end_tick = scale(word.end_tick);
        }
    }

    /// Drops every word, leaving a placeholder from the current start.
    pub fn clear(&mut self) {
        let start = self.start_tick();
        self.words = vec![LyricWord::placeholder(start, start + CLEARED_LINE_SPAN)];
    }

    fn sort_words(&mut self) {
        self.words.sort_by_key(|word| word.start_tick);
    }
}

fn default_line_length() -> Tick {
    Tick::from(DEFAULT_PPQ)
}

/// Lyric lines of a song, sorted by start tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lyrics {
    #[serde(default)]
    lines: Vec<LyricLine>,
    /// Placeholder length of a freshly created line.
    #[serde(default = "default_line_length")]
    new_line_length: Tick,
}

impl Default for Lyrics {
    fn default() -> Self {
        Self::with_line_length(default_line_length())
    }
}

impl Lyrics {
    #[must_use]
    pub fn with_line_length(new_line_length: Tick) -> Self {
        Self {
            lines: Vec::new(),
            new_line_length: new_line_length.max(1),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn line_at(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    /// Adds an empty line and returns its index.
    pub fn create_line(&mut self, start_tick: Tick) -> usize {
        self.insert_line(LyricLine::new(start_tick, self.new_line_length))
    }

    pub fn create_line_from_string(
        &mut self,
        text: &str,
        start_tick: Tick,
        end_tick: Tick,
        tokenizer: Option<&LyricTokenizer>,
    ) -> usize {
        let mut line = LyricLine::new(start_tick, self.new_line_length);
        line.set_words_from_string(text, start_tick, end_tick, tokenizer);
        self.insert_line(line)
    }

    /// Index of the latest line whose range covers `tick`.
    #[must_use]
    pub fn line_index_at_tick(&self, tick: Tick) -> Option<usize> {
        let last = search::last_le(&self.lines, &tick, LyricLine::start_tick)?;
        (0..=last)
            .rev()
            .find(|&index| tick <= self.lines[index].end_tick())
    }

    pub fn remove_line_at_index(&mut self, index: usize) -> Option<LyricLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    /// Copies a line and returns the index of the copy.
    pub fn clone_line(&mut self, index: usize) -> Option<usize> {
        let copy = self.lines.get(index)?.clone();
        Some(self.insert_line(copy))
    }

    /// Runs `edit` on one line, re-sorting the lines if its start moved.
    pub fn edit_line<R>(&mut self, index: usize, edit: impl FnOnce(&mut LyricLine) -> R) -> Option<R> {
        let line = self.lines.get_mut(index)?;
        let before = line.start_tick();
        let result = edit(line);
        if line.start_tick() != before {
            self.sort_lines();
        }
        Some(result)
    }

    pub fn sort_lines(&mut self) {
        self.lines.sort_by_key(LyricLine::start_tick);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Rejects empty lines and inverted words in a deserialized document,
    /// then restores word and line order.
    pub(crate) fn validate(&mut self) -> Result<(), SongError> {
        for (index, line) in self.lines.iter_mut().enumerate() {
            if line.words.is_empty()
                || line
                    .words
                    .iter()
                    .any(|word| word.end_tick < word.start_tick)
            {
                return Err(SongError::InvalidLyricLine(index));
            }
            line.sort_words();
        }
        self.sort_lines();
        Ok(())
    }

    fn insert_line(&mut self, line: LyricLine) -> usize {
        let index = search::first_gt(&self.lines, &line.start_tick(), LyricLine::start_tick);
        self.lines.insert(index, line);
        index
    }
}
