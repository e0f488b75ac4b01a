use crate::foundation::math::slot_index;
use crate::text::metrics::FontMetrics;

/// Screen placement of one whitespace-delimited token.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordPosition {
    pub text: String,
    pub line_index: usize,
    /// Left edge relative to the render width.
    pub x_offset: f64,
    /// Top of the word's line relative to the first line.
    pub y_offset: f64,
    pub width: f64,
}

/// Highlight state of a word at a given playback progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordState {
    Past,
    Active,
    Future,
}

/// Ordered per-word positions for one caption text.
///
/// Tokens appear in source order, `y_offset` never decreases, and the words of each line are
/// centered as one group within the render width.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordPositionMap {
    pub words: Vec<WordPosition>,
    pub line_count: usize,
    pub line_height: f64,
}

impl WordPositionMap {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|w| w.text.as_str())
    }

    /// Total height of all lines.
    pub fn content_height(&self) -> f64 {
        self.line_count as f64 * self.line_height
    }

    /// `min(floor(progress * N), N - 1)`; `None` for an empty map.
    pub fn active_index(&self, progress: f64) -> Option<usize> {
        if self.words.is_empty() {
            return None;
        }
        Some(slot_index(progress.clamp(0.0, 1.0), self.words.len()))
    }

    pub fn active_word(&self, progress: f64) -> Option<&WordPosition> {
        self.active_index(progress).map(|i| &self.words[i])
    }

    pub fn word_state(&self, index: usize, progress: f64) -> WordState {
        match self.active_index(progress) {
            Some(active) if index < active => WordState::Past,
            Some(active) if index == active => WordState::Active,
            _ => WordState::Future,
        }
    }
}

/// One greedily filled line: `(token, advance)` pairs plus the line's total width.
pub(crate) struct Line<'a> {
    pub(crate) words: Vec<(&'a str, f64)>,
    pub(crate) width: f64,
}

/// Greedy line fill shared by caption layout and title wrapping.
///
/// A word joins the current line while `width + space + advance < max_width`. A word wider than
/// `max_width` ends up alone on its own line.
pub(crate) fn break_lines<'a>(
    text: &'a str,
    max_width: f64,
    metrics: &mut dyn FontMetrics,
) -> (Vec<Line<'a>>, f64) {
    let space = f64::from(metrics.space_width());
    let mut lines = Vec::new();
    let mut current: Option<Line<'a>> = None;

    for token in text.split_whitespace() {
        let advance = f64::from(metrics.advance(token));
        match current.as_mut() {
            Some(line) if line.width + space + advance < max_width => {
                line.words.push((token, advance));
                line.width += space + advance;
            }
            _ => {
                if let Some(done) = current.take() {
                    lines.push(done);
                }
                current = Some(Line {
                    words: vec![(token, advance)],
                    width: advance,
                });
            }
        }
    }
    if let Some(done) = current {
        lines.push(done);
    }
    (lines, space)
}

/// Lay out `text` into centered caption lines.
///
/// `max_width` bounds the line fill, `render_width` is the width lines are centered in, and every
/// line is `line_height` tall. Pure: identical inputs give identical maps.
pub fn layout(
    text: &str,
    max_width: f64,
    render_width: f64,
    line_height: f64,
    metrics: &mut dyn FontMetrics,
) -> WordPositionMap {
    let (lines, space) = break_lines(text, max_width, metrics);

    let mut words = Vec::new();
    for (line_index, line) in lines.iter().enumerate() {
        let y_offset = line_index as f64 * line_height;
        let mut x = (render_width - line.width) / 2.0;
        for (i, &(token, advance)) in line.words.iter().enumerate() {
            if i > 0 {
                x += space;
            }
            words.push(WordPosition {
                text: token.to_string(),
                line_index,
                x_offset: x,
                y_offset,
                width: advance,
            });
            x += advance;
        }
    }

    WordPositionMap {
        words,
        line_count: lines.len(),
        line_height,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
