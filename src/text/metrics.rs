/// Horizontal text measurement used by the layout engine.
///
/// Implementations may cache shaped results internally; the reported advances must be a pure
/// function of the input string.
pub trait FontMetrics {
    /// Advance width of `word` in pixels.
    fn advance(&mut self, word: &str) -> f32;

    /// Advance width of a single space.
    fn space_width(&mut self) -> f32 {
        self.advance(" ")
    }
}

/// Monospace approximation: every character has the same advance.
///
/// Useful for previews that only need highlight timing and rough line breaks, and for tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMetrics {
    pub char_advance: f32,
    pub space_advance: f32,
}

impl FixedAdvanceMetrics {
    pub fn new(char_advance: f32) -> Self {
        Self {
            char_advance,
            space_advance: char_advance,
        }
    }

    /// Rough average advance of a proportional sans face at `font_size_px`.
    pub fn approximate(font_size_px: f32) -> Self {
        Self {
            char_advance: font_size_px * 0.55,
            space_advance: font_size_px * 0.28,
        }
    }
}

impl FontMetrics for FixedAdvanceMetrics {
    fn advance(&mut self, word: &str) -> f32 {
        word.chars().count() as f32 * self.char_advance
    }

    fn space_width(&mut self) -> f32 {
        self.space_advance
    }
}
