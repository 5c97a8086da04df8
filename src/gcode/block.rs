use super::config::FormatConfig;
use super::formatter::format_number;
use super::instruction::Axis;

/// The value carried by a single G-code word.
#[derive(Debug, Clone, PartialEq)]
pub enum WordValue {
    Coord(f64),
    /// Pre-rendered word, emitted as-is (`G90`, `M3`, `N10`).
    Raw(String),
}

/// A single G-code word: a letter paired with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub letter: char,
    pub value: WordValue,
}

impl Word {
    pub fn coord(letter: char, value: f64) -> Self {
        Word {
            letter,
            value: WordValue::Coord(value),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into();
        Word {
            letter: text.chars().next().unwrap_or(' '),
            value: WordValue::Raw(text),
        }
    }
}

/// A single regenerated line, holding words in canonical order and an
/// optional comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    words: Vec<Word>,
    comment: Option<String>,
}

impl Block {
    /// Renders the block as one line of text, without a line terminator.
    /// Words are separated by a single space; the comment is written with
    /// the delimiters it was read with.
    pub fn render(&self, fmt: &FormatConfig) -> String {
        let mut parts: Vec<String> = self.words.iter().map(|w| render_word(w, fmt)).collect();
        if let Some(text) = &self.comment {
            parts.push(text.clone());
        }
        parts.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.comment.is_none()
    }
}

fn render_word(word: &Word, fmt: &FormatConfig) -> String {
    match &word.value {
        WordValue::Coord(v) => format!("{}{}", word.letter, format_number(*v, fmt)),
        WordValue::Raw(s) => s.clone(),
    }
}

/// Builds a [`Block`] by accumulating words in named slots, then emitting them
/// in canonical order on [`build`](BlockBuilder::build):
///
/// N label → motion G → other G-codes → X Y Z A B C U V W → I J → F → S → other words → comment
#[derive(Debug, Default)]
pub struct BlockBuilder {
    label: Option<String>,
    motion: Option<String>,
    g_codes: Vec<String>,
    axes: [Option<f64>; 9],
    i: Option<f64>,
    j: Option<f64>,
    feed_val: Option<f64>,
    spindle_speed: Option<f64>,
    others: Vec<String>,
    comment_text: Option<String>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        BlockBuilder::default()
    }

    /// Sets the `N` word, emitted first.
    pub fn label(mut self, word: &str) -> Self {
        self.label = Some(word.to_string());
        self
    }

    /// Sets the motion G-code (e.g., `"G0"`, `"G1"`, `"G2"`).
    pub fn motion(mut self, code: &str) -> Self {
        self.motion = Some(code.to_string());
        self
    }

    /// Adds an additional G-code word (e.g., `"G90"`, `"G17"`).
    pub fn g(mut self, code: &str) -> Self {
        self.g_codes.push(code.to_string());
        self
    }

    pub fn axis(mut self, axis: Axis, value: f64) -> Self {
        self.axes[axis as usize] = Some(value);
        self
    }

    /// Adds an arc centre offset. `letter` must be I or J (case-insensitive).
    pub fn arc_param(mut self, letter: char, value: f64) -> Self {
        match letter.to_ascii_uppercase() {
            'I' => self.i = Some(value),
            'J' => self.j = Some(value),
            _ => {}
        }
        self
    }

    /// Sets the feed rate F word.
    pub fn feed(mut self, value: f64) -> Self {
        self.feed_val = Some(value);
        self
    }

    /// Sets the spindle speed S word.
    pub fn spindle(mut self, value: f64) -> Self {
        self.spindle_speed = Some(value);
        self
    }

    /// Adds a word emitted after S, in call order (`M3`, `T1`, `P100`).
    pub fn word(mut self, text: &str) -> Self {
        self.others.push(text.to_string());
        self
    }

    /// Sets the comment, including its delimiters.
    pub fn comment(mut self, text: &str) -> Self {
        self.comment_text = Some(text.to_string());
        self
    }

    /// Consumes the builder and produces a [`Block`] with words in canonical order.
    pub fn build(self) -> Block {
        let mut words: Vec<Word> = Vec::with_capacity(16 + self.g_codes.len() + self.others.len());

        if let Some(label) = self.label {
            words.push(Word::raw(label));
        }

        if let Some(code) = self.motion {
            words.push(Word::raw(code));
        }

        for code in self.g_codes {
            words.push(Word::raw(code));
        }

        for (axis, opt_val) in Axis::ALL.into_iter().zip(self.axes) {
            if let Some(v) = opt_val {
                words.push(Word::coord(axis.letter(), v));
            }
        }

        for (letter, opt_val) in [('I', self.i), ('J', self.j)] {
            if let Some(v) = opt_val {
                words.push(Word::coord(letter, v));
            }
        }

        if let Some(v) = self.feed_val {
            words.push(Word::coord('F', v));
        }

        if let Some(v) = self.spindle_speed {
            words.push(Word::coord('S', v));
        }

        for text in self.others {
            words.push(Word::raw(text));
        }

        Block {
            words,
            comment: self.comment_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> FormatConfig {
        FormatConfig::default()
    }

    // -------------------------------------------------------------------------
    // Word order
    // -------------------------------------------------------------------------

    #[test]
    fn canonical_word_order_full_block() {
        let block = BlockBuilder::new()
            .comment("(finish)")
            .word("M3")
            .spindle(12000.0)
            .feed(500.0)
            .arc_param('J', 10.0)
            .arc_param('I', 5.0)
            .axis(Axis::Z, -1.0)
            .axis(Axis::X, 10.0)
            .axis(Axis::Y, 20.0)
            .g("G90")
            .motion("G2")
            .label("N40")
            .build();

        assert_eq!(
            block.render(&fmt()),
            "N40 G2 G90 X10 Y20 Z-1 I5 J10 F500 S12000 M3 (finish)"
        );
    }

    #[test]
    fn rotary_and_auxiliary_axes_follow_xyz() {
        let block = BlockBuilder::new()
            .axis(Axis::W, 1.0)
            .axis(Axis::A, 90.0)
            .axis(Axis::X, 0.0)
            .build();
        assert_eq!(block.render(&fmt()), "X0 A90 W1");
    }

    #[test]
    fn other_words_keep_call_order() {
        let block = BlockBuilder::new().word("T2").word("M6").build();
        assert_eq!(block.render(&fmt()), "T2 M6");
    }

    // -------------------------------------------------------------------------
    // Formatting
    // -------------------------------------------------------------------------

    #[test]
    fn coordinates_use_configured_precision() {
        let block = BlockBuilder::new().axis(Axis::X, 1.23456).build();
        assert_eq!(block.render(&fmt()), "X1.235");

        let fixed = FormatConfig {
            decimal_places: 2,
            strip_trailing_zeros: false,
            leading_zero_suppression: true,
        };
        let block = BlockBuilder::new().axis(Axis::X, 0.5).build();
        assert_eq!(block.render(&fixed), "X.50");
    }

    #[test]
    fn comment_only_block() {
        let block = BlockBuilder::new().comment("; spindle warm-up").build();
        assert!(!block.is_empty());
        assert_eq!(block.render(&fmt()), "; spindle warm-up");
    }

    #[test]
    fn empty_builder_renders_empty_line() {
        let block = BlockBuilder::new().build();
        assert!(block.is_empty());
        assert_eq!(block.render(&fmt()), "");
    }
}
