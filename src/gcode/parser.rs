//! Line tokenizer. Turns one line of text into an [`Instruction`] while
//! updating the sticky [`ModalState`].
//!
//! Parsing never fails: a word whose value does not parse as a number is
//! treated as absent and the rest of the line is still read.

use super::instruction::{Axis, ExtraWords, Instruction, MotionMode, SubroutineCall};
use super::modal::ModalState;

/// Splits a raw line into its uppercased code part and its comments.
///
/// `( … )` groups and everything after `;` are comments; they are returned
/// with their delimiters, joined by a space. A line starting with `%` is
/// entirely inert.
fn split_comments(raw: &str) -> (String, Option<String>) {
    let trimmed = raw.trim();
    if trimmed.starts_with('%') {
        return (String::new(), None);
    }

    let mut code = String::with_capacity(trimmed.len());
    let mut comments: Vec<String> = Vec::new();
    let mut chars = trimmed.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '(' => {
                let mut text = String::from("(");
                for inner in chars.by_ref() {
                    text.push(inner);
                    if inner == ')' {
                        break;
                    }
                }
                comments.push(text);
            }
            ';' => {
                let rest: String = chars.by_ref().collect();
                comments.push(format!(";{rest}"));
            }
            _ => code.push(ch.to_ascii_uppercase()),
        }
    }

    let comment = if comments.is_empty() {
        None
    } else {
        Some(comments.join(" "))
    };
    (code, comment)
}

/// Parses a word value; malformed values are logged and treated as absent.
fn parse_number(letter: char, value: &str, line_number: usize) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(line = line_number, word = %format!("{letter}{value}"), "malformed numeric word ignored");
            None
        }
    }
}

/// Parses a non-negative integral word value (G, M, P, O, L numbers).
fn parse_code(value: &str) -> Option<u32> {
    let v = value.parse::<f64>().ok()?;
    if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

/// Per-line values that do not live in [`ModalState`].
#[derive(Default)]
struct LineWords {
    axes: super::instruction::AxisWords,
    i: Option<f64>,
    j: Option<f64>,
    machine_frame: bool,
    extra: ExtraWords,
}

fn apply_word(
    letter: char,
    value: &str,
    line_number: usize,
    modal: &mut ModalState,
    line: &mut LineWords,
) {
    match letter {
        'G' => {
            let code = parse_code(value);
            match code.and_then(MotionMode::from_g) {
                Some(mode) => {
                    modal.motion = mode;
                    if mode.is_arc() {
                        modal.contains_arc = true;
                    }
                }
                None => {
                    match code {
                        Some(90) => modal.absolute = true,
                        Some(91) => {
                            modal.absolute = false;
                            modal.contains_relative = true;
                        }
                        Some(53) => line.machine_frame = true,
                        _ => {}
                    }
                    line.extra.g_words.push(format!("G{value}"));
                }
            }
        }
        'I' => line.i = parse_number(letter, value, line_number),
        'J' => line.j = parse_number(letter, value, line_number),
        'F' => {
            if let Some(v) = parse_number(letter, value, line_number) {
                modal.feed_rate = v;
            }
        }
        'S' => {
            if let Some(v) = parse_number(letter, value, line_number) {
                modal.spindle_speed = v;
            }
        }
        'M' => {
            if let Some(code @ (2 | 30 | 98 | 99)) = parse_code(value) {
                modal.m_word = Some(code);
            }
            line.extra.other.push(format!("M{value}"));
        }
        'P' | 'O' | 'L' => {
            let code = parse_code(value);
            match letter {
                'P' => modal.p_word = code,
                'O' => modal.o_word = code,
                _ => modal.l_word = code,
            }
            line.extra.other.push(format!("{letter}{value}"));
        }
        'N' => line.extra.line_label = Some(format!("N{value}")),
        _ => match Axis::from_letter(letter) {
            Some(axis) => line
                .axes
                .set(axis, parse_number(letter, value, line_number)),
            None => line.extra.other.push(format!("{letter}{value}")),
        },
    }
}

/// Parses one program line.
///
/// The returned instruction carries the motion mode, distance mode, feed and
/// spindle in effect after this line. Position fields (`origin`, `resolved`,
/// `arc`, `figure`) are left at their defaults for the resolver.
pub fn parse_line(line_number: usize, raw: &str, modal: &mut ModalState) -> Instruction {
    modal.reset_line_words();

    let (code, comment) = split_comments(raw);
    let chars: Vec<char> = code.chars().collect();
    let mut line = LineWords::default();
    line.extra.comment = comment;

    let mut pos = 0;
    while pos < chars.len() {
        let letter = chars[pos];
        pos += 1;
        if !letter.is_ascii_alphabetic() {
            continue;
        }
        while pos < chars.len() && chars[pos] == ' ' {
            pos += 1;
        }
        let start = pos;
        while pos < chars.len()
            && (chars[pos].is_ascii_digit() || matches!(chars[pos], '.' | '-' | '+'))
        {
            pos += 1;
        }
        let value: String = chars[start..pos].iter().collect();
        apply_word(letter, &value, line_number, modal, &mut line);
    }

    let call = match (modal.m_word, modal.p_word) {
        (Some(98), Some(id)) => Some(SubroutineCall {
            id,
            repeat: modal.l_word.unwrap_or(1).max(1),
        }),
        (Some(98), None) => {
            tracing::debug!(line = line_number, "M98 without P word ignored");
            None
        }
        _ => None,
    };

    let mut instr = Instruction::inert(line_number, raw);
    instr.motion = modal.motion;
    instr.axes = line.axes;
    instr.i = line.i;
    instr.j = line.j;
    instr.feed_rate = modal.feed_rate;
    instr.spindle_speed = modal.spindle_speed;
    instr.absolute = modal.absolute;
    instr.machine_frame = line.machine_frame;
    instr.call = call;
    instr.label = modal.o_word;
    instr.returns = modal.m_word == Some(99);
    instr.program_end = matches!(modal.m_word, Some(2 | 30));
    instr.words = line.extra;
    instr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str]) -> Vec<Instruction> {
        let mut modal = ModalState::new();
        lines
            .iter()
            .enumerate()
            .map(|(n, l)| parse_line(n, l, &mut modal))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Words and fields
    // -------------------------------------------------------------------------

    #[test]
    fn reads_motion_axes_and_arc_offsets() {
        let i = &parse(&["G2 X10 Y-5.5 Z1 I0 J5"])[0];
        assert_eq!(i.motion, MotionMode::ArcCw);
        assert_eq!(i.x(), Some(10.0));
        assert_eq!(i.y(), Some(-5.5));
        assert_eq!(i.z(), Some(1.0));
        assert_eq!(i.i, Some(0.0));
        assert_eq!(i.j, Some(5.0));
    }

    #[test]
    fn lowercase_and_padded_words_parse() {
        let i = &parse(&["  g1x1.5 y 2 a90 u-1 "])[0];
        assert_eq!(i.motion, MotionMode::Linear);
        assert_eq!(i.x(), Some(1.5));
        assert_eq!(i.y(), Some(2.0));
        assert_eq!(i.axes.get(Axis::A), Some(90.0));
        assert_eq!(i.axes.get(Axis::U), Some(-1.0));
    }

    #[test]
    fn leading_zero_g_codes_are_motion() {
        let i = &parse(&["G01 X1"])[0];
        assert_eq!(i.motion, MotionMode::Linear);
        assert!(i.words.g_words.is_empty());
    }

    #[test]
    fn absent_is_not_zero() {
        let i = &parse(&["G1 X0"])[0];
        assert_eq!(i.x(), Some(0.0));
        assert_eq!(i.y(), None);
    }

    // -------------------------------------------------------------------------
    // Malformed input
    // -------------------------------------------------------------------------

    #[test]
    fn malformed_number_is_absent_and_parsing_continues() {
        let i = &parse(&["G1 X1-2 Y3 Z."])[0];
        assert_eq!(i.x(), None);
        assert_eq!(i.y(), Some(3.0));
        assert_eq!(i.z(), None);
    }

    #[test]
    fn garbage_does_not_crash() {
        for line in ["", "   ", "X", "G", "#$%^&", "M98", "((((", ";;", "G1 X+-.", "Ω X5"] {
            let _ = parse(&[line]);
        }
        assert_eq!(parse(&["Ω X5"])[0].x(), Some(5.0));
    }

    // -------------------------------------------------------------------------
    // Modal state
    // -------------------------------------------------------------------------

    #[test]
    fn motion_and_distance_mode_are_sticky() {
        let p = parse(&["G91 G1 X1 F300", "X2", "G90", "Y3"]);
        assert_eq!(p[1].motion, MotionMode::Linear);
        assert!(!p[1].absolute);
        assert_eq!(p[1].feed_rate, 300.0);
        assert!(p[3].absolute);
        assert_eq!(p[3].motion, MotionMode::Linear);
    }

    #[test]
    fn subroutine_words_do_not_leak_into_next_line() {
        let mut modal = ModalState::new();
        let call = parse_line(0, "M98 P100 L3", &mut modal);
        assert_eq!(call.call, Some(SubroutineCall { id: 100, repeat: 3 }));
        let next = parse_line(1, "G1 X1", &mut modal);
        assert_eq!(next.call, None);
        assert_eq!(modal.p_word, None);
        assert_eq!(modal.l_word, None);
    }

    #[test]
    fn repeat_count_defaults_to_one_and_is_at_least_one() {
        let p = parse(&["M98 P7", "M98 P7 L0"]);
        assert_eq!(p[0].call.map(|c| c.repeat), Some(1));
        assert_eq!(p[1].call.map(|c| c.repeat), Some(1));
    }

    #[test]
    fn labels_returns_and_program_end() {
        let p = parse(&["O100", "M99", "M30", "M2", "M5"]);
        assert_eq!(p[0].label, Some(100));
        assert!(p[1].returns);
        assert!(p[2].program_end);
        assert!(p[3].program_end);
        assert!(!p[4].program_end);
    }

    #[test]
    fn arcs_and_relative_mode_are_remembered() {
        let mut modal = ModalState::new();
        parse_line(0, "G3 X1 I1", &mut modal);
        parse_line(1, "G91", &mut modal);
        parse_line(2, "G90", &mut modal);
        assert!(modal.contains_arc);
        assert!(modal.contains_relative);
    }

    #[test]
    fn machine_frame_is_line_local() {
        let p = parse(&["G53 G0 X0 Y0", "G0 X1"]);
        assert!(p[0].machine_frame);
        assert!(!p[1].machine_frame);
        assert_eq!(p[0].words.g_words, vec!["G53"]);
    }

    // -------------------------------------------------------------------------
    // Comments and preserved words
    // -------------------------------------------------------------------------

    #[test]
    fn comments_are_kept_with_original_case() {
        let i = &parse(&["G1 X1 (Cut Outline) Y2 ; done"])[0];
        assert_eq!(i.y(), Some(2.0));
        assert_eq!(i.words.comment.as_deref(), Some("(Cut Outline) ; done"));
    }

    #[test]
    fn comment_letters_are_not_words() {
        let i = &parse(&["(X99 Y99)"])[0];
        assert!(!i.has_coordinates());
    }

    #[test]
    fn percent_lines_are_inert() {
        let i = &parse(&["%START_HIDECODE X5"])[0];
        assert!(!i.has_coordinates());
        assert_eq!(i.text, "%START_HIDECODE X5");
    }

    #[test]
    fn unrepresented_words_are_preserved_in_order() {
        let i = &parse(&["N10 G90 G17 T1 M3 S1000 G0 X0"])[0];
        assert_eq!(i.words.line_label.as_deref(), Some("N10"));
        assert_eq!(i.words.g_words, vec!["G90", "G17"]);
        assert_eq!(i.words.other, vec!["T1", "M3"]);
        assert_eq!(i.spindle_speed, 1000.0);
    }

    #[test]
    fn original_text_is_untouched() {
        let raw = "  g1 x1 (Keep Me)  ";
        assert_eq!(parse(&[raw])[0].text, raw);
    }
}
