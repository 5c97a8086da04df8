//! Program text output. Unmodified lines are copied byte-for-byte; modified
//! lines are regenerated from their fields in canonical word order.

use super::arcs::linearize;
use super::block::BlockBuilder;
use super::config::FormatConfig;
use super::instruction::Instruction;
use super::modal::EmitTracker;
use super::program::Program;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SerializeOptions {
    /// Replace transformable arcs and long linear feed moves by linear moves
    /// no longer than this.
    pub linearize_step: Option<f64>,
}

/// Serializes the top-level lines of `program`.
pub fn serialize(program: &Program, fmt: &FormatConfig) -> String {
    serialize_lines(program.lines(), fmt, SerializeOptions::default())
}

/// Serializes `lines` in order, one output line each (arcs and long feed
/// moves may expand to several when linearizing). Lines are joined with `\n`
/// and the text ends with a newline unless it is empty.
pub fn serialize_lines(lines: &[Instruction], fmt: &FormatConfig, options: SerializeOptions) -> String {
    let mut tracker = EmitTracker::at_program_start();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    for instr in lines {
        match options.linearize_step {
            Some(step) if instr.is_transformable() => {
                let pieces = linearize(std::slice::from_ref(instr), step, Some(step), fmt.decimal_places);
                for piece in &pieces {
                    out.push(emit(piece, fmt, &mut tracker));
                }
            }
            _ => out.push(emit(instr, fmt, &mut tracker)),
        }
    }

    if out.is_empty() {
        return String::new();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn emit(instr: &Instruction, fmt: &FormatConfig, tracker: &mut EmitTracker) -> String {
    if instr.modified {
        return render_instruction(instr, fmt, tracker);
    }
    tracker.observe(instr.feed_rate, instr.spindle_speed);
    instr.text.clone()
}

/// Regenerates one line from its fields. Feed and spindle words are written
/// only when they change the value `tracker` has in effect.
pub fn render_instruction(instr: &Instruction, fmt: &FormatConfig, tracker: &mut EmitTracker) -> String {
    let mut block = BlockBuilder::new();

    if let Some(label) = &instr.words.line_label {
        block = block.label(label);
    }
    if let Some(code) = instr.motion.g_code() {
        block = block.motion(&format!("G{code}"));
    }
    for code in &instr.words.g_words {
        block = block.g(code);
    }
    for (axis, value) in instr.axes.iter() {
        block = block.axis(axis, value);
    }
    if let Some(i) = instr.i {
        block = block.arc_param('I', i);
    }
    if let Some(j) = instr.j {
        block = block.arc_param('J', j);
    }
    if tracker.should_emit_feed(instr.feed_rate) {
        block = block.feed(instr.feed_rate);
    }
    if tracker.should_emit_spindle(instr.spindle_speed) {
        block = block.spindle(instr.spindle_speed);
    }
    for word in &instr.words.other {
        block = block.word(word);
    }
    if let Some(comment) = &instr.words.comment {
        block = block.comment(comment);
    }

    block.build().render(fmt)
}
