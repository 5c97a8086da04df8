//! A parsed program: the source lines, the order they execute in once
//! subroutine calls are inlined, and everything resolution derives from that.

use super::bounds::BoundingBox;
use super::config::{EngineConfig, MarkerConfig};
use super::index::CoordinateIndex;
use super::instruction::Instruction;
use super::modal::ModalState;
use super::parser::parse_line;
use super::resolver::PositionResolver;
use super::subroutine::{HideTracker, SubroutineExpander};
use crate::models::MachineSnapshot;

/// One entry of the execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A top-level source line, by index into [`Program::lines`].
    Line(usize),
    /// A body line inlined at a call site. `definition` indexes the source
    /// line it was copied from.
    Body {
        definition: usize,
        instruction: Instruction,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    lines: Vec<Instruction>,
    steps: Vec<Step>,
    contains_arcs: bool,
    contains_relative: bool,
    bounds: BoundingBox,
    index: CoordinateIndex,
    figures: u32,
}

impl Program {
    /// Parses program text, expands subroutine calls and resolves positions.
    pub fn parse(text: &str, config: &EngineConfig, machine: &MachineSnapshot) -> Program {
        let raw: Vec<&str> = text.lines().collect();
        Self::parse_lines(&raw, config, machine)
    }

    pub fn parse_lines(raw: &[&str], config: &EngineConfig, machine: &MachineSnapshot) -> Program {
        let markers = &config.markers;
        let mut expander = SubroutineExpander::new(raw, &config.subroutines, markers);
        let mut modal = ModalState::new();
        let mut hide = HideTracker::default();
        let mut after_end = false;

        let mut lines = Vec::with_capacity(raw.len());
        let mut steps = Vec::with_capacity(raw.len());

        for (n, text) in raw.iter().enumerate() {
            let hidden = hide.observe(text, markers);
            let mut instr = parse_line(n, text, &mut modal);
            instr.hidden = hidden;
            instr.footer = MarkerConfig::matches(&markers.setup_footer, &text.to_uppercase());
            instr.after_program_end = after_end;
            after_end |= instr.program_end;

            let call = instr.call.filter(|_| !instr.after_program_end);
            lines.push(instr);
            steps.push(Step::Line(n));

            if let Some(call) = call {
                steps.extend(expander.expand(call, n, hidden, &mut modal, 1));
            }
        }

        let mut program = Program {
            lines,
            steps,
            contains_arcs: modal.contains_arc,
            contains_relative: modal.contains_relative,
            ..Program::default()
        };
        program.resolve(machine);
        tracing::debug!(
            lines = program.lines.len(),
            steps = program.steps.len(),
            figures = program.figures,
            "program parsed"
        );
        program
    }

    /// A program whose execution order is exactly `lines`, resolved. Used
    /// for already-flattened instruction lists.
    pub fn from_instructions(lines: Vec<Instruction>, machine: &MachineSnapshot) -> Program {
        let mut program = Program {
            steps: (0..lines.len()).map(Step::Line).collect(),
            contains_arcs: lines.iter().any(|l| l.motion.is_arc()),
            contains_relative: lines.iter().any(|l| !l.absolute),
            lines,
            ..Program::default()
        };
        program.resolve(machine);
        program
    }

    /// Recomputes positions, bounds, figures and the coordinate index from
    /// the current instruction fields. Body copies pick up the coordinate
    /// words of a modified definition line first.
    pub fn resolve(&mut self, machine: &MachineSnapshot) {
        let mut resolver = PositionResolver::new(machine);
        for step in self.steps.iter_mut() {
            match step {
                Step::Line(i) => resolver.resolve(&mut self.lines[*i]),
                Step::Body {
                    definition,
                    instruction,
                } => {
                    let def = &self.lines[*definition];
                    if def.modified {
                        instruction.axes = def.axes;
                        instruction.i = def.i;
                        instruction.j = def.j;
                        if def.motion.is_arc() && instruction.motion.is_arc() {
                            instruction.motion = def.motion;
                        }
                        instruction.modified = true;
                    }
                    resolver.resolve(instruction);
                }
            }
        }
        self.figures = resolver.figure_count();
        (self.bounds, self.index) = resolver.finish();
    }

    /// Top-level lines, one per source line, in source order.
    pub fn lines(&self) -> &[Instruction] {
        &self.lines
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [Instruction] {
        &mut self.lines
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Instructions in execution order, body copies included.
    pub fn executed(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.steps.iter().map(move |step| match step {
            Step::Line(i) => &self.lines[*i],
            Step::Body { instruction, .. } => instruction,
        })
    }

    /// Execution order as a flat list: body copies are inlined, call lines
    /// become comments and lines after program end are commented out.
    pub fn flattened(&self) -> Vec<Instruction> {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Line(i) => {
                    let line = &self.lines[*i];
                    if line.after_program_end {
                        commented(line, format!("( {} )", line.text.trim()))
                    } else if line.call.is_some() {
                        commented(line, format!("({})", line.text.trim()))
                    } else {
                        line.clone()
                    }
                }
                Step::Body { instruction, .. } if instruction.call.is_some() => {
                    commented(instruction, format!("({})", instruction.text.trim()))
                }
                Step::Body { instruction, .. } => instruction.clone(),
            })
            .collect()
    }

    /// Inserts `instr` as a new top-level line before line index `at`. The
    /// program must be resolved again afterwards.
    pub fn insert_line(&mut self, at: usize, instr: Instruction) {
        let at = at.min(self.lines.len());
        for step in self.steps.iter_mut() {
            match step {
                Step::Line(i) if *i >= at => *i += 1,
                Step::Body { definition, .. } if *definition >= at => *definition += 1,
                _ => {}
            }
        }
        let position = self
            .steps
            .iter()
            .position(|s| matches!(s, Step::Line(i) if *i > at))
            .unwrap_or(self.steps.len());
        self.steps.insert(position, Step::Line(at));
        self.lines.insert(at, instr);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn index(&self) -> &CoordinateIndex {
        &self.index
    }

    pub fn contains_arcs(&self) -> bool {
        self.contains_arcs
    }

    pub fn contains_relative(&self) -> bool {
        self.contains_relative
    }

    pub fn figure_count(&self) -> u32 {
        self.figures
    }
}

/// An inert stand-in for `line` that only carries `text`.
fn commented(line: &Instruction, text: String) -> Instruction {
    let mut out = Instruction::inert(line.line_number, text);
    out.feed_rate = line.feed_rate;
    out.spindle_speed = line.spindle_speed;
    out.absolute = line.absolute;
    out.motion = line.motion;
    out.subroutine_body = line.subroutine_body;
    out.hidden = line.hidden;
    out
}
