//! `M98`/`M99` expansion.
//!
//! Bodies are located by their `O` label and run up to (not including) the
//! next `M99`. Each inlined line is parsed again with the modal state in
//! effect at the call, so sticky state flows into and out of the body.
//!
//! The expander remembers the last body it located. A repeated call to the
//! same id reuses that range without searching, which assumes a program never
//! defines two bodies with one id and relies on the search order to pick
//! between them.

use std::ops::Range;

use super::config::{MarkerConfig, SubroutineConfig};
use super::instruction::SubroutineCall;
use super::modal::ModalState;
use super::parser::parse_line;
use super::program::Step;

/// Tracks hide-marker sections while lines are read in order. The start
/// marker line is hidden, the stop marker line is not.
#[derive(Debug, Default)]
pub struct HideTracker {
    hidden: bool,
}

impl HideTracker {
    pub fn observe(&mut self, raw: &str, markers: &MarkerConfig) -> bool {
        let upper = raw.to_uppercase();
        if MarkerConfig::matches(&markers.hide_start, &upper) {
            self.hidden = true;
        } else if MarkerConfig::matches(&markers.hide_stop, &upper) {
            self.hidden = false;
        }
        self.hidden
    }
}

pub struct SubroutineExpander<'a> {
    raw: &'a [&'a str],
    config: &'a SubroutineConfig,
    markers: &'a MarkerConfig,
    /// `(line, id)` of every `O` label, in program order.
    labels: Vec<(usize, u32)>,
    /// Lines carrying `M99`, in program order.
    returns: Vec<usize>,
    /// Last located body: id and its line range.
    cache: Option<(u32, Range<usize>)>,
}

impl<'a> SubroutineExpander<'a> {
    pub fn new(raw: &'a [&'a str], config: &'a SubroutineConfig, markers: &'a MarkerConfig) -> Self {
        let mut labels = Vec::new();
        let mut returns = Vec::new();
        for (n, line) in raw.iter().enumerate() {
            let instr = parse_line(n, line, &mut ModalState::new());
            if let Some(id) = instr.label {
                labels.push((n, id));
            }
            if instr.returns {
                returns.push(n);
            }
        }
        Self {
            raw,
            config,
            markers,
            labels,
            returns,
            cache: None,
        }
    }

    /// Body range for the first label `id` at or after line `from`.
    fn search(&self, id: u32, from: usize) -> Option<Range<usize>> {
        let (label_line, _) = self
            .labels
            .iter()
            .find(|(line, label)| *label == id && *line >= from)?;
        let end = self.returns.iter().find(|r| **r > *label_line)?;
        Some(label_line + 1..*end)
    }

    /// Locates the body for `id` called from `call_line`: cache, then a
    /// forward search, then (when configured) a search from the top.
    pub fn locate(&mut self, id: u32, call_line: usize) -> Option<Range<usize>> {
        if let Some((cached_id, range)) = &self.cache {
            if *cached_id == id {
                tracing::debug!(id, "subroutine cache hit");
                return Some(range.clone());
            }
        }

        let found = self
            .search(id, call_line + 1)
            .or_else(|| self.config.rescan.then(|| self.search(id, 0)).flatten())?;
        self.cache = Some((id, found.clone()));
        Some(found)
    }

    /// Inlines the body `call` refers to, `repeat` times. Copies are parsed
    /// with `modal` and returned as execution steps; nested calls are
    /// expanded up to the configured depth. An unknown id expands to nothing.
    pub fn expand(
        &mut self,
        call: SubroutineCall,
        call_line: usize,
        call_hidden: bool,
        modal: &mut ModalState,
        depth: u32,
    ) -> Vec<Step> {
        let Some(body) = self.locate(call.id, call_line) else {
            tracing::warn!(id = call.id, line = call_line, "subroutine not found, call ignored");
            return Vec::new();
        };

        let mut steps = Vec::with_capacity(body.len() * call.repeat as usize);
        for _ in 0..call.repeat {
            let mut hide = HideTracker::default();
            for definition in body.clone() {
                let text = self.raw[definition];
                let hidden = hide.observe(text, self.markers) || call_hidden;
                let mut instruction = parse_line(definition, text, modal);
                instruction.subroutine_body = true;
                instruction.hidden = hidden;
                let nested = instruction.call;
                steps.push(Step::Body {
                    definition,
                    instruction,
                });

                if let Some(nested) = nested {
                    if depth >= self.config.max_depth {
                        tracing::warn!(id = nested.id, line = definition, depth, "subroutine nesting too deep, call ignored");
                    } else {
                        steps.extend(self.expand(nested, definition, hidden, modal, depth + 1));
                    }
                }
            }
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::instruction::Axis;

    fn lines(src: &[&'static str]) -> Vec<&'static str> {
        src.to_vec()
    }

    fn body_values(steps: &[Step]) -> Vec<(usize, Option<f64>)> {
        steps
            .iter()
            .filter_map(|s| match s {
                Step::Body {
                    definition,
                    instruction,
                } => Some((*definition, instruction.axes.get(Axis::X))),
                Step::Line(_) => None,
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Locating bodies
    // -------------------------------------------------------------------------

    #[test]
    fn body_excludes_label_and_return() {
        let raw = lines(&["M98 P7", "M30", "O7", "G1 X1", "G1 X2", "M99"]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        assert_eq!(ex.locate(7, 0), Some(3..5));
    }

    #[test]
    fn backward_definition_needs_rescan() {
        let raw = lines(&["O5", "G1 X1", "M99", "M98 P5"]);
        let markers = MarkerConfig::default();

        let cfg = SubroutineConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        assert_eq!(ex.locate(5, 3), Some(1..2));

        let no_rescan = SubroutineConfig {
            rescan: false,
            ..SubroutineConfig::default()
        };
        let mut ex = SubroutineExpander::new(&raw, &no_rescan, &markers);
        assert_eq!(ex.locate(5, 3), None);
    }

    #[test]
    fn unterminated_body_is_not_found() {
        let raw = lines(&["M98 P1", "M30", "O1", "G1 X1"]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        assert_eq!(ex.locate(1, 0), None);
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    #[test]
    fn repeat_count_inlines_body_that_many_times() {
        let raw = lines(&["G91", "M98 P100 L3", "M30", "O100", "G1 X5", "M99"]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        let mut modal = ModalState::new();
        modal.absolute = false;
        let call = SubroutineCall { id: 100, repeat: 3 };

        let steps = ex.expand(call, 1, false, &mut modal, 1);
        assert_eq!(body_values(&steps), vec![(4, Some(5.0)); 3]);
        assert!(steps.iter().all(|s| matches!(
            s,
            Step::Body { instruction, .. } if instruction.subroutine_body && !instruction.absolute
        )));
    }

    #[test]
    fn unknown_id_expands_to_nothing() {
        let raw = lines(&["M98 P9", "M30"]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        let steps = ex.expand(
            SubroutineCall { id: 9, repeat: 1 },
            0,
            false,
            &mut ModalState::new(),
            1,
        );
        assert!(steps.is_empty());
    }

    #[test]
    fn body_state_leaks_back_to_caller() {
        let raw = lines(&["M98 P2", "M30", "O2", "G91 G1 X1 F300", "M99"]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        let mut modal = ModalState::new();
        ex.expand(SubroutineCall { id: 2, repeat: 1 }, 0, false, &mut modal, 1);
        assert!(!modal.absolute);
        assert_eq!(modal.feed_rate, 300.0);
    }

    #[test]
    fn hide_markers_inside_body_hide_copies() {
        let raw = lines(&[
            "M98 P3",
            "M30",
            "O3",
            "(%START_HIDECODE)",
            "G1 X1",
            "(%STOP_HIDECODE)",
            "G1 X2",
            "M99",
        ]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        let steps = ex.expand(
            SubroutineCall { id: 3, repeat: 1 },
            0,
            false,
            &mut ModalState::new(),
            1,
        );
        let hidden: Vec<bool> = steps
            .iter()
            .map(|s| match s {
                Step::Body { instruction, .. } => instruction.hidden,
                Step::Line(_) => false,
            })
            .collect();
        assert_eq!(hidden, vec![true, true, false, false]);
    }

    #[test]
    fn nested_calls_expand_inside_bodies() {
        let raw = lines(&[
            "M98 P1", "M30", "O1", "G1 X1", "M98 P2", "M99", "O2", "G1 X2", "M99",
        ]);
        let cfg = SubroutineConfig::default();
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        let steps = ex.expand(
            SubroutineCall { id: 1, repeat: 1 },
            0,
            false,
            &mut ModalState::new(),
            1,
        );
        assert_eq!(
            body_values(&steps),
            vec![(3, Some(1.0)), (4, None), (7, Some(2.0))]
        );
    }

    #[test]
    fn cached_body_is_reused_even_when_a_later_definition_shares_the_id() {
        // The nested call at line 5 would find the second O100 by a forward
        // search, but the cache still holds the first body. Recursion stops
        // at max_depth.
        let raw = lines(&[
            "G91", "M98 P100", "M30", "O100", "G1 X1", "M98 P100", "M99", "O100", "G1 X2", "M99",
        ]);
        let cfg = SubroutineConfig {
            max_depth: 2,
            ..SubroutineConfig::default()
        };
        let markers = MarkerConfig::default();
        let mut ex = SubroutineExpander::new(&raw, &cfg, &markers);
        let steps = ex.expand(
            SubroutineCall { id: 100, repeat: 1 },
            1,
            false,
            &mut ModalState::new(),
            1,
        );
        let moves: Vec<_> = body_values(&steps)
            .into_iter()
            .filter(|(_, x)| x.is_some())
            .collect();
        assert_eq!(moves, vec![(4, Some(1.0)), (4, Some(1.0))]);
    }
}
