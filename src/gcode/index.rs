//! Resolved XY positions in program order, for picking and selection.

use serde::Serialize;

use crate::models::Point2;

/// One indexed position. Copies, not references, of what resolution computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateEntry {
    pub line_number: usize,
    pub figure: Option<u32>,
    pub position: Point2,
    /// The entry is an arc centre rather than a path point.
    pub arc_center: bool,
}

/// Which index a nearest hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    Program,
    Landmark,
}

/// Result of a nearest-coordinate query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestHit {
    pub line_number: usize,
    pub figure: Option<u32>,
    pub position: Point2,
    pub distance: f64,
    pub source: HitSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinateIndex {
    entries: Vec<CoordinateEntry>,
}

impl CoordinateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CoordinateEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CoordinateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry closest to `query`. Ties go to the earliest entry.
    pub fn nearest(&self, query: Point2, source: HitSource) -> Option<NearestHit> {
        let mut best: Option<NearestHit> = None;
        for entry in &self.entries {
            let distance = entry.position.distance(query);
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(NearestHit {
                    line_number: entry.line_number,
                    figure: entry.figure,
                    position: entry.position,
                    distance,
                    source,
                });
            }
        }
        best
    }

    /// First and last line number of the first contiguous run of entries
    /// belonging to `figure`.
    pub fn figure_line_range(&self, figure: u32) -> Option<(usize, usize)> {
        let start = self
            .entries
            .iter()
            .position(|e| e.figure == Some(figure))?;
        let run = self.entries[start..]
            .iter()
            .take_while(|e| e.figure == Some(figure));
        let first = self.entries[start].line_number;
        let last = run.last().map_or(first, |e| e.line_number);
        Some((first, last))
    }

    /// Path position and figure recorded for `line_number`, skipping arc
    /// centres.
    pub fn locate_line(&self, line_number: usize) -> Option<&CoordinateEntry> {
        self.entries
            .iter()
            .find(|e| e.line_number == line_number && !e.arc_center)
    }

    /// Copy of the index with every position moved by `offset`.
    pub fn translated(&self, offset: Point2) -> CoordinateIndex {
        CoordinateIndex {
            entries: self
                .entries
                .iter()
                .map(|e| CoordinateEntry {
                    position: e.position + offset,
                    ..*e
                })
                .collect(),
        }
    }
}
