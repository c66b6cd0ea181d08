use serde::{Deserialize, Serialize};

/// Which side of a replaced span a mapped position resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    /// Resolve to the boundary before the replacement.
    Start,
    /// Resolve to the boundary after the replacement.
    #[default]
    End,
}

/// Outcome of mapping one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// Whether the position sat strictly inside a removed span.
    pub deleted: bool,
}

/// One edited span: `len` positions starting at `start` (pre-edit
/// coordinates) were replaced by `inserted` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRange {
    pub start: usize,
    pub len: usize,
    pub inserted: usize,
}

/// Ordered, non-overlapping description of how a single edit transforms
/// old positions into new ones.
///
/// Segments are kept in ascending anchor order regardless of the order
/// the edit touched them in, so a backward move and a forward move encode
/// their two spans the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepMap {
    ranges: Vec<MapRange>,
}

/// Anything positions can be mapped through: a single [`StepMap`] or a
/// whole [`Mapping`].
pub trait Mappable {
    fn map_result(&self, pos: usize, bias: Bias) -> MapResult;

    fn map(&self, pos: usize, bias: Bias) -> usize {
        self.map_result(pos, bias).pos
    }
}

impl StepMap {
    /// Build a map from edit segments, sorting them into ascending anchor
    /// order. Segments must not overlap.
    pub fn new(mut ranges: Vec<MapRange>) -> Self {
        ranges.sort_by_key(|range| range.start);
        debug_assert!(
            ranges
                .windows(2)
                .all(|pair| pair[0].start + pair[0].len <= pair[1].start),
            "step map segments overlap"
        );
        Self { ranges }
    }

    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    /// Map a position through this edit.
    ///
    /// A pure fold over the segments: positions before a segment are
    /// untouched, positions inside a removed span resolve to the
    /// replacement boundary picked by `bias`, positions past a segment
    /// accumulate its net length delta.
    pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.len;
            if pos <= end {
                let side = if range.len == 0 {
                    bias
                } else if pos == range.start {
                    Bias::Start
                } else if pos == end {
                    Bias::End
                } else {
                    bias
                };
                let base = range.start as isize + diff;
                let mapped = match side {
                    Bias::Start => base,
                    Bias::End => base + range.inserted as isize,
                };
                return MapResult {
                    pos: mapped as usize,
                    deleted: pos > range.start && pos < end,
                };
            }
            diff += range.inserted as isize - range.len as isize;
        }
        MapResult {
            pos: (pos as isize + diff) as usize,
            deleted: false,
        }
    }

    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        self.map_result(pos, bias).pos
    }
}

impl Mappable for StepMap {
    fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
        StepMap::map_result(self, pos, bias)
    }
}

/// An ordered sequence of step maps, applied left to right.
///
/// This is the cumulative map a transaction exposes so pending positions
/// and steps can be rebased over everything applied before them.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
        let mut result = MapResult { pos, deleted: false };
        for map in &self.maps {
            let step = map.map_result(result.pos, bias);
            result = MapResult {
                pos: step.pos,
                deleted: result.deleted || step.deleted,
            };
        }
        result
    }

    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        self.map_result(pos, bias).pos
    }
}

impl Mappable for Mapping {
    fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
        Mapping::map_result(self, pos, bias)
    }
}
