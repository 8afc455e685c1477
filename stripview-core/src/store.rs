//! Per-step aggregation buffer consumed by the visualization layer.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::diagram::DiagramSeries;
use crate::geometry::StripPosition;
use crate::kind::RecordKind;
use crate::record::HitPosition;

/// Fired slots grouped by layer.
///
/// Layers iterate in ascending order; slots within a layer keep the order in
/// which they were first inserted and never repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveScintillators {
    layers: BTreeMap<i32, Vec<i32>>,
}

impl ActiveScintillators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a position unless it is already present or unmapped.
    ///
    /// Returns `true` if the position was added.
    pub fn insert(&mut self, pos: StripPosition) -> bool {
        if pos.is_unmapped() {
            return false;
        }
        let slots = self.layers.entry(pos.layer).or_default();
        if slots.contains(&pos.slot) {
            return false;
        }
        slots.push(pos.slot);
        true
    }

    /// Unions `other` into this set, keeping first-insertion order.
    pub fn merge(&mut self, other: &ActiveScintillators) {
        for pos in other.positions() {
            self.insert(pos);
        }
    }

    pub fn contains(&self, pos: StripPosition) -> bool {
        self.layers
            .get(&pos.layer)
            .is_some_and(|slots| slots.contains(&pos.slot))
    }

    /// Slots fired in `layer`, in insertion order.
    pub fn layer(&self, layer: i32) -> &[i32] {
        self.layers.get(&layer).map_or(&[], Vec::as_slice)
    }

    /// Iterates `(layer, slots)` in ascending layer order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[i32])> {
        self.layers
            .iter()
            .map(|(&layer, slots)| (layer, slots.as_slice()))
    }

    /// Iterates every stored position, layer by layer.
    pub fn positions(&self) -> impl Iterator<Item = StripPosition> + '_ {
        self.layers.iter().flat_map(|(&layer, slots)| {
            slots.iter().map(move |&slot| StripPosition::new(layer, slot))
        })
    }

    /// Number of stored positions.
    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }
}

impl FromIterator<StripPosition> for ActiveScintillators {
    fn from_iter<I: IntoIterator<Item = StripPosition>>(iter: I) -> Self {
        let mut set = Self::new();
        for pos in iter {
            set.insert(pos);
        }
        set
    }
}

/// Everything extracted for the record currently on display.
///
/// Cleared at the start of every navigation step, filled while the step
/// runs and read by the display until the next step.
#[derive(Debug, Clone, Default)]
pub struct ProcessedData {
    active_scins: ActiveScintillators,
    occupancy: BTreeMap<StripPosition, usize>,
    diagrams: Vec<DiagramSeries>,
    hits: Vec<HitPosition>,
    info: String,
    kind: RecordKind,
}

impl ProcessedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every field to its empty state.
    pub fn clear(&mut self) {
        self.active_scins.clear();
        self.occupancy.clear();
        self.diagrams.clear();
        self.hits.clear();
        self.info.clear();
        self.kind = RecordKind::None;
    }

    /// Unions a sub-record's fired slots into the snapshot.
    ///
    /// Each position in `scins` also counts once towards the occupancy
    /// reported by [`ProcessedData::occupancy_summary`].
    pub fn merge_active_scins(&mut self, scins: &ActiveScintillators) {
        for pos in scins.positions() {
            *self.occupancy.entry(pos).or_insert(0) += 1;
        }
        self.active_scins.merge(scins);
    }

    pub fn merge_diagrams(&mut self, diagrams: Vec<DiagramSeries>) {
        self.diagrams.extend(diagrams);
    }

    pub fn merge_hits(&mut self, hits: Vec<HitPosition>) {
        self.hits.extend(hits);
    }

    pub fn append_info(&mut self, text: &str) {
        self.info.push_str(text);
    }

    pub fn set_kind(&mut self, kind: RecordKind) {
        self.kind = kind;
    }

    #[inline]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    #[inline]
    pub fn active_scins(&self) -> &ActiveScintillators {
        &self.active_scins
    }

    #[inline]
    pub fn diagrams(&self) -> &[DiagramSeries] {
        &self.diagrams
    }

    #[inline]
    pub fn hits(&self) -> &[HitPosition] {
        &self.hits
    }

    #[inline]
    pub fn info(&self) -> &str {
        &self.info
    }

    /// How many folded sub-records fired `pos` in this step.
    pub fn occupancy(&self, pos: StripPosition) -> usize {
        self.occupancy.get(&pos).copied().unwrap_or(0)
    }

    /// Whether nothing has been extracted since the last clear.
    pub fn is_empty(&self) -> bool {
        self.active_scins.is_empty()
            && self.diagrams.is_empty()
            && self.hits.is_empty()
            && self.info.is_empty()
    }

    /// Human-readable count of fired sub-records per layer and slot.
    ///
    /// Empty when no slot fired.
    pub fn occupancy_summary(&self) -> String {
        if self.active_scins.is_empty() {
            return String::new();
        }
        let mut summary = String::from("Active scintillators (layer: slot x count)\n");
        for (layer, slots) in self.active_scins.iter() {
            let _ = write!(summary, "  layer {layer}:");
            for &slot in slots {
                let count = self.occupancy(StripPosition::new(layer, slot));
                let _ = write!(summary, " {slot}x{count}");
            }
            summary.push('\n');
        }
        summary
    }
}
