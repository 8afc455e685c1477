//! Active scintillator aggregation.

use log::debug;

use crate::geometry::GeometryMapper;
use crate::record::{Hit, Record, SignalChannel, SlotRef};
use crate::store::ActiveScintillators;

/// Collects the slots fired by a record.
pub struct ScintillatorAggregator<'a, G: ?Sized> {
    geometry: &'a G,
}

impl<'a, G: GeometryMapper + ?Sized> ScintillatorAggregator<'a, G> {
    pub fn new(geometry: &'a G) -> Self {
        Self { geometry }
    }

    /// Builds the deduplicated per-layer set of slots fired by `record`.
    ///
    /// Channels that cannot be resolved to a mapped slot are skipped.
    pub fn aggregate(&self, record: &Record) -> ActiveScintillators {
        let mut selection = ActiveScintillators::new();
        self.collect(record, &mut selection);
        selection
    }

    fn collect(&self, record: &Record, selection: &mut ActiveScintillators) {
        match record {
            Record::SignalChannel(channel) => self.add_channel(channel, selection),
            Record::RawSignal(signal) => {
                for channel in signal.channels() {
                    self.add_channel(channel, selection);
                }
            }
            Record::Hit(hit) => self.add_hit(hit, selection),
            Record::Event(event) => {
                for hit in &event.hits {
                    self.add_hit(hit, selection);
                }
            }
            Record::TimeWindow(window) => {
                for sub_event in &window.events {
                    self.collect(sub_event, selection);
                }
            }
            Record::Unknown => {}
        }
    }

    fn add_channel(&self, channel: &SignalChannel, selection: &mut ActiveScintillators) {
        match channel.slot_ref() {
            Some(slot) => self.add_slot(slot, selection),
            None => debug!(
                "skipping threshold {} channel without a slot reference",
                channel.threshold_number
            ),
        }
    }

    fn add_hit(&self, hit: &Hit, selection: &mut ActiveScintillators) {
        match &hit.slot {
            Some(slot) => self.add_slot(slot, selection),
            None => debug!("skipping hit without a slot reference"),
        }
    }

    fn add_slot(&self, slot: &SlotRef, selection: &mut ActiveScintillators) {
        match self.geometry.locate(slot) {
            Some(pos) => {
                selection.insert(pos);
            }
            None => debug!("slot {} is outside the geometry", slot.id),
        }
    }
}
