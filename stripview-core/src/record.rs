//! Detector record types as delivered by a record reader.
//!
//! Records form a small tree: a time window holds sub-events, an event holds
//! hits, a hit holds up to two raw signals (one per sensor side) and a raw
//! signal holds the leading- and trailing-edge signal channels. Every channel
//! points at its sensor slot through a chain of optional links.

use serde::{Deserialize, Serialize};

use crate::kind::RecordKind;

/// Edge of the analog pulse a channel timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Leading,
    Trailing,
}

/// End of a sensor element read out by one readout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Identity of one physical slot in the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub id: u32,
}

impl SlotRef {
    #[inline]
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

/// Sensor (scintillator strip) optionally placed in a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: u32,
    #[serde(default)]
    pub slot: Option<SlotRef>,
}

/// Readout element coupled to one sensor end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadoutElement {
    pub id: u32,
    pub side: Side,
    #[serde(default)]
    pub sensor: Option<Sensor>,
}

/// One digitized threshold crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalChannel {
    /// Comparator number, typically 1..=4.
    pub threshold_number: u32,
    /// Comparator level (mV).
    pub threshold: f64,
    /// Crossing time in raw units (ps).
    pub time: f64,
    pub edge: EdgeType,
    #[serde(default)]
    pub readout: Option<ReadoutElement>,
}

impl SignalChannel {
    /// Follows channel → readout element → sensor → slot.
    ///
    /// Returns `None` as soon as any hop is missing.
    pub fn slot_ref(&self) -> Option<&SlotRef> {
        self.readout
            .as_ref()
            .and_then(|readout| readout.sensor.as_ref())
            .and_then(|sensor| sensor.slot.as_ref())
    }

    /// Side of the readout element, if the channel has one.
    pub fn side(&self) -> Option<Side> {
        self.readout.as_ref().map(|readout| readout.side)
    }
}

/// Leading and trailing threshold crossings of one pulse on one sensor end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    #[serde(default)]
    pub leading: Vec<SignalChannel>,
    #[serde(default)]
    pub trailing: Vec<SignalChannel>,
}

impl RawSignal {
    /// All channels, leading edge first, each list in reader order.
    pub fn channels(&self) -> impl Iterator<Item = &SignalChannel> {
        self.leading.iter().chain(self.trailing.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Reconstructed interaction point in detector coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HitPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl HitPosition {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A hit combines the signals of both ends of one sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(default)]
    pub slot: Option<SlotRef>,
    #[serde(default)]
    pub signal_a: Option<RawSignal>,
    #[serde(default)]
    pub signal_b: Option<RawSignal>,
    #[serde(default)]
    pub position: HitPosition,
    /// Hit time in raw units (ps).
    #[serde(default)]
    pub time: f64,
}

impl Hit {
    /// Signals of side A then side B, skipping the absent ones.
    pub fn signals(&self) -> impl Iterator<Item = &RawSignal> {
        self.signal_a.iter().chain(self.signal_b.iter())
    }
}

/// Ordered group of hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// All records collected in one acquisition window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub events: Vec<Record>,
}

impl TimeWindow {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A record of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    #[serde(alias = "JPetTimeWindow")]
    TimeWindow(TimeWindow),
    #[serde(alias = "JPetRawSignal")]
    RawSignal(RawSignal),
    #[serde(alias = "JPetHit")]
    Hit(Hit),
    #[serde(alias = "JPetEvent")]
    Event(Event),
    #[serde(alias = "JPetSigCh")]
    SignalChannel(SignalChannel),
    /// Any tag this crate does not know how to process.
    #[serde(other)]
    Unknown,
}

impl Record {
    /// Kind implied by the variant.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::TimeWindow(_) => RecordKind::TimeWindow,
            Record::RawSignal(_) => RecordKind::RawSignal,
            Record::Hit(_) => RecordKind::Hit,
            Record::Event(_) => RecordKind::Event,
            Record::SignalChannel(_) => RecordKind::SignalChannel,
            Record::Unknown => RecordKind::None,
        }
    }

    /// Tag written in the `type` field when serialized.
    pub fn type_tag(&self) -> &'static str {
        self.kind().tag()
    }

    /// Number of navigable events in this record.
    ///
    /// A time window contributes one event per sub-event; everything else is
    /// a single event.
    pub fn event_count(&self) -> usize {
        match self {
            Record::TimeWindow(window) => window.len(),
            _ => 1,
        }
    }
}
