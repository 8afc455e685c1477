//! Record classification by type tag.

use std::fmt;

/// Closed set of record kinds; selects the extraction path for a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecordKind {
    #[default]
    None,
    TimeWindow,
    RawSignal,
    Hit,
    Event,
    SignalChannel,
}

impl RecordKind {
    /// Classifies a reader type tag.
    ///
    /// Both the short tags used by the JSON record files and the framework
    /// class names found in older data files are recognised. Matching is
    /// exact, as for the `type` tag of a deserialized [`Record`]. Anything
    /// else is [`RecordKind::None`].
    ///
    /// [`Record`]: crate::record::Record
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "TimeWindow" | "JPetTimeWindow" => RecordKind::TimeWindow,
            "RawSignal" | "JPetRawSignal" => RecordKind::RawSignal,
            "Hit" | "JPetHit" => RecordKind::Hit,
            "Event" | "JPetEvent" => RecordKind::Event,
            "SignalChannel" | "JPetSigCh" => RecordKind::SignalChannel,
            _ => RecordKind::None,
        }
    }

    /// Short tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            RecordKind::None => "None",
            RecordKind::TimeWindow => "TimeWindow",
            RecordKind::RawSignal => "RawSignal",
            RecordKind::Hit => "Hit",
            RecordKind::Event => "Event",
            RecordKind::SignalChannel => "SignalChannel",
        }
    }

    /// Whether a step of this kind gets the per-slot occupancy summary.
    pub fn reports_occupancy(self) -> bool {
        matches!(self, RecordKind::TimeWindow | RecordKind::RawSignal)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
