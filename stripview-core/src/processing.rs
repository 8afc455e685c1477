//! Record processing: one dispatch over record kinds feeding the store.

use crate::diagram::{DiagramExtractor, DiagramSeries};
use crate::geometry::GeometryMapper;
use crate::hits::HitPositionCollector;
use crate::kind::RecordKind;
use crate::record::{HitPosition, Record};
use crate::scintillators::ScintillatorAggregator;
use crate::store::{ActiveScintillators, ProcessedData};

/// Configuration for record extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Calibrate diagram times against each threshold's leading edge.
    pub reset_leading_edge: bool,
}

impl ExtractionConfig {
    /// Set leading-edge reset mode.
    #[must_use]
    pub fn with_reset_leading_edge(mut self, reset: bool) -> Self {
        self.reset_leading_edge = reset;
        self
    }
}

/// Output of processing one record.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub active_scins: ActiveScintillators,
    pub diagrams: Vec<DiagramSeries>,
    pub hits: Vec<HitPosition>,
    pub info: String,
}

impl Extraction {
    /// Merges this extraction into the step's snapshot.
    pub fn merge_into(self, data: &mut ProcessedData) {
        data.merge_active_scins(&self.active_scins);
        data.merge_diagrams(self.diagrams);
        data.merge_hits(self.hits);
        data.append_info(&self.info);
    }
}

type Handler = fn(&Record, &dyn GeometryMapper, &ExtractionConfig) -> Extraction;

/// Extraction path for each record kind.
fn handler(kind: RecordKind) -> Handler {
    match kind {
        RecordKind::None => nothing,
        RecordKind::SignalChannel => scintillators_only,
        RecordKind::RawSignal => scintillators_and_diagrams,
        RecordKind::Hit | RecordKind::Event | RecordKind::TimeWindow => full_extraction,
    }
}

fn nothing(
    _record: &Record,
    _geometry: &dyn GeometryMapper,
    _config: &ExtractionConfig,
) -> Extraction {
    Extraction::default()
}

fn scintillators_only(
    record: &Record,
    geometry: &dyn GeometryMapper,
    _config: &ExtractionConfig,
) -> Extraction {
    Extraction {
        active_scins: ScintillatorAggregator::new(geometry).aggregate(record),
        ..Extraction::default()
    }
}

fn scintillators_and_diagrams(
    record: &Record,
    geometry: &dyn GeometryMapper,
    config: &ExtractionConfig,
) -> Extraction {
    let diagram = DiagramExtractor::new(geometry)
        .with_reset_leading_edge(config.reset_leading_edge)
        .extract(record);
    Extraction {
        active_scins: ScintillatorAggregator::new(geometry).aggregate(record),
        diagrams: diagram.series,
        hits: Vec::new(),
        info: diagram.info,
    }
}

fn full_extraction(
    record: &Record,
    geometry: &dyn GeometryMapper,
    config: &ExtractionConfig,
) -> Extraction {
    let mut extraction = scintillators_and_diagrams(record, geometry, config);
    extraction.hits = HitPositionCollector.collect(record);
    extraction
}

/// Runs the extraction components selected by the record's kind.
pub fn process_record(
    record: &Record,
    geometry: &dyn GeometryMapper,
    config: &ExtractionConfig,
) -> Extraction {
    handler(record.kind())(record, geometry, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BarrelGeometry, StripPosition};
    use crate::record::{
        EdgeType, Event, Hit, RawSignal, ReadoutElement, Sensor, SignalChannel, Side, SlotRef,
    };

    fn channel(slot_id: u32, time: f64, edge: EdgeType) -> SignalChannel {
        SignalChannel {
            threshold_number: 1,
            threshold: 80.0,
            time,
            edge,
            readout: Some(ReadoutElement {
                id: 2,
                side: Side::A,
                sensor: Some(Sensor {
                    id: 2,
                    slot: Some(SlotRef::new(slot_id)),
                }),
            }),
        }
    }

    #[test]
    fn test_signal_channel_only_aggregates() {
        let geometry = BarrelGeometry::default();
        let record = Record::SignalChannel(channel(2, 10.0, EdgeType::Leading));
        let extraction = process_record(&record, &geometry, &ExtractionConfig::default());
        assert!(extraction.active_scins.contains(StripPosition::new(0, 1)));
        assert!(extraction.diagrams.is_empty());
        assert!(extraction.hits.is_empty());
        assert!(extraction.info.is_empty());
    }

    #[test]
    fn test_raw_signal_has_no_hits() {
        let geometry = BarrelGeometry::default();
        let record = Record::RawSignal(RawSignal {
            leading: vec![channel(2, 10.0, EdgeType::Leading)],
            trailing: vec![channel(2, 30.0, EdgeType::Trailing)],
        });
        let config = ExtractionConfig::default().with_reset_leading_edge(true);
        let extraction = process_record(&record, &geometry, &config);
        assert_eq!(extraction.active_scins.len(), 1);
        assert_eq!(extraction.diagrams.len(), 1);
        let trailing: Vec<f64> = extraction.diagrams[0].trailing().map(|p| p.time).collect();
        assert_eq!(trailing, vec![20.0]);
        assert!(extraction.hits.is_empty());
    }

    #[test]
    fn test_event_fills_everything() {
        let geometry = BarrelGeometry::default();
        let hit = Hit {
            slot: Some(SlotRef::new(2)),
            signal_a: Some(RawSignal {
                leading: vec![channel(2, 10.0, EdgeType::Leading)],
                trailing: vec![],
            }),
            ..Hit::default()
        };
        let record = Record::Event(Event {
            hits: vec![hit.clone(), hit],
        });
        let extraction = process_record(&record, &geometry, &ExtractionConfig::default());
        assert_eq!(extraction.active_scins.len(), 1);
        assert_eq!(extraction.diagrams.len(), 2);
        assert_eq!(extraction.hits.len(), 2);

        let mut data = ProcessedData::new();
        extraction.merge_into(&mut data);
        assert_eq!(data.hits().len(), 2);
        assert_eq!(data.occupancy(StripPosition::new(0, 1)), 1);
    }

    #[test]
    fn test_unknown_record_extracts_nothing() {
        let geometry = BarrelGeometry::default();
        let extraction = process_record(&Record::Unknown, &geometry, &ExtractionConfig::default());
        assert!(extraction.active_scins.is_empty());
        assert!(extraction.diagrams.is_empty());
        assert!(extraction.hits.is_empty());
    }
}
