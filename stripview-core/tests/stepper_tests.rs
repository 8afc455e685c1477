#![allow(clippy::float_cmp, clippy::cast_possible_truncation)]
use std::path::Path;
use std::time::Duration;

use approx::assert_relative_eq;
use stripview_core::{
    BarrelGeometry, EdgeType, Event, EventStepper, Hit, HitPosition, InMemoryReader, RawSignal,
    ReadoutElement, Record, RecordKind, RecordReader, Sensor, Side, SignalChannel, SlotRef,
    StepperConfig, StepperState, StripPosition, TimeWindow,
};

// Layer 0 slot `s` has global id `s + 1` in the default barrel.
fn channel(layer0_slot: u32, threshold_number: u32, time: f64, edge: EdgeType) -> SignalChannel {
    SignalChannel {
        threshold_number,
        threshold: 80.0 * f64::from(threshold_number),
        time,
        edge,
        readout: Some(ReadoutElement {
            id: 100 + layer0_slot,
            side: Side::A,
            sensor: Some(Sensor {
                id: layer0_slot,
                slot: Some(SlotRef::new(layer0_slot + 1)),
            }),
        }),
    }
}

fn hit_at(layer0_slot: u32, x: f64, y: f64) -> Hit {
    Hit {
        slot: Some(SlotRef::new(layer0_slot + 1)),
        signal_a: Some(RawSignal {
            leading: vec![channel(layer0_slot, 1, 100.0, EdgeType::Leading)],
            trailing: vec![channel(layer0_slot, 1, 400.0, EdgeType::Trailing)],
        }),
        signal_b: None,
        position: HitPosition::new(x, y, 0.0),
        time: 250.0,
    }
}

fn channel_window(slots: &[u32]) -> Record {
    Record::TimeWindow(TimeWindow {
        events: slots
            .iter()
            .map(|&slot| Record::SignalChannel(channel(slot, 1, 10.0, EdgeType::Leading)))
            .collect(),
    })
}

/// Records: window(2 events), hit, empty window, event(2 hits), unknown.
fn mixed_records() -> Vec<Record> {
    vec![
        channel_window(&[4, 5]),
        Record::Hit(hit_at(7, 3.0, 4.0)),
        Record::TimeWindow(TimeWindow::default()),
        Record::Event(Event {
            hits: vec![hit_at(8, 1.0, 0.0), hit_at(9, 0.0, 1.0)],
        }),
        Record::Unknown,
    ]
}

fn stepper_with(
    records: Vec<Record>,
    config: StepperConfig,
) -> EventStepper<InMemoryReader, BarrelGeometry> {
    let reader = InMemoryReader::new().with_source("run", records);
    let mut stepper = EventStepper::new(reader, BarrelGeometry::default()).with_config(config);
    stepper.open(Path::new("run")).unwrap();
    stepper
}

fn stepper(records: Vec<Record>) -> EventStepper<InMemoryReader, BarrelGeometry> {
    stepper_with(records, StepperConfig::default())
}

#[test]
fn test_open_counts_events() {
    let stepper = stepper(mixed_records());
    assert_eq!(stepper.state(), StepperState::Idle);
    assert_eq!(stepper.total_records(), 5);
    // 2 + 1 + 0 + 1 + 1
    assert_eq!(stepper.total_events(), 5);
    assert!(stepper.data().is_empty());
}

#[test]
fn test_open_failure_stays_closed() {
    let reader = InMemoryReader::new();
    let mut stepper = EventStepper::new(reader, BarrelGeometry::default());
    assert!(stepper.open(Path::new("missing")).is_err());
    assert_eq!(stepper.state(), StepperState::Closed);
    assert!(!stepper.next());
}

#[test]
fn test_closed_navigation_fails() {
    let reader = InMemoryReader::new().with_source("run", mixed_records());
    let mut stepper = EventStepper::new(reader, BarrelGeometry::default());
    assert!(!stepper.first());
    assert!(!stepper.next());
    assert!(!stepper.last());
    assert!(!stepper.nth(0));
    assert_eq!(stepper.state(), StepperState::Closed);
}

#[test]
fn test_locate_skips_empty_window() {
    let stepper = stepper(mixed_records());
    assert_eq!(stepper.locate(0), Some((0, 0)));
    assert_eq!(stepper.locate(1), Some((0, 1)));
    assert_eq!(stepper.locate(2), Some((1, 0)));
    assert_eq!(stepper.locate(3), Some((3, 0)));
    assert_eq!(stepper.locate(4), Some((4, 0)));
    assert_eq!(stepper.locate(5), None);
}

#[test]
fn test_window_sub_event_steps() {
    let mut stepper = stepper(mixed_records());

    assert!(stepper.next());
    assert_eq!(stepper.current_event(), Some(0));
    assert_eq!(stepper.data().kind(), RecordKind::TimeWindow);
    assert_eq!(stepper.data().active_scins().layer(0), &[4]);

    assert!(stepper.next());
    assert_eq!(stepper.data().active_scins().layer(0), &[5]);
    assert!(stepper.data().info().contains("layer 0: 5x1"));
}

#[test]
fn test_hit_step_fills_snapshot() {
    let mut stepper = stepper(mixed_records());
    assert!(stepper.nth(2));
    let data = stepper.data();
    assert_eq!(data.kind(), RecordKind::Hit);
    assert!(data.active_scins().contains(StripPosition::new(0, 7)));
    assert_eq!(data.hits(), &[HitPosition::new(3.0, 4.0, 0.0)]);
    assert_eq!(data.diagrams().len(), 1);
    assert!(data.info().contains("Hit in layer 0, slot 7"));
    assert!(data.info().contains("r: 5.00 theta: 53.13 deg"));
    // Hits do not get an occupancy summary.
    assert!(!data.info().contains("Active scintillators"));
}

#[test]
fn test_event_step_keeps_hit_order() {
    let mut stepper = stepper(mixed_records());
    assert!(stepper.nth(3));
    let data = stepper.data();
    assert_eq!(data.kind(), RecordKind::Event);
    assert_eq!(
        data.hits(),
        &[HitPosition::new(1.0, 0.0, 0.0), HitPosition::new(0.0, 1.0, 0.0)]
    );
    assert_eq!(data.active_scins().layer(0), &[8, 9]);
}

#[test]
fn test_unknown_record_notes_and_extracts_nothing() {
    let mut stepper = stepper(mixed_records());
    assert!(stepper.last());
    let data = stepper.data();
    assert_eq!(data.kind(), RecordKind::None);
    assert!(data.active_scins().is_empty());
    assert!(data.hits().is_empty());
    assert!(data.diagrams().is_empty());
    assert_eq!(data.info(), "Unknown record type 'None', nothing to display\n");
}

#[test]
fn test_seek_past_end_leaves_snapshot() {
    let mut stepper = stepper(mixed_records());
    assert!(stepper.nth(2));
    let before = stepper.data().clone();
    let total = stepper.total_events();

    assert!(!stepper.nth(total));
    assert!(!stepper.nth(total + 10));
    assert_eq!(stepper.current_event(), Some(2));
    assert_eq!(stepper.data().hits(), before.hits());
    assert_eq!(stepper.data().info(), before.info());
    assert_eq!(stepper.data().kind(), before.kind());
}

#[test]
fn test_next_at_end_fails() {
    let mut stepper = stepper(mixed_records());
    assert!(stepper.last());
    assert!(!stepper.next());
    assert_eq!(stepper.current_event(), Some(4));
}

#[test]
fn test_nth_matches_repeated_next() {
    let total = stepper(mixed_records()).total_events();
    for k in 0..total {
        let mut direct = stepper(mixed_records());
        assert!(direct.nth(k));

        let mut walked = stepper(mixed_records());
        assert!(walked.first());
        for _ in 0..k {
            assert!(walked.next());
        }

        assert_eq!(direct.current_event(), walked.current_event());
        assert_eq!(direct.data().kind(), walked.data().kind());
        assert_eq!(direct.data().info(), walked.data().info());
        assert_eq!(direct.data().hits(), walked.data().hits());
        assert_eq!(direct.data().diagrams(), walked.data().diagrams());
        assert_eq!(direct.data().active_scins(), walked.data().active_scins());
    }
}

#[test]
fn test_folded_window_merges_sub_events() {
    let window = channel_window(&[10, 11, 12, 13, 11]);
    let config = StepperConfig::default().with_events_per_step(5);
    let mut stepper = stepper_with(vec![window], config);

    assert!(stepper.first());
    let data = stepper.data();
    assert_eq!(data.active_scins().layer(0), &[10, 11, 12, 13]);
    assert_eq!(data.occupancy(StripPosition::new(0, 11)), 2);
    assert_eq!(data.occupancy(StripPosition::new(0, 12)), 1);
    assert!(data.info().contains("layer 0: 10x1 11x2 12x1 13x1"));
}

#[test]
fn test_folding_stops_at_window_end() {
    let window = channel_window(&[1, 2, 3]);
    let config = StepperConfig::default().with_events_per_step(2);
    let mut stepper = stepper_with(vec![window], config);

    assert!(stepper.nth(2));
    assert_eq!(stepper.data().active_scins().layer(0), &[3]);
}

#[test]
fn test_events_per_step_clamped() {
    let config = StepperConfig::default().with_events_per_step(0);
    assert_eq!(config.events_per_step, 1);
}

#[test]
fn test_unmapped_channel_leaves_set_empty() {
    let mut orphan = channel(3, 1, 10.0, EdgeType::Leading);
    orphan.readout = None;
    let mut stepper = stepper(vec![Record::SignalChannel(orphan)]);

    assert!(stepper.first());
    assert_eq!(stepper.data().kind(), RecordKind::SignalChannel);
    assert!(stepper.data().active_scins().is_empty());
    assert!(stepper.data().is_empty());
}

#[test]
fn test_empty_window_step_has_no_summary() {
    let mut orphan = channel(3, 1, 10.0, EdgeType::Leading);
    orphan.readout = None;
    let window = Record::TimeWindow(TimeWindow {
        events: vec![Record::SignalChannel(orphan)],
    });
    let mut stepper = stepper(vec![window]);

    assert!(stepper.first());
    assert_eq!(stepper.data().kind(), RecordKind::TimeWindow);
    assert!(stepper.data().active_scins().is_empty());
    assert_eq!(stepper.data().info(), "");
}

#[test]
fn test_unknown_sub_event_is_noted() {
    let window = Record::TimeWindow(TimeWindow {
        events: vec![Record::Unknown, Record::Hit(hit_at(2, 1.0, 1.0))],
    });
    let config = StepperConfig::default().with_events_per_step(2);
    let mut grouped = stepper_with(vec![window.clone()], config);

    assert!(grouped.first());
    let data = grouped.data();
    assert_eq!(data.kind(), RecordKind::TimeWindow);
    assert!(data
        .info()
        .starts_with("Unknown record type in time window sub-event 0, skipped\n"));
    assert_eq!(data.active_scins().layer(0), &[2]);

    // Alone in its step, the unknown sub-event still leaves a note.
    let mut single = stepper(vec![window]);
    assert!(single.first());
    assert!(single.data().active_scins().is_empty());
    assert_eq!(
        single.data().info(),
        "Unknown record type in time window sub-event 0, skipped\n"
    );
}

#[test]
fn test_toggle_reset_leading_edge_applies_next_step() {
    let signal = RawSignal {
        leading: vec![
            channel(0, 1, 5.0, EdgeType::Leading),
            channel(0, 2, 5.2, EdgeType::Leading),
        ],
        trailing: vec![
            channel(0, 1, 9.0, EdgeType::Trailing),
            channel(0, 2, 9.4, EdgeType::Trailing),
        ],
    };
    let mut stepper = stepper(vec![Record::RawSignal(signal)]);

    assert!(stepper.first());
    let absolute: Vec<f64> = stepper.data().diagrams()[0]
        .trailing()
        .map(|p| p.time)
        .collect();
    assert_eq!(absolute, vec![9.0, 9.4]);

    assert!(stepper.toggle_reset_leading_edge());
    assert!(stepper.first());
    let series = &stepper.data().diagrams()[0];
    for point in series.leading() {
        assert_eq!(point.time, 0.0);
    }
    let reset: Vec<f64> = series.trailing().map(|p| p.time).collect();
    assert_relative_eq!(reset[0], 4.0);
    assert_relative_eq!(reset[1], 4.2, epsilon = 1e-9);
    assert!(stepper.data().info().contains("Active scintillators"));

    assert!(!stepper.toggle_reset_leading_edge());
}

#[test]
fn test_play_respects_limit_and_callback() {
    let mut stepper = stepper(mixed_records());
    let mut seen = Vec::new();
    let steps = stepper.play(Duration::ZERO, Some(3), |event, data| {
        seen.push((event, data.kind()));
        true
    });
    assert_eq!(steps, 3);
    assert_eq!(
        seen,
        vec![
            (0, RecordKind::TimeWindow),
            (1, RecordKind::TimeWindow),
            (2, RecordKind::Hit)
        ]
    );

    // Continues from where it stopped and ends with the source.
    let rest = stepper.play(Duration::ZERO, None, |_, _| true);
    assert_eq!(rest, 2);
    assert_eq!(stepper.current_event(), Some(4));

    let mut stepper = stepper_with(mixed_records(), StepperConfig::default());
    let stopped = stepper.play(Duration::ZERO, None, |event, _| event < 1);
    assert_eq!(stopped, 2);
}

#[test]
fn test_close_clears_snapshot() {
    let mut stepper = stepper(mixed_records());
    assert!(stepper.nth(2));
    assert!(!stepper.data().is_empty());

    stepper.close();
    assert_eq!(stepper.state(), StepperState::Closed);
    assert!(stepper.data().is_empty());
    assert_eq!(stepper.data().kind(), RecordKind::None);
    assert_eq!(stepper.total_events(), 0);
    assert!(!stepper.reader().is_open());
}
