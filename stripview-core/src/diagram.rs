//! Threshold-time diagrams for signal diagnostics.
//!
//! A diagram series lists the leading- and trailing-edge crossings of one
//! sensor end. Times are kept in raw units (ps); [`DiagramPoint::time_ns`]
//! converts for display.

use std::fmt::Write as _;

use log::debug;

use crate::geometry::GeometryMapper;
use crate::hits::PolarCoordinates;
use crate::record::{EdgeType, Hit, RawSignal, Record, SignalChannel, Side};

/// Raw time units (ps) per display unit (ns).
pub const PS_PER_NS: f64 = 1000.0;

/// One threshold crossing placed on a diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramPoint {
    pub threshold_number: u32,
    pub threshold: f64,
    /// Time in raw units, calibrated if reset mode was active.
    pub time: f64,
    pub edge: EdgeType,
    pub side: Side,
    pub layer: i32,
    pub slot: i32,
}

impl DiagramPoint {
    /// Time converted to nanoseconds.
    #[inline]
    pub fn time_ns(&self) -> f64 {
        self.time / PS_PER_NS
    }
}

/// Diagram points of one sensor end, leading edge first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramSeries {
    pub points: Vec<DiagramPoint>,
}

impl DiagramSeries {
    pub fn side(&self) -> Option<Side> {
        self.points.first().map(|point| point.side)
    }

    pub fn leading(&self) -> impl Iterator<Item = &DiagramPoint> {
        self.points
            .iter()
            .filter(|point| point.edge == EdgeType::Leading)
    }

    pub fn trailing(&self) -> impl Iterator<Item = &DiagramPoint> {
        self.points
            .iter()
            .filter(|point| point.edge == EdgeType::Trailing)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Diagram series plus the text describing the hits they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramOutput {
    pub series: Vec<DiagramSeries>,
    pub info: String,
}

/// Builds diagram series and hit descriptions from records.
pub struct DiagramExtractor<'a, G: ?Sized> {
    geometry: &'a G,
    reset_leading_edge: bool,
}

impl<'a, G: GeometryMapper + ?Sized> DiagramExtractor<'a, G> {
    pub fn new(geometry: &'a G) -> Self {
        Self {
            geometry,
            reset_leading_edge: false,
        }
    }

    /// Moves every leading edge to time zero and expresses trailing edges
    /// relative to their own threshold's leading edge.
    #[must_use]
    pub fn with_reset_leading_edge(mut self, reset: bool) -> Self {
        self.reset_leading_edge = reset;
        self
    }

    pub fn extract(&self, record: &Record) -> DiagramOutput {
        let mut output = DiagramOutput::default();
        self.collect(record, &mut output);
        output
    }

    fn collect(&self, record: &Record, output: &mut DiagramOutput) {
        match record {
            Record::RawSignal(signal) => output.series.extend(self.signal_series(signal)),
            Record::Hit(hit) => self.collect_hit(hit, output),
            Record::Event(event) => {
                for hit in &event.hits {
                    self.collect_hit(hit, output);
                }
            }
            Record::TimeWindow(window) => {
                for sub_event in &window.events {
                    self.collect(sub_event, output);
                }
            }
            Record::SignalChannel(_) | Record::Unknown => {}
        }
    }

    fn collect_hit(&self, hit: &Hit, output: &mut DiagramOutput) {
        for signal in hit.signals() {
            output.series.extend(self.signal_series(signal));
        }
        self.describe_hit(hit, &mut output.info);
    }

    /// Series for one raw signal, or `None` if its side or slot is unknown.
    pub fn signal_series(&self, signal: &RawSignal) -> Option<DiagramSeries> {
        let Some(side) = signal.channels().find_map(SignalChannel::side) else {
            debug!("raw signal has no readout element, no diagram");
            return None;
        };
        let Some(pos) = signal
            .channels()
            .find_map(SignalChannel::slot_ref)
            .and_then(|slot| self.geometry.locate(slot))
        else {
            debug!("raw signal cannot be placed in the geometry, no diagram");
            return None;
        };

        let start_time = signal.leading.first().map_or(0.0, |channel| channel.time);
        let point = |channel: &SignalChannel, edge: EdgeType, time: f64| DiagramPoint {
            threshold_number: channel.threshold_number,
            threshold: channel.threshold,
            time,
            edge,
            side,
            layer: pos.layer,
            slot: pos.slot,
        };

        let mut points = Vec::with_capacity(signal.leading.len() + signal.trailing.len());
        for channel in &signal.leading {
            let time = if self.reset_leading_edge {
                0.0
            } else {
                channel.time
            };
            points.push(point(channel, EdgeType::Leading, time));
        }
        for channel in &signal.trailing {
            let time = if self.reset_leading_edge {
                let leading_time = signal
                    .leading
                    .iter()
                    .find(|leading| leading.threshold_number == channel.threshold_number)
                    .map_or(start_time, |leading| leading.time);
                channel.time - (leading_time - start_time) - start_time
            } else {
                channel.time
            };
            points.push(point(channel, EdgeType::Trailing, time));
        }
        Some(DiagramSeries { points })
    }

    fn describe_hit(&self, hit: &Hit, info: &mut String) {
        let pos = hit.slot.as_ref().and_then(|slot| self.geometry.locate(slot));
        let polar = PolarCoordinates::from(&hit.position);
        match pos {
            Some(pos) => {
                let _ = writeln!(info, "Hit in layer {}, slot {}", pos.layer, pos.slot);
            }
            None => info.push_str("Hit in unmapped slot\n"),
        }
        let _ = writeln!(
            info,
            "  x: {:.2} y: {:.2} z: {:.2}\n  time: {:.1} ps\n  r: {:.2} theta: {:.2} deg",
            hit.position.x, hit.position.y, hit.position.z, hit.time, polar.r, polar.theta_deg
        );
    }
}
