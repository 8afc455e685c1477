//! Navigation over the events of a record source.
//!
//! The stepper owns the [`ProcessedData`] snapshot and rebuilds it on every
//! successful navigation step. Records that are time windows expose each of
//! their sub-events as a separate navigable event; every other record is a
//! single event.

use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::geometry::GeometryMapper;
use crate::kind::RecordKind;
use crate::processing::{process_record, ExtractionConfig};
use crate::reader::RecordReader;
use crate::record::Record;
use crate::store::ProcessedData;

/// Configuration for event stepping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepperConfig {
    /// Sub-events of a time window folded into one step (at least 1).
    pub events_per_step: usize,
    /// Extraction settings used for every step.
    pub extraction: ExtractionConfig,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            events_per_step: 1,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl StepperConfig {
    /// Set how many window sub-events one step folds.
    ///
    /// Values less than 1 are clamped to 1.
    #[must_use]
    pub fn with_events_per_step(mut self, events: usize) -> Self {
        self.events_per_step = events.max(1);
        self
    }

    /// Set leading-edge reset mode for diagrams.
    #[must_use]
    pub fn with_reset_leading_edge(mut self, reset: bool) -> Self {
        self.extraction.reset_leading_edge = reset;
        self
    }
}

/// Where the stepper currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    Closed,
    /// A source is open but no step has been taken yet.
    Idle,
    /// Positioned at a flat event index.
    AtEvent(usize),
}

/// Drives a [`RecordReader`] and rebuilds the snapshot per step.
pub struct EventStepper<R, G> {
    reader: R,
    geometry: G,
    config: StepperConfig,
    state: StepperState,
    /// Navigable events per record, in record order.
    event_counts: Vec<usize>,
    total_events: usize,
    data: ProcessedData,
}

impl<R: RecordReader, G: GeometryMapper> EventStepper<R, G> {
    pub fn new(reader: R, geometry: G) -> Self {
        Self {
            reader,
            geometry,
            config: StepperConfig::default(),
            state: StepperState::Closed,
            event_counts: Vec::new(),
            total_events: 0,
            data: ProcessedData::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StepperConfig) -> Self {
        self.config = StepperConfig {
            events_per_step: config.events_per_step.max(1),
            ..config
        };
        self
    }

    /// Opens a source and counts the events of every record.
    ///
    /// On failure the stepper stays closed.
    ///
    /// # Errors
    /// Returns the reader's error if the source cannot be opened.
    pub fn open(&mut self, source: &Path) -> Result<(), R::Error> {
        self.close();
        self.reader.open(source)?;

        let records = self.reader.total_record_count();
        let mut event_counts = Vec::with_capacity(records);
        for index in 0..records {
            let count = if self.reader.nth_entry(index) {
                match self.reader.current_record() {
                    Some(Record::TimeWindow(window)) if window.is_empty() => {
                        error!("time window {index} contains no events");
                        0
                    }
                    Some(record) => record.event_count(),
                    None => 0,
                }
            } else {
                error!("record {index} could not be read");
                0
            };
            event_counts.push(count);
        }

        self.total_events = event_counts.iter().sum();
        self.event_counts = event_counts;
        self.state = StepperState::Idle;
        info!(
            "opened {}: {} records, {} events",
            source.display(),
            records,
            self.total_events
        );
        Ok(())
    }

    /// Closes the source and clears the snapshot.
    pub fn close(&mut self) {
        if self.reader.is_open() {
            self.reader.close();
            debug!("record source closed");
        }
        self.state = StepperState::Closed;
        self.event_counts.clear();
        self.total_events = 0;
        self.data.clear();
    }

    pub fn first(&mut self) -> bool {
        self.seek(0)
    }

    /// Advances one event; from `Idle` this is the first event.
    pub fn next(&mut self) -> bool {
        match self.state {
            StepperState::Closed => false,
            StepperState::Idle => self.seek(0),
            StepperState::AtEvent(event) => self.seek(event + 1),
        }
    }

    pub fn last(&mut self) -> bool {
        match self.total_events.checked_sub(1) {
            Some(event) => self.seek(event),
            None => false,
        }
    }

    /// Moves to flat event index `event`.
    ///
    /// Returns `false` and leaves everything untouched if `event` is past
    /// the end or the stepper is closed.
    pub fn nth(&mut self, event: usize) -> bool {
        self.seek(event)
    }

    /// Translates a flat event index into `(record, offset within record)`.
    ///
    /// Runs a linear search over the per-record event counts, so a seek
    /// costs O(number of records).
    pub fn locate(&self, event: usize) -> Option<(usize, usize)> {
        let mut first_event = 0;
        for (record, &count) in self.event_counts.iter().enumerate() {
            if event < first_event + count {
                return Some((record, event - first_event));
            }
            first_event += count;
        }
        None
    }

    fn seek(&mut self, event: usize) -> bool {
        if self.state == StepperState::Closed {
            return false;
        }
        let Some((record, offset)) = self.locate(event) else {
            debug!("event {event} is past the end ({} events)", self.total_events);
            return false;
        };

        let previous = self.reader.current_index();
        if !self.reader.nth_entry(record) {
            warn!("could not load record {record} for event {event}");
            if let Some(previous) = previous {
                self.reader.nth_entry(previous);
            }
            return false;
        }

        self.rebuild(offset);
        self.state = StepperState::AtEvent(event);
        true
    }

    fn rebuild(&mut self, offset: usize) {
        let Self {
            reader,
            geometry,
            config,
            data,
            ..
        } = self;
        let geometry: &dyn GeometryMapper = &*geometry;

        data.clear();
        let tag = reader.current_type_tag().unwrap_or_default();
        let Some(record) = reader.current_record() else {
            return;
        };
        // A tag the record model could not load is unknown whatever it reads as.
        let kind = match record {
            Record::Unknown => RecordKind::None,
            _ => RecordKind::from_type_tag(tag),
        };
        data.set_kind(kind);

        match (kind, record) {
            (RecordKind::None, _) => {
                warn!("unknown record type '{tag}', nothing extracted");
                data.append_info(&format!("Unknown record type '{tag}', nothing to display\n"));
                return;
            }
            (RecordKind::TimeWindow, Record::TimeWindow(window)) => {
                let end = offset
                    .saturating_add(config.events_per_step)
                    .min(window.len());
                for (index, sub_event) in window
                    .events
                    .iter()
                    .enumerate()
                    .take(end)
                    .skip(offset)
                {
                    if matches!(sub_event, Record::Unknown) {
                        warn!("unknown record type in time window sub-event {index}");
                        data.append_info(&format!(
                            "Unknown record type in time window sub-event {index}, skipped\n"
                        ));
                        continue;
                    }
                    process_record(sub_event, geometry, &config.extraction).merge_into(data);
                }
            }
            (_, record) => process_record(record, geometry, &config.extraction).merge_into(data),
        }

        if kind.reports_occupancy() {
            let summary = data.occupancy_summary();
            data.append_info(&summary);
        }
    }

    /// Steps forward repeatedly, sleeping `delay` between steps.
    ///
    /// Stops at the end of the source, after `limit` steps, or when
    /// `on_step` returns `false`. Returns the number of steps taken.
    pub fn play<F>(&mut self, delay: Duration, limit: Option<usize>, mut on_step: F) -> usize
    where
        F: FnMut(usize, &ProcessedData) -> bool,
    {
        let mut steps = 0;
        while limit.is_none_or(|limit| steps < limit) {
            if steps > 0 && !delay.is_zero() {
                thread::sleep(delay);
            }
            if !self.next() {
                break;
            }
            steps += 1;
            let event = self.current_event().unwrap_or_default();
            if !on_step(event, &self.data) {
                break;
            }
        }
        steps
    }

    /// Flips leading-edge reset mode; applies from the next step.
    pub fn toggle_reset_leading_edge(&mut self) -> bool {
        self.config.extraction.reset_leading_edge = !self.config.extraction.reset_leading_edge;
        self.config.extraction.reset_leading_edge
    }

    #[inline]
    pub fn data(&self) -> &ProcessedData {
        &self.data
    }

    #[inline]
    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn current_event(&self) -> Option<usize> {
        match self.state {
            StepperState::AtEvent(event) => Some(event),
            StepperState::Closed | StepperState::Idle => None,
        }
    }

    #[inline]
    pub fn total_events(&self) -> usize {
        self.total_events
    }

    #[inline]
    pub fn total_records(&self) -> usize {
        self.event_counts.len()
    }

    #[inline]
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    #[inline]
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    #[inline]
    pub fn reader(&self) -> &R {
        &self.reader
    }
}
