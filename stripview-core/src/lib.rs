//! stripview-core: record model and per-event aggregation for strip detectors.
//!
//! This crate resolves detector records to sensor positions, collects which
//! scintillators fired, builds threshold-time diagrams and hit coordinates,
//! and keeps them in a snapshot rebuilt on every navigation step.
//!

pub mod diagram;
pub mod error;
pub mod geometry;
pub mod hits;
pub mod kind;
pub mod processing;
pub mod reader;
pub mod record;
pub mod scintillators;
pub mod stepper;
pub mod store;

pub use diagram::{DiagramExtractor, DiagramOutput, DiagramPoint, DiagramSeries, PS_PER_NS};
pub use error::{Error, Result};
pub use geometry::{BarrelGeometry, BarrelLayer, GeometryMapper, StripPosition};
pub use hits::{HitPositionCollector, PolarCoordinates};
pub use kind::RecordKind;
pub use processing::{process_record, Extraction, ExtractionConfig};
pub use reader::{InMemoryReader, RecordReader};
pub use record::{
    EdgeType, Event, Hit, HitPosition, RawSignal, ReadoutElement, Record, Sensor, Side,
    SignalChannel, SlotRef, TimeWindow,
};
pub use scintillators::ScintillatorAggregator;
pub use stepper::{EventStepper, StepperConfig, StepperState};
pub use store::{ActiveScintillators, ProcessedData};
