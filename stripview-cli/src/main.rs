//! stripview CLI - Command-line event stepper for strip detector records.
//!
//! Opens a JSON Lines record file, steps through its events and prints the
//! per-event snapshot: fired scintillators, hit positions and diagrams.
#![allow(clippy::uninlined_format_args)]

use clap::{ArgAction, Args, Parser, Subcommand};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stripview_core::{
    BarrelGeometry, EventStepper, GeometryMapper, PolarCoordinates, ProcessedData, Record,
    RecordKind, RecordReader, StepperConfig,
};
use stripview_io::{DiagramCsvWriter, JsonRecordReader};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    StripviewIo(#[from] stripview_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] stripview_core::Error),

    #[error("event {event} is out of range ({total} events)")]
    EventOutOfRange { event: usize, total: usize },
}

/// Event display data stepper for strip detector record files.
#[derive(Parser)]
#[command(name = "stripview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the stepping commands.
#[derive(Args)]
struct StepOptions {
    /// Express trailing edges relative to their threshold's leading edge
    #[arg(long)]
    reset_leading_edge: bool,

    /// Time window sub-events folded into one step
    #[arg(long, default_value = "1")]
    events_per_step: usize,

    /// Geometry JSON file (defaults to the three-layer barrel)
    #[arg(short, long)]
    geometry: Option<PathBuf>,
}

impl StepOptions {
    fn stepper_config(&self) -> StepperConfig {
        StepperConfig::default()
            .with_events_per_step(self.events_per_step)
            .with_reset_leading_edge(self.reset_leading_edge)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show record and event counts of a record file
    Info {
        /// Input record file (JSON Lines)
        input: PathBuf,
    },

    /// Print the snapshot of one event
    Show {
        /// Input record file (JSON Lines)
        input: PathBuf,

        /// Flat event index
        #[arg(short, long, default_value = "0")]
        event: usize,

        /// Write the event's diagram series to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        #[command(flatten)]
        options: StepOptions,
    },

    /// Step through events with a pacing delay
    Play {
        /// Input record file (JSON Lines)
        input: PathBuf,

        /// Delay between steps (milliseconds)
        #[arg(long, default_value = "500")]
        delay_ms: u64,

        /// Stop after this many steps
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        options: StepOptions,
    },

    /// Print the detector geometry
    Geometry {
        /// Geometry JSON file (defaults to the three-layer barrel)
        #[arg(short, long)]
        geometry: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Info { input } => {
            let mut reader = JsonRecordReader::new();
            reader.open(&input)?;

            let total = reader.total_record_count();
            let mut per_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
            let mut events = 0usize;
            let mut unreadable = 0usize;
            for index in 0..total {
                if !reader.nth_entry(index) {
                    unreadable += 1;
                    continue;
                }
                let kind = RecordKind::from_type_tag(reader.current_type_tag().unwrap_or_default());
                *per_kind.entry(kind.tag()).or_insert(0) += 1;
                events += reader.current_record().map_or(0, Record::event_count);
            }

            println!("File: {}", input.display());
            println!("Records: {}", total);
            println!("Events: {}", events);
            for (kind, count) in &per_kind {
                println!("  {:<14} {}", kind, count);
            }
            if unreadable > 0 {
                println!("Unreadable records: {}", unreadable);
            }
        }

        Commands::Show {
            input,
            event,
            csv,
            options,
        } => {
            let mut stepper = open_stepper(&input, &options)?;
            if !stepper.nth(event) {
                return Err(CliError::EventOutOfRange {
                    event,
                    total: stepper.total_events(),
                });
            }
            print_snapshot(event, stepper.data());

            if let Some(csv) = csv {
                DiagramCsvWriter::create(&csv)?.write_series(stepper.data().diagrams())?;
                info!("wrote diagrams to {}", csv.display());
            }
        }

        Commands::Play {
            input,
            delay_ms,
            limit,
            options,
        } => {
            let mut stepper = open_stepper(&input, &options)?;
            let steps = stepper.play(Duration::from_millis(delay_ms), limit, |event, data| {
                println!(
                    "event {:>6} {:<13} scintillators: {:>3} hits: {:>3} diagrams: {:>3}",
                    event,
                    data.kind().to_string(),
                    data.active_scins().len(),
                    data.hits().len(),
                    data.diagrams().len()
                );
                true
            });
            println!("Played {} of {} events", steps, stepper.total_events());
        }

        Commands::Geometry { geometry } => {
            let geometry = load_geometry(geometry.as_deref())?;
            println!("First slot id: {}", geometry.first_slot_id);
            for (layer, slots) in geometry.slot_count_per_layer().into_iter().enumerate() {
                let radius = geometry.layer_radius(layer).unwrap_or_default();
                println!("Layer {}: {} slots, radius {:.2}", layer, slots, radius);
            }
            println!("Total slots: {}", geometry.total_slots());
        }
    }

    Ok(())
}

fn load_geometry(path: Option<&Path>) -> Result<BarrelGeometry> {
    match path {
        Some(path) => {
            debug!("loading geometry from {}", path.display());
            Ok(BarrelGeometry::from_file(path)?)
        }
        None => Ok(BarrelGeometry::default()),
    }
}

fn open_stepper(
    input: &Path,
    options: &StepOptions,
) -> Result<EventStepper<JsonRecordReader, BarrelGeometry>> {
    let geometry = load_geometry(options.geometry.as_deref())?;
    let mut stepper = EventStepper::new(JsonRecordReader::new(), geometry)
        .with_config(options.stepper_config());
    stepper.open(input)?;
    Ok(stepper)
}

fn print_snapshot(event: usize, data: &ProcessedData) {
    println!("Event {} ({})", event, data.kind());

    println!("Active scintillators:");
    for (layer, slots) in data.active_scins().iter() {
        let slots: Vec<String> = slots.iter().map(ToString::to_string).collect();
        println!("  layer {}: {}", layer, slots.join(" "));
    }

    if !data.hits().is_empty() {
        println!("Hits:");
        for hit in data.hits() {
            let polar = PolarCoordinates::from(hit);
            println!(
                "  x: {:8.2} y: {:8.2} z: {:8.2}  r: {:7.2} theta: {:7.2} deg",
                hit.x, hit.y, hit.z, polar.r, polar.theta_deg
            );
        }
    }

    if !data.diagrams().is_empty() {
        println!("Diagrams:");
        for series in data.diagrams() {
            let Some(first) = series.points.first() else {
                continue;
            };
            let times: Vec<String> = series
                .points
                .iter()
                .map(|p| format!("{:.3}", p.time_ns()))
                .collect();
            println!(
                "  layer {} slot {} side {:?}: {} ns",
                first.layer,
                first.slot,
                first.side,
                times.join(" ")
            );
        }
    }

    if !data.info().is_empty() {
        println!("{}", data.info().trim_end());
    }
}
