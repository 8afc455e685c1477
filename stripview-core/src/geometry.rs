//! Geometry mapping from physical slots to (layer, slot) positions.
//!
//! The [`GeometryMapper`] trait is the contract consumed by the extraction
//! components. [`BarrelGeometry`] implements it for a barrel of concentric
//! layers whose slots are numbered consecutively across layers.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::record::SlotRef;

/// Position of a slot: layer index and slot index within that layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StripPosition {
    pub layer: i32,
    pub slot: i32,
}

impl StripPosition {
    /// Sentinel returned for references outside the known geometry.
    pub const UNMAPPED: StripPosition = StripPosition {
        layer: -1,
        slot: -1,
    };

    #[inline]
    pub fn new(layer: i32, slot: i32) -> Self {
        Self { layer, slot }
    }

    #[inline]
    pub fn is_unmapped(&self) -> bool {
        *self == Self::UNMAPPED
    }
}

/// Maps slot references to strip positions and describes the layers.
pub trait GeometryMapper {
    /// Maps a slot reference; returns [`StripPosition::UNMAPPED`] for
    /// references outside the geometry. Must be deterministic.
    fn map(&self, slot: &SlotRef) -> StripPosition;

    /// Number of slots in each layer, innermost first.
    fn slot_count_per_layer(&self) -> Vec<usize>;

    /// Radius of a layer, if the layer exists.
    fn layer_radius(&self, layer: usize) -> Option<f64>;

    /// Maps a slot reference, treating the sentinel as absent.
    #[inline]
    fn locate(&self, slot: &SlotRef) -> Option<StripPosition> {
        Some(self.map(slot)).filter(|pos| !pos.is_unmapped())
    }
}

impl<G: GeometryMapper + ?Sized> GeometryMapper for &G {
    fn map(&self, slot: &SlotRef) -> StripPosition {
        (**self).map(slot)
    }

    fn slot_count_per_layer(&self) -> Vec<usize> {
        (**self).slot_count_per_layer()
    }

    fn layer_radius(&self, layer: usize) -> Option<f64> {
        (**self).layer_radius(layer)
    }
}

/// One concentric layer of the barrel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarrelLayer {
    /// Number of slots in the layer.
    pub slots: usize,
    /// Layer radius (cm).
    pub radius: f64,
}

/// Barrel geometry with globally numbered slots.
///
/// Slot ids start at `first_slot_id` in layer 0 and continue without gaps
/// into the following layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarrelGeometry {
    pub first_slot_id: u32,
    pub layers: Vec<BarrelLayer>,
}

impl Default for BarrelGeometry {
    fn default() -> Self {
        Self::three_layer_defaults()
    }
}

#[derive(Deserialize)]
struct JsonConfig {
    #[serde(default)]
    geometry: JsonGeometry,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonGeometry {
    first_slot_id: u32,
    layers: Option<Vec<JsonLayer>>,
}

impl Default for JsonGeometry {
    fn default() -> Self {
        Self {
            first_slot_id: 1,
            layers: None,
        }
    }
}

#[derive(Deserialize)]
struct JsonLayer {
    slots: usize,
    radius: f64,
}

impl BarrelGeometry {
    /// Three-layer barrel: 48, 48 and 96 slots at radii 13.0, 15.5 and 18.0.
    #[must_use]
    pub fn three_layer_defaults() -> Self {
        let layers = [(48, 13.0), (48, 15.5), (96, 18.0)]
            .into_iter()
            .map(|(slots, radius)| BarrelLayer { slots, radius })
            .collect();
        Self {
            first_slot_id: 1,
            layers,
        }
    }

    /// Builds a geometry from `(slots, radius)` pairs, innermost first.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the layout is invalid.
    pub fn from_layers(first_slot_id: u32, layers: &[(usize, f64)]) -> Result<Self> {
        let geometry = Self {
            first_slot_id,
            layers: layers
                .iter()
                .map(|&(slots, radius)| BarrelLayer { slots, radius })
                .collect(),
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Loads the geometry from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// describes an invalid layout.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let json_config: JsonConfig = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_config(json_config)
    }

    /// Loads the geometry from a JSON string.
    ///
    /// Missing fields fall back to [`BarrelGeometry::three_layer_defaults`].
    ///
    /// # Errors
    /// Returns an error if the string is not valid JSON or describes an
    /// invalid layout.
    pub fn from_json(json: &str) -> Result<Self> {
        let json_config: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json_config)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let geometry = config.geometry;
        let layers = match geometry.layers {
            Some(layers) => layers
                .into_iter()
                .map(|layer| BarrelLayer {
                    slots: layer.slots,
                    radius: layer.radius,
                })
                .collect(),
            None => Self::three_layer_defaults().layers,
        };

        let barrel = Self {
            first_slot_id: geometry.first_slot_id,
            layers,
        };
        barrel.validate()?;
        Ok(barrel)
    }

    /// Checks that the layout can be mapped.
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::Config("geometry has no layers".to_string()));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.slots == 0 {
                return Err(Error::Config(format!("layer {index} has no slots")));
            }
            if !(layer.radius.is_finite() && layer.radius > 0.0) {
                return Err(Error::Config(format!(
                    "layer {index} has invalid radius {}",
                    layer.radius
                )));
            }
        }
        let total: usize = self.layers.iter().map(|layer| layer.slots).sum();
        if u64::from(self.first_slot_id) + total as u64 > u64::from(u32::MAX) {
            return Err(Error::Config(format!(
                "{total} slots starting at id {} overflow the slot id range",
                self.first_slot_id
            )));
        }
        Ok(())
    }

    /// Total number of slots over all layers.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.layers.iter().map(|layer| layer.slots).sum()
    }
}

impl GeometryMapper for BarrelGeometry {
    fn map(&self, slot: &SlotRef) -> StripPosition {
        let Some(mut offset) = slot.id.checked_sub(self.first_slot_id) else {
            return StripPosition::UNMAPPED;
        };
        for (layer_index, layer) in self.layers.iter().enumerate() {
            let slots = u32::try_from(layer.slots).unwrap_or(u32::MAX);
            if offset < slots {
                return match (i32::try_from(layer_index), i32::try_from(offset)) {
                    (Ok(layer), Ok(slot)) => StripPosition::new(layer, slot),
                    _ => StripPosition::UNMAPPED,
                };
            }
            offset -= slots;
        }
        StripPosition::UNMAPPED
    }

    fn slot_count_per_layer(&self) -> Vec<usize> {
        self.layers.iter().map(|layer| layer.slots).collect()
    }

    fn layer_radius(&self, layer: usize) -> Option<f64> {
        self.layers.get(layer).map(|layer| layer.radius)
    }
}
