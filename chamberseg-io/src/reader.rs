//! Event file reading.
//!
//! An event file is a JSON document holding an optional builder
//! configuration and a list of chambers, each with its pose, layer depths
//! and hits.

use crate::{Error, Result};
use chamberseg_core::config::SegmentConfig;
use chamberseg_core::geometry::PlanarChamber;
use chamberseg_core::hit::RecHitData;
use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// One chamber of an event file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChamberRecord {
    /// Free-form chamber identifier, copied to the output.
    pub id: String,
    /// Global position of the chamber origin.
    pub origin: [f64; 3],
    /// Chamber orientation as roll, pitch, yaw (radians).
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Chamber-local depth of each layer, from layer 1 upwards.
    pub layer_z: Vec<f64>,
    /// Hits measured in this chamber.
    #[serde(default)]
    pub hits: Vec<RecHitData>,
}

impl ChamberRecord {
    /// Builds the chamber geometry.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the chamber has no layers, more
    /// layers than a layer id can address, or non-finite geometry.
    pub fn to_chamber(&self) -> Result<PlanarChamber> {
        if self.layer_z.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "chamber {}: no layers",
                self.id
            )));
        }
        if self.layer_z.len() > usize::from(u8::MAX) {
            return Err(Error::InvalidFormat(format!(
                "chamber {}: {} layers",
                self.id,
                self.layer_z.len()
            )));
        }
        let finite = self
            .origin
            .iter()
            .chain(&self.rotation)
            .chain(&self.layer_z)
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidFormat(format!(
                "chamber {}: non-finite geometry",
                self.id
            )));
        }

        let [roll, pitch, yaw] = self.rotation;
        Ok(PlanarChamber::from_euler(
            Point3::from(self.origin),
            roll,
            pitch,
            yaw,
            self.layer_z.clone(),
        ))
    }
}

/// Contents of an event file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFile {
    /// Builder configuration stored with the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SegmentConfig>,
    /// Chambers in file order.
    pub chambers: Vec<ChamberRecord>,
}

impl EventFile {
    /// Reads an event file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a valid
    /// event document.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let event: Self = serde_json::from_reader(BufReader::new(file))?;
        debug!(
            "read {} chambers ({} hits) from {}",
            event.chambers.len(),
            event.hit_count(),
            path.display()
        );
        Ok(event)
    }

    /// Parses an event document from a string.
    ///
    /// # Errors
    /// Returns an error if `json` is not a valid event document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the event as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Total number of hits over all chambers.
    #[must_use]
    pub fn hit_count(&self) -> usize {
        self.chambers.iter().map(|c| c.hits.len()).sum()
    }

    /// Builds each chamber's geometry and pairs it with its hits.
    ///
    /// # Errors
    /// Returns the first chamber geometry error.
    pub fn chamber_batch(&self) -> Result<Vec<(PlanarChamber, Vec<RecHitData>)>> {
        self.chambers
            .iter()
            .map(|record| Ok((record.to_chamber()?, record.hits.clone())))
            .collect()
    }
}
