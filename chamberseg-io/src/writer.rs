//! Segment output files.

use crate::{Error, Result};
use chamberseg_core::hit::RecHit;
use chamberseg_core::segment::Segment;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of [`SegmentRecord`].
    Json,
    /// One CSV row per segment.
    Csv,
}

impl OutputFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for extensions other than `json`
    /// and `csv`.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            _ => Err(Error::InvalidFormat(format!(
                "unsupported output extension: {}",
                path.display()
            ))),
        }
    }
}

/// Flat, serializable view of one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Identifier of the chamber the segment belongs to.
    pub chamber: String,
    /// Position of the segment in its chamber's output.
    pub index: usize,
    /// Input indices of the segment's hits.
    pub hit_indices: Vec<usize>,
    /// Layers of the segment's hits, in the same order.
    pub layers: Vec<u8>,
    /// Chamber-local point at depth zero.
    pub position: [f64; 3],
    /// Chamber-local unit direction.
    pub direction: [f64; 3],
    /// Error matrix, rows ordered `(slope_u, slope_v, pos_u, pos_v)`.
    pub errors: [[f64; 4]; 4],
    /// Chi-square of the fit.
    pub chi2: f64,
    /// `2 * hits - 4`.
    pub degrees_of_freedom: usize,
}

impl SegmentRecord {
    /// Flattens `segment`.
    pub fn from_segment<H: RecHit>(chamber: &str, index: usize, segment: &Segment<H>) -> Self {
        let p = &segment.local_position;
        let d = &segment.local_direction;
        let mut errors = [[0.0; 4]; 4];
        for (r, row) in errors.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = segment.errors[(r, c)];
            }
        }
        Self {
            chamber: chamber.to_owned(),
            index,
            hit_indices: segment.hit_indices.clone(),
            layers: segment.layers(),
            position: [p.x, p.y, p.z],
            direction: [d.x, d.y, d.z],
            errors,
            chi2: segment.chi2,
            degrees_of_freedom: segment.degrees_of_freedom(),
        }
    }
}

/// Writer for reconstructed segments.
pub struct SegmentFileWriter {
    writer: BufWriter<File>,
}

impl SegmentFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes records in the given format.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write(&mut self, records: &[SegmentRecord], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => self.write_json(records),
            OutputFormat::Csv => self.write_csv(records),
        }
    }

    /// Writes records as a pretty-printed JSON array.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_json(&mut self, records: &[SegmentRecord]) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, records)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes records as CSV.
    ///
    /// Hit indices are joined with `;`. Only the diagonal of the error
    /// matrix is written.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, records: &[SegmentRecord]) -> Result<()> {
        writeln!(
            self.writer,
            "chamber,index,n_hits,hits,pos_u,pos_v,pos_z,dir_u,dir_v,dir_z,\
             var_slope_u,var_slope_v,var_pos_u,var_pos_v,chi2,ndof"
        )?;

        for r in records {
            let hits = r
                .hit_indices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";");
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                r.chamber,
                r.index,
                r.hit_indices.len(),
                hits,
                r.position[0],
                r.position[1],
                r.position[2],
                r.direction[0],
                r.direction[1],
                r.direction[2],
                r.errors[0][0],
                r.errors[1][1],
                r.errors[2][2],
                r.errors[3][3],
                r.chi2,
                r.degrees_of_freedom
            )?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
