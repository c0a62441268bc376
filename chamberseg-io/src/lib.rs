//! chamberseg-io: Event and segment file I/O for chamberseg.
//!
//! Event files are JSON documents describing chambers and their hits;
//! reconstructed segments are written back as JSON or CSV.
//!

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{ChamberRecord, EventFile};
pub use writer::{OutputFormat, SegmentFileWriter, SegmentRecord};
