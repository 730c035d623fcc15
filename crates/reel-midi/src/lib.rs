//! Standard MIDI File export (Format 1, PPQ 480) and split-by-track/clip
//! ZIP export.
//!
//! Grounded on `midi/export.py` and `midi/export_zip.py` for the event
//! model and filename conventions; byte-level SMF writing goes through
//! `midly`'s own writer (rather than a hand-rolled VLQ encoder) since it
//! is already evidenced in the corpus and produces the same Format-1
//! output for an identical event stream.

mod export;
mod export_zip;
mod sanitize;

pub use export::{export_project, export_project_to_midi, flatten_track, AbsoluteNote, TrackExport};
pub use export_zip::{export_project_to_zip, SplitBy};
pub use sanitize::sanitize_filename;

#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("midi encoding failed: {0}")]
    Encode(String),
    #[error("zip encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MidiError>;
