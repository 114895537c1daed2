//! Outpost 2 sprite archive (`op2_art.prt` + `op2_art.bmp`) reading and writing.
//!
//! The `.prt` container holds palettes, bitmap metadata and animations. Pixels
//! live in the companion `.bmp`, addressed by byte offsets stored in the container.
//! Whatever follows the animations is kept as opaque bytes.
pub mod bmp;
pub mod color_table;
mod constants;
pub mod error;
mod nom_helpers;
pub mod palette_file;
mod parser;
mod types;
mod writer;

pub use error::{PrtError, Section};
pub use palette_file::PaletteFormat;
pub use types::*;

/// Reads an archive from the container and companion bytes.
pub fn decode(container: &[u8], companion: &[u8]) -> Result<Archive, PrtError> {
    Archive::open_from_bytes(container, companion)
}

/// Returns the container and companion bytes.
pub fn encode(archive: &Archive) -> Result<(Vec<u8>, Vec<u8>), PrtError> {
    archive.write_to_bytes()
}
