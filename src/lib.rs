//! IChing 2D barcode generator and reader.
//!
//! A code is a square grid of 6-bit glyphs over GF(2⁶) with Reed-Solomon
//! parity, three finder bullseyes and one alignment ring. [`IChingBuilder`]
//! encodes a payload and renders it as an RGBA image; [`IChingReader`] runs
//! the full photograph-to-payload pipeline: adaptive binarization, pattern
//! location, perspective rectification, symbol extraction and error
//! correction.

pub mod builder;
mod common;
pub mod reader;

pub use builder::{IChing, IChingBuilder};
pub use common::error::{IChingError, IChingResult};
pub use common::metadata::ECLevel;
pub use common::EncodedIChing;
pub use reader::{DecodedIChing, IChingReader};
