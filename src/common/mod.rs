pub mod alphabet;
pub mod codec;
pub mod ec;
pub mod error;
pub mod matrix;
pub mod metadata;

pub use codec::*;
pub use error::*;
pub use matrix::*;
pub use metadata::*;
