mod decoder;
mod encoder;

mod galois;
mod poly;

pub use decoder::decode;
pub use encoder::encode;
pub use galois::{gf, GaloisField, GF_EXP, GF_SIZE};
pub use poly::GfPoly;
