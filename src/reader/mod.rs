pub mod binarize;
pub mod extract;
pub mod locator;
pub mod utils;

use image::RgbaImage;

use crate::common::{
    codec,
    error::{IChingError, IChingResult},
    matrix::BitMatrix,
    metadata::VERSION,
};
use binarize::BinaryImage;
use extract::extract_symbols;
use locator::{locate_patterns, Patterns};
use utils::{geometry::Point, homography::PerspectiveTransform};

// Decoded code
//------------------------------------------------------------------------------

/// The recovered payload together with where the code sat in the photograph.
#[derive(Debug, Clone)]
pub struct DecodedIChing {
    pub version: u8,
    pub size: usize,
    pub payload: String,
    pub patterns: Patterns,
}

// Reader
//------------------------------------------------------------------------------

/// Recovers payloads from photographs of IChing codes.
pub struct IChingReader;

impl IChingReader {
    pub fn read(img: &RgbaImage) -> IChingResult<DecodedIChing> {
        Self::read_image(img, false)
    }

    /// For codes rendered white-on-black: flips the channels first.
    pub fn read_inverted(img: &RgbaImage) -> IChingResult<DecodedIChing> {
        Self::read_image(img, true)
    }

    /// Tries a plain read, then once more with colours inverted.
    pub fn read_lenient(img: &RgbaImage) -> IChingResult<DecodedIChing> {
        Self::read(img).or_else(|_| Self::read_inverted(img))
    }

    /// Reads from a raw RGBA buffer of exactly `4 * width * height` bytes.
    pub fn read_raw(
        data: &[u8],
        width: u32,
        height: u32,
        inverted: bool,
    ) -> IChingResult<DecodedIChing> {
        let img = RgbaImage::from_raw(width, height, data.to_vec())
            .ok_or(IChingError::ImageTooSmall)?;
        Self::read_image(&img, inverted)
    }

    fn read_image(img: &RgbaImage, inverted: bool) -> IChingResult<DecodedIChing> {
        let bin = if inverted {
            BinaryImage::prepare_inverted(img)?
        } else {
            BinaryImage::prepare(img)?
        };

        let patterns = locate_patterns(&bin)?;
        let rect = rectify(&bin, &patterns)?;
        let code = extract_symbols(&rect)?;
        let payload = codec::decode(&code)?;

        // A successful decode has verified (or repaired) the version byte
        Ok(DecodedIChing { version: VERSION, size: code.size, payload, patterns })
    }
}

// Rectification
//------------------------------------------------------------------------------

// Maps the located quadrilateral onto an N x N matrix whose corners are the
// finder/alignment centres, sampling nearest-neighbour through the inverse
// perspective map.
fn rectify(img: &BinaryImage, patterns: &Patterns) -> IChingResult<BitMatrix> {
    let side = (patterns.top_left.dist(&patterns.top_right)
        + patterns.top_left.dist(&patterns.bottom_left))
        / 2.0;
    let n = side.round() as usize;
    if n < 2 {
        return Err(IChingError::InvalidCode);
    }

    let nf = n as f64;
    let canonical = [
        Point::new(nf, 0.0),
        Point::new(0.0, 0.0),
        Point::new(0.0, nf),
        Point::new(nf, nf),
    ];
    let located = [
        patterns.top_right,
        patterns.top_left,
        patterns.bottom_left,
        patterns.bottom_right,
    ];
    let transform = PerspectiveTransform::quad_to_quad(canonical, located);

    let (w, h) = (img.width() as isize, img.height() as isize);
    let mut rect = BitMatrix::new(n, n);
    for y in 0..n {
        for x in 0..n {
            let p = transform.map(x as f64, y as f64);
            if !p.x.is_finite() || !p.y.is_finite() {
                continue;
            }
            let (sx, sy) = (p.x.round() as isize, p.y.round() as isize);
            if 0 <= sx && sx < w && 0 <= sy && sy < h {
                rect.set(x, y, img.get(sx as usize, sy as usize));
            }
        }
    }
    Ok(rect)
}
