use image::RgbaImage;

use crate::common::{
    error::{IChingError, IChingResult},
    matrix::{BitMatrix, ByteMatrix},
};

#[cfg(test)]
use std::path::Path;

#[cfg(test)]
use image::ImageResult;

// Adaptive binarizer
//------------------------------------------------------------------------------

/// Side of the sliding box used for the local threshold.
const BLOCK_SIZE: usize = 80;

/// Subtracted from every block mean so flat white areas stay white.
const MEAN_BIAS: i32 = 2;

/// Below this luma-to-threshold distance a pixel is considered part of a flat
/// region and inherits its neighbours' decision.
const MIN_VARIANCE: i32 = 20;

/// A photograph reduced to {0, 1}: 1 is ink, 0 is background.
#[derive(Debug)]
pub struct BinaryImage {
    bits: BitMatrix,
}

impl BinaryImage {
    /// Binarizes an RGBA photograph through a sliding block-mean threshold.
    pub fn prepare(img: &RgbaImage) -> IChingResult<Self> {
        Self::binarize(img, false)
    }

    /// Same, with the colour channels flipped first; for codes rendered
    /// white-on-black.
    pub fn prepare_inverted(img: &RgbaImage) -> IChingResult<Self> {
        Self::binarize(img, true)
    }

    pub fn width(&self) -> usize {
        self.bits.width()
    }

    pub fn height(&self) -> usize {
        self.bits.height()
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.bits.get(x, y)
    }

    pub fn is_black(&self, x: usize, y: usize) -> bool {
        self.bits.is_black(x, y)
    }

    pub fn bits(&self) -> &BitMatrix {
        &self.bits
    }

    /// Fixed-threshold binarization; useful against synthetic images where
    /// the adaptive pass is overkill.
    pub fn simple_thresholding(img: &RgbaImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let mut bits = BitMatrix::new(w, h);
        for (x, y, px) in img.enumerate_pixels() {
            let [r, g, b, _] = px.0;
            if r < 128 && g < 128 && b < 128 {
                bits.set(x as usize, y as usize, 1);
            }
        }
        Self { bits }
    }

    #[cfg(test)]
    pub fn save(&self, path: &Path) -> ImageResult<()> {
        let mut img = image::GrayImage::new(self.width() as u32, self.height() as u32);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let v = if self.is_black(x, y) { 0 } else { 255 };
                img.put_pixel(x as u32, y as u32, image::Luma([v]));
            }
        }
        img.save(path)
    }

    fn binarize(img: &RgbaImage, inverted: bool) -> IChingResult<Self> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        if w < BLOCK_SIZE || h < BLOCK_SIZE {
            return Err(IChingError::ImageTooSmall);
        }

        let luma = to_luma(img, inverted);
        let thresholds = threshold_table(&luma);

        // Per-pixel thresholds actually applied; flat regions look them up
        // for the three already-decided neighbours.
        let mut applied = vec![0i32; w * h];
        let mut bits = BitMatrix::new(w, h);

        for y in 0..h {
            for x in 0..w {
                let bx = (x + BLOCK_SIZE / 2).clamp(BLOCK_SIZE - 1, w - 1) - (BLOCK_SIZE - 1);
                let by = (y + BLOCK_SIZE / 2).clamp(BLOCK_SIZE - 1, h - 1) - (BLOCK_SIZE - 1);
                let lum = luma.get(x, y) as i32;

                let mut threshold = thresholds.get(bx, by);
                if (threshold - lum).abs() < MIN_VARIANCE {
                    // Flat region: follow the neighbours above & left
                    threshold = if x > 0 && y > 0 {
                        (applied[y * w + x - 1]
                            + applied[(y - 1) * w + x]
                            + applied[(y - 1) * w + x - 1])
                            / 3
                    } else {
                        lum / 2 - MEAN_BIAS
                    };
                }

                applied[y * w + x] = threshold;
                if lum < threshold {
                    bits.set(x, y, 1);
                }
            }
        }

        Ok(Self { bits })
    }
}

// BT.709 luma from the RGB channels; alpha is ignored.
fn to_luma(img: &RgbaImage, inverted: bool) -> ByteMatrix {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut luma = ByteMatrix::new(w, h);

    for (x, y, px) in img.enumerate_pixels() {
        let [mut r, mut g, mut b, _] = px.0;
        if inverted {
            r = 255 - r;
            g = 255 - g;
            b = 255 - b;
        }
        let l = 0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64;
        luma.set(x as usize, y as usize, l as u8);
    }
    luma
}

// Threshold table
//------------------------------------------------------------------------------

// Mean of every BLOCK_SIZE x BLOCK_SIZE window minus the bias, computed with
// sliding row & column sums: one output per window origin.
struct ThresholdTable {
    w: usize,
    values: Vec<i32>,
}

impl ThresholdTable {
    fn get(&self, bx: usize, by: usize) -> i32 {
        self.values[by * self.w + bx]
    }
}

fn threshold_table(luma: &ByteMatrix) -> ThresholdTable {
    let (w, h) = (luma.width(), luma.height());
    let (tw, th) = (w - BLOCK_SIZE + 1, h - BLOCK_SIZE + 1);
    let area = (BLOCK_SIZE * BLOCK_SIZE) as i32;
    let mut values = vec![0i32; tw * th];

    // Running sum of the leftmost window of every row
    let mut row_sums = vec![0i32; h];
    for (y, sum) in row_sums.iter_mut().enumerate() {
        for x in 0..BLOCK_SIZE {
            *sum += luma.get(x, y) as i32;
        }
    }

    for bx in 0..tw {
        if bx > 0 {
            // Slide every row sum one column right
            for (y, sum) in row_sums.iter_mut().enumerate() {
                *sum += luma.get(bx + BLOCK_SIZE - 1, y) as i32 - luma.get(bx - 1, y) as i32;
            }
        }

        // Slide the column of row sums downwards
        let mut col_sum: i32 = row_sums[..BLOCK_SIZE].iter().sum();
        values[bx] = col_sum / area - MEAN_BIAS;
        for by in 1..th {
            col_sum += row_sums[by + BLOCK_SIZE - 1] - row_sums[by - 1];
            values[by * tw + bx] = col_sum / area - MEAN_BIAS;
        }
    }

    ThresholdTable { w: tw, values }
}

#[cfg(test)]
mod binarize_tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn flat_image(w: u32, h: u32, v: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    #[test]
    fn test_rejects_small_images() {
        let img = flat_image(79, 200, 255);
        assert!(matches!(BinaryImage::prepare(&img), Err(IChingError::ImageTooSmall)));
        let img = flat_image(200, 79, 255);
        assert!(matches!(BinaryImage::prepare(&img), Err(IChingError::ImageTooSmall)));
    }

    #[test]
    fn test_flat_white_stays_white() {
        let img = flat_image(120, 120, 255);
        let bin = BinaryImage::prepare(&img).unwrap();
        for y in 0..120 {
            for x in 0..120 {
                assert!(!bin.is_black(x, y), "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_black_square_on_white() {
        let mut img = flat_image(200, 200, 255);
        for y in 80..120 {
            for x in 80..120 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let bin = BinaryImage::prepare(&img).unwrap();
        assert!(bin.is_black(100, 100));
        assert!(!bin.is_black(10, 10));
        assert!(!bin.is_black(190, 190));
    }

    #[test]
    fn test_gradient_keeps_local_contrast() {
        // A smooth horizontal gradient with dark dots on top; the dots must
        // binarize black even in the bright half.
        let mut img = RgbaImage::from_fn(256, 120, |x, _| {
            let v = x as u8;
            Rgba([v, v, v, 255])
        });
        for y in 50..54 {
            for x in 200..204 {
                img.put_pixel(x, y, Rgba([40, 40, 40, 255]));
            }
        }
        let bin = BinaryImage::prepare(&img).unwrap();
        assert!(bin.is_black(201, 51));
    }

    #[test]
    fn test_inverted_preparation() {
        let mut img = flat_image(200, 200, 0);
        for y in 80..120 {
            for x in 80..120 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let bin = BinaryImage::prepare_inverted(&img).unwrap();
        assert!(bin.is_black(100, 100));
        assert!(!bin.is_black(10, 10));
    }
}
