use image::{Rgba, RgbaImage};

use crate::common::{
    base_dimension,
    error::{IChingError, IChingResult},
    matrix::BitMatrix,
    metadata::{BITS_PER_SYMBOL, FINDER_RADIUS, GAP_DIM, QUIET_ZONE, SYMBOL_DIM, UNIT_DIM},
    EncodedIChing,
};

// IChing code
//------------------------------------------------------------------------------

/// A built code, ready to render at any resolution.
#[derive(Debug, Clone)]
pub struct IChing {
    code: EncodedIChing,
    round_edges: bool,
    inverted: bool,
}

impl IChing {
    pub(crate) fn new(code: EncodedIChing, round_edges: bool, inverted: bool) -> Self {
        Self { code, round_edges, inverted }
    }

    pub fn version(&self) -> u8 {
        self.code.version
    }

    pub fn size(&self) -> usize {
        self.code.size
    }

    pub fn data(&self) -> &[u8] {
        &self.code.data
    }

    /// Draws the logical bit matrix at `resolution` x `resolution` pixels.
    /// The base drawing is scaled by the largest integer that fits and centred
    /// with equal padding.
    pub fn to_bit_matrix(&self, resolution: u32) -> IChingResult<BitMatrix> {
        let res = resolution as usize;
        let base = base_dimension(self.code.size);
        let scale = res / base;
        if scale < 1 {
            return Err(IChingError::ResolutionTooSmall);
        }
        let pad = (res - base * scale) / 2;

        let mut canvas = BitMatrix::new(res, res);

        // Finder rings at top-left, top-right & bottom-left; the alignment
        // ring takes the bottom-right corner.
        let near = pad + (QUIET_ZONE + FINDER_RADIUS) * scale;
        let far = pad + (base - QUIET_ZONE - FINDER_RADIUS) * scale;
        for (cx, cy) in [(near, near), (far, near), (near, far)] {
            draw_finder(&mut canvas, cx, cy, scale);
        }
        draw_alignment(&mut canvas, far, far, scale);

        let origin = pad + (2 * FINDER_RADIUS + QUIET_ZONE) * scale;
        let step = (SYMBOL_DIM + GAP_DIM) * scale;
        for (i, &symbol) in self.code.data.iter().enumerate() {
            let col = i / self.code.size;
            let row = i % self.code.size;
            let x0 = origin + col * step;
            let y0 = origin + row * step;
            self.draw_symbol(&mut canvas, x0, y0, symbol, scale);
        }

        Ok(canvas)
    }

    // One glyph: six horizontal bars top to bottom, MSB first. A zero bit
    // breaks its bar with a centred clear slot.
    fn draw_symbol(&self, canvas: &mut BitMatrix, x0: usize, y0: usize, symbol: u8, scale: usize) {
        let bar_w = SYMBOL_DIM * scale;
        let bar_h = UNIT_DIM * scale;
        let slot_x = 7 * scale; // 3.5 units from the bar's left edge
        let slot_w = 4 * scale; // 2 units wide

        for b in 0..BITS_PER_SYMBOL {
            let y = y0 + 2 * b * bar_h;
            let bit = (symbol >> (BITS_PER_SYMBOL - 1 - b)) & 1;

            canvas.fill_rect(x0, y, bar_w, bar_h, 1);
            if bit == 0 {
                canvas.fill_rect(x0 + slot_x, y, slot_w, bar_h, 0);
            }

            if self.round_edges {
                if bit == 0 {
                    round_corners(canvas, x0, y, slot_x, bar_h);
                    round_corners(canvas, x0 + slot_x + slot_w, y, bar_w - slot_x - slot_w, bar_h);
                } else {
                    round_corners(canvas, x0, y, bar_w, bar_h);
                }
            }
        }
    }

    /// Renders to RGBA pixels: black cells are (0,0,0,255), white cells
    /// (255,255,255,255), swapped when `inverted` was requested.
    pub fn to_image(&self, resolution: u32) -> IChingResult<RgbaImage> {
        let bits = self.to_bit_matrix(resolution)?;
        let (black, white) = if self.inverted {
            (Rgba([255, 255, 255, 255]), Rgba([0, 0, 0, 255]))
        } else {
            (Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255]))
        };

        let mut img = RgbaImage::new(resolution, resolution);
        for y in 0..bits.height() {
            for x in 0..bits.width() {
                let px = if bits.is_black(x, y) { black } else { white };
                img.put_pixel(x as u32, y as u32, px);
            }
        }
        Ok(img)
    }

    /// Terminal preview at the base resolution, one character per cell.
    pub fn to_text(&self) -> String {
        let base = base_dimension(self.code.size) as u32;
        let bits = self.to_bit_matrix(base).expect("base resolution always fits");

        let mut canvas = String::with_capacity(bits.height() * (bits.width() + 1));
        for y in 0..bits.height() {
            for x in 0..bits.width() {
                canvas.push(if bits.is_black(x, y) { '█' } else { ' ' });
            }
            canvas.push('\n');
        }
        canvas
    }
}

// Ring drawing
//------------------------------------------------------------------------------

// Concentric bullseye: filled stone, clear ring, filled outer ring.
fn draw_finder(canvas: &mut BitMatrix, cx: usize, cy: usize, scale: usize) {
    let outer = FINDER_RADIUS * scale;
    fill_circle(canvas, cx, cy, outer, 1);
    fill_circle(canvas, cx, cy, outer * 5 / 7, 0);
    fill_circle(canvas, cx, cy, outer * 3 / 7, 1);
}

// Single ring between 3/7 and 5/7 of the finder radius.
fn draw_alignment(canvas: &mut BitMatrix, cx: usize, cy: usize, scale: usize) {
    let outer = FINDER_RADIUS * scale;
    fill_circle(canvas, cx, cy, outer * 5 / 7, 1);
    fill_circle(canvas, cx, cy, outer * 3 / 7, 0);
}

// Midpoint circle, filled with horizontal spans.
fn fill_circle(canvas: &mut BitMatrix, cx: usize, cy: usize, r: usize, bit: u8) {
    let (cx, cy) = (cx as isize, cy as isize);
    let mut x = r as isize;
    let mut y = 0isize;
    let mut err = 1 - x;

    while y <= x {
        fill_span(canvas, cx - x, cx + x, cy + y, bit);
        fill_span(canvas, cx - x, cx + x, cy - y, bit);
        fill_span(canvas, cx - y, cx + y, cy + x, bit);
        fill_span(canvas, cx - y, cx + y, cy - x, bit);

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

fn fill_span(canvas: &mut BitMatrix, x0: isize, x1: isize, y: isize, bit: u8) {
    if y < 0 || y >= canvas.height() as isize {
        return;
    }
    let x0 = x0.max(0);
    let x1 = x1.min(canvas.width() as isize - 1);
    for x in x0..=x1 {
        canvas.set(x as usize, y as usize, bit);
    }
}

// Clears quarter-circle notches at the four corners of a bar segment. Purely
// cosmetic; the sampled centre of every bar stays intact.
fn round_corners(canvas: &mut BitMatrix, x: usize, y: usize, w: usize, h: usize) {
    let r = (h / 2).min(w / 2);
    if r == 0 {
        return;
    }
    let r2 = (r * r) as isize;

    let arcs = [
        (x + r, y + r),         // top-left corner
        (x + w - r, y + r),     // top-right
        (x + r, y + h - r),     // bottom-left
        (x + w - r, y + h - r), // bottom-right
    ];
    let corners = [(x, y), (x + w - r, y), (x, y + h - r), (x + w - r, y + h - r)];

    for ((ax, ay), (sx, sy)) in arcs.into_iter().zip(corners) {
        for py in sy..sy + r {
            for px in sx..sx + r {
                let dx = px as isize - ax as isize;
                let dy = py as isize - ay as isize;
                if dx * dx + dy * dy > r2 {
                    canvas.set(px, py, 0);
                }
            }
        }
    }
}
