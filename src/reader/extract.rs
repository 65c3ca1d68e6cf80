use crate::common::{
    error::{IChingError, IChingResult},
    matrix::BitMatrix,
    metadata::{BITS_PER_SYMBOL, FINDER_RADIUS, GAP_DIM, SYMBOL_DIM, UNIT_DIM},
    EncodedIChing,
};

// Symbol extractor
//------------------------------------------------------------------------------

/// Black fraction below which a cell border column counts as outside the ink.
const VERTICAL_BORDER_BLACK_THRESHOLD: f64 = 0.25;

/// Black fraction below which a scan line is no bar at all.
const LINE_BLACK_THRESHOLD: f64 = 0.5;

/// Black fraction inside the clear-slot window below which a bar is broken.
const SLOT_BLACK_THRESHOLD: f64 = 0.9;

/// A state run must exceed this fraction of a unit to count as a bar line.
const UNIT_DIM_THRESHOLD: f64 = 0.5;

/// An invalid run must exceed this fraction of the gap to be a real gap.
const GAP_DIM_THRESHOLD: f64 = 0.5;

/// Tolerance on each slice of a finder-radius scan.
const FINDER_SLICE_TOLERANCE: f64 = 0.2;

/// Per-line classification while walking down a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Invalid,
    Zero,
    One,
}

/// Reads one 6-bit symbol per grid cell out of a rectified bit matrix whose
/// corners sit on the finder/alignment centres.
pub fn extract_symbols(rect: &BitMatrix) -> IChingResult<EncodedIChing> {
    let scales = estimate_scales(rect)?;

    // Grid dimension from the span between finder centres; the horizontal
    // and vertical estimates must agree on it.
    let cells_h = grid_cells(rect.width() as f64 / scales.horizontal);
    let cells_v = grid_cells(rect.height() as f64 / scales.vertical);
    if cells_h != cells_v {
        return Err(IChingError::NotSquare);
    }
    let cells = cells_h;
    if cells < 2 {
        return Err(IChingError::InvalidCode);
    }

    let scale = scales.overall;
    let step = (SYMBOL_DIM + GAP_DIM) as f64 * scale;
    let symbol_dim = SYMBOL_DIM as f64 * scale;
    let finder_radius = FINDER_RADIUS as f64 * scale;

    let mut data = Vec::with_capacity(cells * cells);
    for col in 0..cells {
        let left = finder_radius + col as f64 * step;
        for row in 0..cells {
            let top = finder_radius + row as f64 * step;
            data.push(read_cell(rect, left, top, symbol_dim, scale));
        }
    }

    Ok(EncodedIChing { version: data[0], size: cells, data })
}

fn grid_cells(base_dim: f64) -> usize {
    let cells = (base_dim + (GAP_DIM as f64 - SYMBOL_DIM as f64)) / (GAP_DIM + SYMBOL_DIM) as f64;
    cells.round().max(0.0) as usize
}

// Scale estimation
//------------------------------------------------------------------------------

struct Scales {
    overall: f64,
    horizontal: f64,
    vertical: f64,
}

// Walks outward from the three visible finder centres (the matrix corners),
// reading the black-white-black radius slice in the horizontal, vertical and
// diagonal directions.
fn estimate_scales(rect: &BitMatrix) -> IChingResult<Scales> {
    let w = rect.width() as isize;
    let h = rect.height() as isize;
    if w < 2 || h < 2 {
        return Err(IChingError::InvalidCode);
    }

    let corners = [
        ((0, 0), (1, 0), (0, 1), (1, 1)),
        ((w - 1, 0), (-1, 0), (0, 1), (-1, 1)),
        ((0, h - 1), (1, 0), (0, -1), (1, -1)),
    ];

    let mut horizontal = Vec::with_capacity(3);
    let mut vertical = Vec::with_capacity(3);
    let mut all = Vec::with_capacity(9);

    for ((cx, cy), hdir, vdir, ddir) in corners {
        if let Some(r) = scan_radius(rect, cx, cy, hdir.0, hdir.1) {
            horizontal.push(r);
            all.push(r);
        }
        if let Some(r) = scan_radius(rect, cx, cy, vdir.0, vdir.1) {
            vertical.push(r);
            all.push(r);
        }
        if let Some(r) = scan_radius(rect, cx, cy, ddir.0, ddir.1) {
            all.push(r * std::f64::consts::SQRT_2);
        }
    }

    if horizontal.is_empty() || vertical.is_empty() {
        return Err(IChingError::InvalidCode);
    }

    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    Ok(Scales {
        overall: mean(&all) / FINDER_RADIUS as f64,
        horizontal: mean(&horizontal) / FINDER_RADIUS as f64,
        vertical: mean(&vertical) / FINDER_RADIUS as f64,
    })
}

// Black run, white run, black run from the centre along one direction; the
// three slices must split the radius roughly 3:2:2.
fn scan_radius(rect: &BitMatrix, cx: isize, cy: isize, dx: isize, dy: isize) -> Option<f64> {
    let (w, h) = (rect.width() as isize, rect.height() as isize);
    let mut runs = [0f64; 3];
    let mut state = 0usize;
    let mut expect_black = true;
    let (mut x, mut y) = (cx, cy);

    loop {
        let inside = 0 <= x && x < w && 0 <= y && y < h;
        let matches = inside && rect.is_black(x as usize, y as usize) == expect_black;
        if matches {
            runs[state] += 1.0;
            x += dx;
            y += dy;
        } else {
            if runs[state] == 0.0 {
                return None;
            }
            state += 1;
            if state > 2 {
                break;
            }
            expect_black = !expect_black;
        }
    }

    let total: f64 = runs.iter().sum();
    let shares = [3.0 / 7.0, 2.0 / 7.0, 2.0 / 7.0];
    for (&run, share) in runs.iter().zip(shares) {
        let expected = total * share;
        if (run - expected).abs() > expected * FINDER_SLICE_TOLERANCE + 1.0 {
            return None;
        }
    }

    // The walk counts the centre pixel itself; the radius reaches from the
    // centre to the last ring pixel.
    Some(total - 1.0)
}

// Cell reading
//------------------------------------------------------------------------------

// Reads the six bars of one cell, top to bottom, MSB first. Bars read as
// broken clear their bit; undetected bars keep the default one.
fn read_cell(rect: &BitMatrix, left: f64, top: f64, symbol_dim: f64, scale: f64) -> u8 {
    let unit = UNIT_DIM as f64 * scale;
    let gap = GAP_DIM as f64 * scale;

    let (left, right) = refine_borders(rect, left, left + symbol_dim, top, top + symbol_dim);

    let mut mask: u8 = (1 << BITS_PER_SYMBOL) - 1;
    let mut bits_read = 0usize;

    let y_start = ((top - gap / 2.0).max(0.0)) as usize;
    let y_end = ((top + symbol_dim + gap / 2.0) as usize).min(rect.height());

    let mut prev = LineState::Invalid;
    let mut run = 0usize;
    for y in y_start..y_end {
        let state = classify_line(rect, left, right, y, unit);
        if state == prev {
            run += 1;
            continue;
        }
        record_run(prev, run, &mut mask, &mut bits_read, unit, gap);
        prev = state;
        run = 1;
    }
    record_run(prev, run, &mut mask, &mut bits_read, unit, gap);

    mask
}

fn record_run(
    state: LineState,
    run: usize,
    mask: &mut u8,
    bits_read: &mut usize,
    unit: f64,
    gap: f64,
) {
    match state {
        LineState::One | LineState::Zero => {
            if run as f64 > UNIT_DIM_THRESHOLD * unit && *bits_read < BITS_PER_SYMBOL {
                if state == LineState::Zero {
                    *mask &= !(1 << (BITS_PER_SYMBOL - 1 - *bits_read));
                }
                *bits_read += 1;
            }
        }
        LineState::Invalid => {
            // A gap-sized invalid run strictly inside the cell body marks a
            // missing bar, left at its default one.
            if run as f64 > GAP_DIM_THRESHOLD * gap
                && *bits_read > 0
                && *bits_read < BITS_PER_SYMBOL
            {
                *bits_read += 1;
            }
        }
    }
}

// Walks each x-border outward or inward until the ink fraction crosses the
// threshold, bounded to half a symbol from the estimate.
fn refine_borders(rect: &BitMatrix, left: f64, right: f64, top: f64, bottom: f64) -> (f64, f64) {
    let limit = (right - left) / 2.0;

    let mut l = left;
    if border_fraction(rect, l, top, bottom) >= VERTICAL_BORDER_BLACK_THRESHOLD {
        while l > left - limit
            && border_fraction(rect, l - 1.0, top, bottom) >= VERTICAL_BORDER_BLACK_THRESHOLD
        {
            l -= 1.0;
        }
    } else {
        while l < left + limit
            && border_fraction(rect, l + 1.0, top, bottom) < VERTICAL_BORDER_BLACK_THRESHOLD
        {
            l += 1.0;
        }
        l += 1.0;
    }

    let mut r = right;
    if border_fraction(rect, r - 1.0, top, bottom) >= VERTICAL_BORDER_BLACK_THRESHOLD {
        while r < right + limit
            && border_fraction(rect, r, top, bottom) >= VERTICAL_BORDER_BLACK_THRESHOLD
        {
            r += 1.0;
        }
    } else {
        while r > right - limit
            && border_fraction(rect, r - 2.0, top, bottom) < VERTICAL_BORDER_BLACK_THRESHOLD
        {
            r -= 1.0;
        }
    }

    (l, r)
}

// Fraction of ink along the vertical border segment at column x.
fn border_fraction(rect: &BitMatrix, x: f64, top: f64, bottom: f64) -> f64 {
    let xi = x.round() as isize;
    if xi < 0 || xi >= rect.width() as isize {
        return 0.0;
    }
    let y0 = top.max(0.0) as usize;
    let y1 = (bottom as usize).min(rect.height());
    if y0 >= y1 {
        return 0.0;
    }

    let black = (y0..y1).filter(|&y| rect.is_black(xi as usize, y)).count();
    black as f64 / (y1 - y0) as f64
}

// INVALID below half ink, ZERO when the slot window is clear, ONE otherwise.
fn classify_line(rect: &BitMatrix, left: f64, right: f64, y: usize, unit: f64) -> LineState {
    let x0 = left.max(0.0) as usize;
    let x1 = (right as usize).min(rect.width());
    if x0 >= x1 || y >= rect.height() {
        return LineState::Invalid;
    }

    let width = x1 - x0;
    let black = (x0..x1).filter(|&x| rect.is_black(x, y)).count();
    if (black as f64) < LINE_BLACK_THRESHOLD * width as f64 {
        return LineState::Invalid;
    }

    // Clear-slot window, centred 4.5 units into the bar
    let s0 = (left + 3.5 * unit).max(0.0) as usize;
    let s1 = ((left + 5.5 * unit) as usize).min(rect.width());
    if s0 >= s1 {
        return LineState::One;
    }
    let slot_black = (s0..s1).filter(|&x| rect.is_black(x, y)).count();
    if (slot_black as f64) < SLOT_BLACK_THRESHOLD * (s1 - s0) as f64 {
        LineState::Zero
    } else {
        LineState::One
    }
}
