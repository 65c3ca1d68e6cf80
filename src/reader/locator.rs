use crate::common::error::{IChingError, IChingResult};
use crate::reader::binarize::BinaryImage;
use crate::reader::utils::geometry::{cross, Point};

// Pattern locator
//------------------------------------------------------------------------------

/// Black/white run ratio of a finder bullseye.
pub const FINDER_RATIO: [usize; 5] = [1, 1, 3, 1, 1];

/// Black/white run ratio of the alignment ring.
pub const ALIGNMENT_RATIO: [usize; 3] = [1, 3, 1];

/// Candidates closer than this are the same physical pattern.
const MIN_PATTERN_DIST: f64 = 50.0;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// A ratio match with its measured diameter and shape error.
#[derive(Debug, Clone)]
pub struct LocatedPattern {
    pub center: Point,
    pub size: f64,
    pub error: f64,
}

/// Scans a binarized image for runs matching a black-bounded ratio, first
/// along every other row, then cross-validated and measured along both axes
/// and the diagonals.
pub struct PatternLocator<'a> {
    img: &'a BinaryImage,
    ratio: &'static [usize],
    ratio_sum: usize,
}

impl<'a> PatternLocator<'a> {
    pub fn new(img: &'a BinaryImage, ratio: &'static [usize]) -> Self {
        debug_assert!(ratio.len() % 2 == 1, "ratio must be black-bounded");
        Self { img, ratio, ratio_sum: ratio.iter().sum() }
    }

    /// Sweeps the window `[from, to)` and returns every verified pattern.
    pub fn locate(&self, from: (usize, usize), to: (usize, usize)) -> Vec<LocatedPattern> {
        let n = self.ratio.len();
        let mut patterns: Vec<LocatedPattern> = Vec::new();
        if from.0 >= to.0 || from.1 >= to.1 {
            return patterns;
        }

        for y in (from.1..to.1).step_by(2) {
            let mut window = vec![0usize; n];
            let mut filled = 0usize;
            let mut run_len = 0usize;
            let mut run_color = self.img.is_black(from.0, y);

            // One extra step flushes the final run, so a pattern touching the
            // right edge of the sweep window still completes its window.
            for x in from.0..=to.0 {
                let color = if x < to.0 { self.img.is_black(x, y) } else { !run_color };
                if color == run_color {
                    run_len += 1;
                    continue;
                }

                window.rotate_left(1);
                window[n - 1] = run_len;
                filled += 1;

                if run_color && filled >= n && self.check_ratio_int(&window) {
                    if let Some(pattern) = self.verify(x, y, &window) {
                        patterns.push(pattern);
                    }
                }

                run_color = color;
                run_len = 1;
            }
        }

        patterns
    }

    // Ratio validation on a completed run window.
    fn check_ratio_int(&self, window: &[usize]) -> bool {
        let states: Vec<f64> = window.iter().map(|&w| w as f64).collect();
        self.check_ratio(&states)
    }

    // Every run must sit within half its expected multiple of the unit.
    fn check_ratio(&self, states: &[f64]) -> bool {
        let total: f64 = states.iter().sum();
        if total < self.ratio_sum as f64 {
            return false;
        }
        let unit = total / self.ratio_sum as f64;

        states.iter().zip(self.ratio).all(|(&s, &r)| {
            let expected = r as f64 * unit;
            (s - expected).abs() <= expected / 2.0
        })
    }

    // Cross-validates a horizontal hit along the Y axis, refines the centre,
    // then measures size & error across four directions.
    fn verify(&self, end_x: usize, y: usize, window: &[usize]) -> Option<LocatedPattern> {
        let half = self.ratio.len() / 2;
        let trailing: usize = window[half + 1..].iter().sum();
        let cx = end_x as f64 - trailing as f64 - window[half] as f64 / 2.0;

        let total: usize = window.iter().sum();
        let max_run = 2 * total;

        // Vertical 5-window (or 3-window) through the candidate centre
        let (cxi, cyi) = (cx.round() as isize, y as isize);
        let vertical = self.probe_axis(cxi, cyi, 0, 1, max_run)?;
        if !self.check_ratio(&vertical.states) {
            return None;
        }

        // Centre refinement by half-run sums
        let horizontal = self.probe_axis(cxi, cyi, 1, 0, max_run)?;
        let cx = cx + (horizontal.pos - horizontal.neg) / 2.0;
        let cy = y as f64 + (vertical.pos - vertical.neg) / 2.0;

        // Size & error over horizontal, vertical and the two diagonals
        let (cxi, cyi) = (cx.round() as isize, cy.round() as isize);
        let axes = [(1, 0, 1.0), (0, 1, 1.0), (1, 1, SQRT_2), (1, -1, SQRT_2)];

        let mut measured = Vec::with_capacity(axes.len());
        for (dx, dy, weight) in axes {
            let probe = self.probe_axis(cxi, cyi, dx, dy, max_run)?;
            let states: Vec<f64> = probe.states.iter().map(|s| s * weight).collect();
            measured.push(states);
        }

        let size = measured.iter().map(|s| s.iter().sum::<f64>()).sum::<f64>() / 4.0;
        let unit = size / self.ratio_sum as f64;

        let mut error = 0.0;
        for states in &measured {
            for (&s, &r) in states.iter().zip(self.ratio) {
                let factor = s / unit / r as f64;
                error += (factor - 1.0) * (factor - 1.0);
            }
        }
        let error = error / (4 * self.ratio.len()) as f64;

        Some(LocatedPattern { center: Point::new(cx, cy), size, error })
    }

    // Measures the pattern states along one axis, both ways from the centre.
    fn probe_axis(&self, cx: isize, cy: isize, dx: isize, dy: isize, max_run: usize) -> Option<AxisProbe> {
        let n = self.ratio.len();
        let half = n / 2;

        let neg = self.extent(cx, cy, -dx, -dy, max_run)?;
        let pos = self.extent(cx, cy, dx, dy, max_run)?;

        let mut states = vec![0f64; n];
        for (i, &v) in neg.iter().enumerate() {
            states[half - i] += v as f64;
        }
        for (i, &v) in pos.iter().enumerate() {
            states[half + i] += v as f64;
        }
        // The centre pixel was counted by both walks
        states[half] -= 1.0;

        Some(AxisProbe {
            states,
            neg: neg.iter().sum::<usize>() as f64,
            pos: pos.iter().sum::<usize>() as f64,
        })
    }

    // Walks outwards from the centre, counting half the middle run and each
    // outer state. The middle run is black for 5-ratios, white for 3-ratios.
    fn extent(&self, cx: isize, cy: isize, dx: isize, dy: isize, max_run: usize) -> Option<Vec<usize>> {
        let half = self.ratio.len() / 2;
        let (w, h) = (self.img.width() as isize, self.img.height() as isize);

        let mut runs = vec![0usize; half + 1];
        let mut state = 0usize;
        let mut expect_black = half % 2 == 0;
        let (mut x, mut y) = (cx, cy);

        loop {
            let inside = 0 <= x && x < w && 0 <= y && y < h;
            let matches = inside && self.img.is_black(x as usize, y as usize) == expect_black;

            if matches {
                runs[state] += 1;
                if runs[state] > max_run {
                    return None;
                }
                x += dx;
                y += dy;
            } else {
                if runs[state] == 0 {
                    return None;
                }
                state += 1;
                if state > half {
                    break;
                }
                expect_black = !expect_black;
            }
        }

        Some(runs)
    }
}

struct AxisProbe {
    states: Vec<f64>,
    neg: f64,
    pos: f64,
}

// Patterns location
//------------------------------------------------------------------------------

/// The four located corners plus the measured pattern sizes.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
    pub finder_average_size: f64,
    pub alignment_size: f64,
}

#[cfg(test)]
impl Patterns {
    pub fn highlight(&self, img: &mut image::RgbaImage) {
        self.top_left.highlight(img, image::Rgba([255, 0, 0, 255]));
        self.top_right.highlight(img, image::Rgba([0, 255, 0, 255]));
        self.bottom_left.highlight(img, image::Rgba([0, 0, 255, 255]));
        self.bottom_right.highlight(img, image::Rgba([255, 0, 255, 255]));
    }
}

/// Finds the three finder bullseyes and the alignment ring, assigns them to
/// corners and orients the triangle clockwise.
pub fn locate_patterns(img: &BinaryImage) -> IChingResult<Patterns> {
    let (w, h) = (img.width(), img.height());

    let mut finders = PatternLocator::new(img, &FINDER_RATIO).locate((0, 0), (w, h));
    if finders.len() < 3 {
        return Err(IChingError::FinderNotFound);
    }
    finders.sort_unstable_by(|a, b| a.error.partial_cmp(&b.error).expect("error is finite"));

    // First pass picks by error alone; the estimated size from those winners
    // then filters out absurdly small or large candidates.
    let picked = pick_distinct(&finders, 3).ok_or(IChingError::NoValidFinders)?;
    let estimated = picked.iter().map(|p| p.size).fold(f64::MIN, f64::max);
    let filtered: Vec<LocatedPattern> = finders
        .iter()
        .filter(|p| p.size < 5.0 * estimated && 4.0 * p.size > estimated)
        .cloned()
        .collect();
    let picked = pick_distinct(&filtered, 3).ok_or(IChingError::NoValidFinders)?;

    let (tl, tr, bl) = assign_corners(&picked[0], &picked[1], &picked[2]);
    let finder_average_size = (tl.size + tr.size + bl.size) / 3.0;

    // Alignment ring search around the estimated fourth corner
    let estimated_br = Point::new(
        tr.center.x - tl.center.x + bl.center.x,
        tr.center.y - tl.center.y + bl.center.y,
    );
    let expected_size = finder_average_size * 5.0 / 7.0;
    let radius = (tl.center.dist(&tr.center) + tl.center.dist(&bl.center)) / 4.0;

    let from = (
        (estimated_br.x - radius).max(0.0) as usize,
        (estimated_br.y - radius).max(0.0) as usize,
    );
    let to = (
        ((estimated_br.x + radius) as usize).min(w),
        ((estimated_br.y + radius) as usize).min(h),
    );

    let mut alignments = PatternLocator::new(img, &ALIGNMENT_RATIO).locate(from, to);
    alignments.sort_unstable_by(|a, b| a.error.partial_cmp(&b.error).expect("error is finite"));

    let adopted = alignments
        .iter()
        .find(|p| p.size > expected_size / 4.0 && p.size < 5.0 * expected_size);
    let (bottom_right, alignment_size) = match adopted {
        Some(p) => (p.center, p.size),
        None => (estimated_br, expected_size),
    };

    Ok(Patterns {
        top_left: tl.center,
        top_right: tr.center,
        bottom_left: bl.center,
        bottom_right,
        finder_average_size,
        alignment_size,
    })
}

// Keeps the lowest-error representative of every distinct location.
fn pick_distinct(sorted: &[LocatedPattern], count: usize) -> Option<Vec<LocatedPattern>> {
    let mut picked: Vec<LocatedPattern> = Vec::with_capacity(count);
    for candidate in sorted {
        if picked.iter().all(|p| p.center.dist(&candidate.center) >= MIN_PATTERN_DIST) {
            picked.push(candidate.clone());
            if picked.len() == count {
                return Some(picked);
            }
        }
    }
    None
}

// The farthest pair spans the diagonal (top-right & bottom-left); the
// leftover point is top-left. The triangle TL→TR→BL must wind clockwise.
fn assign_corners<'p>(
    a: &'p LocatedPattern,
    b: &'p LocatedPattern,
    c: &'p LocatedPattern,
) -> (&'p LocatedPattern, &'p LocatedPattern, &'p LocatedPattern) {
    let d_ab = a.center.dist_sq(&b.center);
    let d_ac = a.center.dist_sq(&c.center);
    let d_bc = b.center.dist_sq(&c.center);

    let (tl, mut tr, mut bl) = if d_ab >= d_ac && d_ab >= d_bc {
        (c, a, b)
    } else if d_ac >= d_ab && d_ac >= d_bc {
        (b, a, c)
    } else {
        (a, b, c)
    };

    // cross of (TR - BL) and (TL - BL) must be non-positive
    if cross(&bl.center, &tr.center, &tl.center) > 0.0 {
        std::mem::swap(&mut tr, &mut bl);
    }

    (tl, tr, bl)
}
