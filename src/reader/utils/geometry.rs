// Point
//------------------------------------------------------------------------------

#[cfg(test)]
use image::{Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[cfg(test)]
    pub fn highlight(&self, img: &mut RgbaImage, color: Rgba<u8>) {
        let (w, h) = img.dimensions();
        for dy in [-1i64, 0, 1] {
            for dx in [-1i64, 0, 1] {
                let nx = (self.x.round() as i64 + dx).clamp(0, w as i64 - 1);
                let ny = (self.y.round() as i64 + dy).clamp(0, h as i64 - 1);
                img.put_pixel(nx as u32, ny as u32, color);
            }
        }
    }

    pub fn dist(&self, other: &Point) -> f64 {
        self.dist_sq(other).sqrt()
    }

    pub fn dist_sq(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// 2D cross product of (b - a) and (c - a). Negative when a→b→c turns
/// clockwise in image coordinates (y grows downwards).
pub fn cross(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
