use super::geometry::Point;

// Perspective transform
//------------------------------------------------------------------------------

/// Projective 3x3 map between planar quadrilaterals, built from the
/// closed-form square-to-quadrilateral solution (Digital Image Warping,
/// §3.4.2). Coefficient `a(r)(c)` multiplies component `r` of the input in
/// output component `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveTransform {
    a11: f64,
    a21: f64,
    a31: f64,
    a12: f64,
    a22: f64,
    a32: f64,
    a13: f64,
    a23: f64,
    a33: f64,
}

impl PerspectiveTransform {
    /// Maps points given in `from`-quad coordinates into `to`-quad
    /// coordinates. Both corner arrays must list the same cyclic order.
    pub fn quad_to_quad(from: [Point; 4], to: [Point; 4]) -> Self {
        Self::square_to_quad(to).times(&Self::square_to_quad(from).adjugate())
    }

    fn square_to_quad(q: [Point; 4]) -> Self {
        let [p0, p1, p2, p3] = q;
        let dx3 = p0.x - p1.x + p2.x - p3.x;
        let dy3 = p0.y - p1.y + p2.y - p3.y;

        if dx3 == 0.0 && dy3 == 0.0 {
            // Affine
            return Self {
                a11: p1.x - p0.x,
                a21: p2.x - p1.x,
                a31: p0.x,
                a12: p1.y - p0.y,
                a22: p2.y - p1.y,
                a32: p0.y,
                a13: 0.0,
                a23: 0.0,
                a33: 1.0,
            };
        }

        let dx1 = p1.x - p2.x;
        let dx2 = p3.x - p2.x;
        let dy1 = p1.y - p2.y;
        let dy2 = p3.y - p2.y;
        let denom = dx1 * dy2 - dx2 * dy1;
        let a13 = (dx3 * dy2 - dx2 * dy3) / denom;
        let a23 = (dx1 * dy3 - dx3 * dy1) / denom;

        Self {
            a11: p1.x - p0.x + a13 * p1.x,
            a21: p3.x - p0.x + a23 * p3.x,
            a31: p0.x,
            a12: p1.y - p0.y + a13 * p1.y,
            a22: p3.y - p0.y + a23 * p3.y,
            a32: p0.y,
            a13,
            a23,
            a33: 1.0,
        }
    }

    // Adjugate is the inverse up to scale, which a projective map ignores.
    fn adjugate(&self) -> Self {
        Self {
            a11: self.a22 * self.a33 - self.a23 * self.a32,
            a21: self.a23 * self.a31 - self.a21 * self.a33,
            a31: self.a21 * self.a32 - self.a22 * self.a31,
            a12: self.a13 * self.a32 - self.a12 * self.a33,
            a22: self.a11 * self.a33 - self.a13 * self.a31,
            a32: self.a12 * self.a31 - self.a11 * self.a32,
            a13: self.a12 * self.a23 - self.a13 * self.a22,
            a23: self.a13 * self.a21 - self.a11 * self.a23,
            a33: self.a11 * self.a22 - self.a12 * self.a21,
        }
    }

    fn times(&self, other: &Self) -> Self {
        Self {
            a11: self.a11 * other.a11 + self.a21 * other.a12 + self.a31 * other.a13,
            a21: self.a11 * other.a21 + self.a21 * other.a22 + self.a31 * other.a23,
            a31: self.a11 * other.a31 + self.a21 * other.a32 + self.a31 * other.a33,
            a12: self.a12 * other.a11 + self.a22 * other.a12 + self.a32 * other.a13,
            a22: self.a12 * other.a21 + self.a22 * other.a22 + self.a32 * other.a23,
            a32: self.a12 * other.a31 + self.a22 * other.a32 + self.a32 * other.a33,
            a13: self.a13 * other.a11 + self.a23 * other.a12 + self.a33 * other.a13,
            a23: self.a13 * other.a21 + self.a23 * other.a22 + self.a33 * other.a23,
            a33: self.a13 * other.a31 + self.a23 * other.a32 + self.a33 * other.a33,
        }
    }

    /// Forward-applies the map. Division by a vanishing denominator yields
    /// non-finite coordinates, which samplers treat as out of image.
    pub fn map(&self, x: f64, y: f64) -> Point {
        let denom = self.a13 * x + self.a23 * y + self.a33;
        Point::new(
            (self.a11 * x + self.a21 * y + self.a31) / denom,
            (self.a12 * x + self.a22 * y + self.a32) / denom,
        )
    }
}
