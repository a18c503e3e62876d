use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2-D point in whatever coordinate space the caller is working in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An affine transform using SVG conventions:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// All the builder-style methods (`translate`, `scale`, `rotate`) post-multiply,
/// the same way `SVGMatrix` does, so `m.translate(..)` applies the translation in
/// the local space of `m`. The type is `Copy`; every operation returns a new value
/// and the caller decides when to commit it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

const SINGULAR_EPSILON: f64 = 1e-12;

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `degrees`, clockwise in screen space (y grows downwards).
    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Returns `self * other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translate(&self, tx: f64, ty: f64) -> Matrix {
        self.multiply(&Matrix::translation(tx, ty))
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.multiply(&Matrix::scaling(factor, factor))
    }

    pub fn rotate(&self, degrees: f64) -> Matrix {
        self.multiply(&Matrix::rotation(degrees))
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the matrix collapses the plane.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        Some(Matrix {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }

    /// Where the local origin lands after this transform.
    pub fn origin(&self) -> Point {
        Point::new(self.e, self.f)
    }

    /// Uniform scale with no skew or rotation, the only shape the workflow group may take.
    pub fn is_uniform_scale(&self) -> bool {
        self.a == self.d && self.b == 0.0 && self.c == 0.0
    }

    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        [
            (self.a, other.a),
            (self.b, other.b),
            (self.c, other.c),
            (self.d, other.d),
            (self.e, other.e),
            (self.f, other.f),
        ]
        .iter()
        .all(|(l, r)| (l - r).abs() <= epsilon)
    }

    /// Serializes to the `matrix(a,b,c,d,e,f)` form used in `transform` attributes.
    pub fn to_transform_attr(&self) -> String {
        self.to_string()
    }

    /// Parses a `transform` attribute value.
    ///
    /// Accepts a whitespace separated list of `matrix`, `translate`, `scale` and
    /// `rotate` functions, composed left to right. Returns `None` on anything else.
    pub fn parse_transform_attr(input: &str) -> Option<Matrix> {
        let mut result = Matrix::IDENTITY;
        let mut rest = input.trim();
        if rest.is_empty() {
            return None;
        }

        while !rest.is_empty() {
            let open = rest.find('(')?;
            let close = rest.find(')')?;
            if close < open {
                return None;
            }
            let name = rest[..open].trim();
            let args = rest[open + 1..close]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<f64>().ok())
                .collect::<Option<Vec<f64>>>()?;

            let step = match (name, args.as_slice()) {
                ("matrix", [a, b, c, d, e, f]) => Matrix::new(*a, *b, *c, *d, *e, *f),
                ("translate", [tx]) => Matrix::translation(*tx, 0.0),
                ("translate", [tx, ty]) => Matrix::translation(*tx, *ty),
                ("scale", [s]) => Matrix::scaling(*s, *s),
                ("scale", [sx, sy]) => Matrix::scaling(*sx, *sy),
                ("rotate", [deg]) => Matrix::rotation(*deg),
                _ => return None,
            };
            result = result.multiply(&step);
            rest = rest[close + 1..].trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        }

        Some(result)
    }
}

/// Formats a coordinate without a trailing `.0` and without negative zero.
pub(crate) fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix({},{},{},{},{},{})",
            format_number(self.a),
            format_number(self.b),
            format_number(self.c),
            format_number(self.d),
            format_number(self.e),
            format_number(self.f)
        )
    }
}
