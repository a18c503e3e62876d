use super::matrix::{Matrix, Point};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, shaped like a `DOMRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_points(min: Point, max: Point) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new((self.left() + self.right()) / 2.0, (self.top() + self.bottom()) / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let min = Point::new(self.left().min(other.left()), self.top().min(other.top()));
        let max = Point::new(
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        );
        Rect::from_points(min, max)
    }

    /// Bounding box of this rectangle's four corners after `matrix`.
    pub fn transformed(&self, matrix: &Matrix) -> Rect {
        let corners = [
            matrix.apply(Point::new(self.left(), self.top())),
            matrix.apply(Point::new(self.right(), self.top())),
            matrix.apply(Point::new(self.left(), self.bottom())),
            matrix.apply(Point::new(self.right(), self.bottom())),
        ];
        bounding_box(corners.iter().copied()).unwrap_or_default()
    }
}

/// Smallest rectangle enclosing every point, `None` for an empty iterator.
pub fn bounding_box(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let (min, max) = iter.fold((first, first), |(min, max), p| {
        (
            Point::new(min.x.min(p.x), min.y.min(p.y)),
            Point::new(max.x.max(p.x), max.y.max(p.y)),
        )
    });
    Some(Rect::from_points(min, max))
}
