use super::element::{Element, ElementId};
use super::tree::Scene;
use crate::geometry::{Matrix, Point, Rect, bounding_box};

/// Rough glyph metrics used to size `text` elements; there is no font engine here.
const TEXT_CHAR_WIDTH: f64 = 7.0;
const TEXT_LINE_HEIGHT: f64 = 14.0;

impl Scene {
    /// The element's own transform, identity when it has none.
    pub fn local_transform(&self, id: ElementId) -> Matrix {
        self.transform(id).unwrap_or_default()
    }

    /// Transform from `id`'s user space into `ancestor`'s user space.
    ///
    /// Includes `id`'s own transform but not `ancestor`'s. Returns `None` when
    /// `ancestor` is not actually an ancestor of `id`.
    pub fn local_to_ancestor(&self, id: ElementId, ancestor: ElementId) -> Option<Matrix> {
        if id == ancestor {
            return Some(Matrix::IDENTITY);
        }
        let mut matrix = self.local_transform(id);
        for current in self.ancestors(id) {
            if current == ancestor {
                return Some(matrix);
            }
            matrix = self.local_transform(current).multiply(&matrix);
        }
        None
    }

    /// Current transformation matrix from `id`'s user space to screen space.
    ///
    /// Only meaningful for attached elements; detached ones resolve against their own root.
    pub fn screen_ctm(&self, id: ElementId) -> Matrix {
        let mut matrix = self.local_transform(id);
        for current in self.ancestors(id) {
            matrix = self.local_transform(current).multiply(&matrix);
        }
        Matrix::translation(self.viewport().x, self.viewport().y).multiply(&matrix)
    }

    /// Screen space bounding box of `id` and everything it draws, like `getBoundingClientRect`.
    ///
    /// Returns an empty rectangle at the element's origin when nothing inside it has geometry.
    pub fn screen_bounds(&self, id: ElementId) -> Rect {
        let mut stack = vec![id];
        let mut result: Option<Rect> = None;

        while let Some(current) = stack.pop() {
            let Some(el) = self.get(current) else {
                continue;
            };
            if let Some(shape) = self.shape_bounds(el) {
                let rect = shape.transformed(&self.screen_ctm(current));
                result = Some(match result {
                    Some(acc) => acc.union(&rect),
                    None => rect,
                });
            }
            // Nested <svg> boxes are measured by their viewport, not their content.
            if el.tag() == "svg" && current != self.root() {
                continue;
            }
            stack.extend(el.children().iter().copied());
        }

        result.unwrap_or_else(|| {
            let origin = self.screen_ctm(id).origin();
            Rect::new(origin.x, origin.y, 0.0, 0.0)
        })
    }

    /// Geometry of a single element in its own user space, ignoring children.
    fn shape_bounds(&self, el: &Element) -> Option<Rect> {
        let num = |name: &str| el.number_attribute(name).unwrap_or(0.0);
        match el.tag() {
            "circle" => {
                let r = num("r");
                Some(Rect::new(num("cx") - r, num("cy") - r, r * 2.0, r * 2.0))
            }
            "ellipse" => {
                let (rx, ry) = (num("rx"), num("ry"));
                Some(Rect::new(num("cx") - rx, num("cy") - ry, rx * 2.0, ry * 2.0))
            }
            "rect" => {
                let viewport = self.viewport();
                let x = self.length(el, "x", viewport.width);
                let y = self.length(el, "y", viewport.height);
                let width = self.length(el, "width", viewport.width);
                let height = self.length(el, "height", viewport.height);
                Some(Rect::new(x, y, width, height))
            }
            "svg" if el.parent().is_some() => Some(Rect::new(
                num("x"),
                num("y"),
                num("width"),
                num("height"),
            )),
            "line" => bounding_box([
                Point::new(num("x1"), num("y1")),
                Point::new(num("x2"), num("y2")),
            ]),
            "path" => el.attribute("d").and_then(|d| bounding_box(path_points(d))),
            "polygon" | "polyline" => el
                .attribute("points")
                .and_then(|p| bounding_box(number_pairs(p))),
            "text" => {
                let len = el.text().map(|t| t.chars().count()).unwrap_or(0);
                if len == 0 {
                    return None;
                }
                let width = len as f64 * TEXT_CHAR_WIDTH;
                // Labels are centred on their anchor point.
                Some(Rect::new(
                    num("x") - width / 2.0,
                    num("y") - TEXT_LINE_HEIGHT,
                    width,
                    TEXT_LINE_HEIGHT,
                ))
            }
            _ => None,
        }
    }

    /// Resolves a length attribute, treating `%` relative to `reference`.
    fn length(&self, el: &Element, name: &str, reference: f64) -> f64 {
        match el.attribute(name).map(str::trim) {
            Some(v) if v.ends_with('%') => v
                .trim_end_matches('%')
                .parse::<f64>()
                .map(|p| p / 100.0 * reference)
                .unwrap_or(0.0),
            Some(v) => v.parse().unwrap_or(0.0),
            None => 0.0,
        }
    }
}

/// Control and end points of a path with absolute commands.
///
/// The hull of the control points contains the curve, which is all bounding boxes need.
fn path_points(d: &str) -> Vec<Point> {
    number_pairs(d)
}

fn number_pairs(input: &str) -> Vec<Point> {
    let numbers = input
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == 'e'))
        .filter(|s| !s.is_empty() && *s != "-" && *s != "e")
        .filter_map(|s| s.parse::<f64>().ok())
        .collect::<Vec<_>>();
    numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}
