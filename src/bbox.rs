//! Axis-aligned bounding boxes in document units.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from its extents, returning `None` unless it has positive area.
    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<Self> {
        let bbox = Self::new(min_x, min_y, max_x - min_x, max_y - min_y);
        bbox.is_valid().then_some(bbox)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Finite and with positive width and height.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn union(&self, other: &BBox) -> BBox {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        BBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Grows the box by `padding` on every side.
    pub fn padded(&self, padding: f64) -> BBox {
        BBox::new(
            self.x - padding,
            self.y - padding,
            self.width + 2.0 * padding,
            self.height + 2.0 * padding,
        )
    }

    /// The `viewBox` attribute value for this box.
    pub fn to_viewbox(&self) -> String {
        format!(
            "{} {} {} {}",
            format_number(self.x),
            format_number(self.y),
            format_number(self.width),
            format_number(self.height)
        )
    }
}

impl From<usvg::Rect> for BBox {
    fn from(rect: usvg::Rect) -> Self {
        BBox::new(
            snap_f32(rect.x()),
            snap_f32(rect.y()),
            snap_f32(rect.width()),
            snap_f32(rect.height()),
        )
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_viewbox())
    }
}

/// Accumulates the union of boxes; `None` until the first box arrives.
pub fn merge(acc: Option<BBox>, next: BBox) -> Option<BBox> {
    match acc {
        Some(existing) => Some(existing.union(&next)),
        None => Some(next),
    }
}

/// Widens an `f32` to the `f64` closest to its shortest decimal form, so
/// `0.1f32` becomes `0.1` rather than `0.10000000149011612`.
fn snap_f32(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(value as f64)
}

/// Formats a coordinate in its shortest round-trip form (`10`, not `10.0`).
pub fn format_number(value: f64) -> String {
    // avoid "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}
