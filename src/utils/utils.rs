use serde::{Deserialize, Serialize};

/// Detection box as it comes out of a detector / tracker: x and y are the CENTER of the box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(_x: f32, _y: f32, _width: f32, _height: f32) -> Self {
        Rect {
            x: _x,
            y: _y,
            width: _width,
            height: _height,
        }
    }
}

/// Integer box stored in entity history: [center_x, center_y, width, height]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TrackBox {
    pub fn new(_x: i32, _y: i32, _width: i32, _height: i32) -> Self {
        TrackBox {
            x: _x,
            y: _y,
            width: _width,
            height: _height,
        }
    }
    pub fn get_center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

// Truncates towards zero like an integer cast of detector output does
impl From<&Rect> for TrackBox {
    fn from(r: &Rect) -> Self {
        TrackBox::new(r.x as i32, r.y as i32, r.width as i32, r.height as i32)
    }
}

impl From<Rect> for TrackBox {
    fn from(r: Rect) -> Self {
        TrackBox::from(&r)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(_x: i32, _y: i32) -> Self {
        Point { x: _x, y: _y }
    }
}

/// Magnitude of a (dx, dy) vector
pub fn vector_norm(dx: f64, dy: f64) -> f64 {
    f64::sqrt(dx * dx + dy * dy)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by N, not N-1)
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Perpendicular distance from point (x, y) to line y = slope * x + intercept
pub fn distance_point_to_line(slope: f64, intercept: f64, x: f64, y: f64) -> f64 {
    f64::abs(slope * x - y + intercept) / f64::sqrt(slope * slope + 1.0)
}
