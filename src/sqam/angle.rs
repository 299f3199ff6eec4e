//! Motion angle of a completed sequence.
//!
//! The angle is measured between the ray "camera -> middle of the trajectory" and the direction
//! the entity actually travelled along its trendline. The camera is assumed to stand below the
//! bottom edge of the image, horizontally centered, `camera_dist` pixels away from the tracking
//! plane. Result is integer degrees in [0, 360).

use crate::sqam::tracked_entity::Trendline;
use crate::utils::{vector_norm, Point, TrackBox};

/// Point the rays are cast from: (width / 2, height + camera_dist).
/// None if it does not fit into pixel coordinates.
pub fn camera_reference(height: i32, width: i32, camera_dist: i32) -> Option<Point> {
    let y = height.checked_add(camera_dist)?;
    Some(Point::new(width / 2, y))
}

/// Direction vector (x, y) of unit length on X axis (or its mirrored version)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Director {
    x: f64,
    y: f64,
}

impl Director {
    fn dot(&self, other: &Director) -> f64 {
        self.x * other.x + self.y * other.y
    }
    fn norm(&self) -> f64 {
        vector_norm(self.x, self.y)
    }
}

/// Derives motion angle for the given box history and its trendline.
///
/// `box_history` must not be empty.
pub fn derive_angle(reference: Point, box_history: &[TrackBox], trendline: Trendline) -> i32 {
    let first = box_history[0];
    let last = box_history[box_history.len() - 1];
    let middle = box_history[box_history.len() / 2];
    let moved_down = first.y < last.y;

    // Ray is vertical: there is nothing to correct
    if reference.x == middle.x {
        return if moved_down { 0 } else { 180 };
    }

    let ray_slope = (reference.y as f64 - middle.y as f64) / (reference.x as f64 - middle.x as f64);
    let v1 = if ray_slope > 0.0 {
        Director { x: 1.0, y: ray_slope }
    } else {
        Director { x: -1.0, y: -ray_slope }
    };

    let m = trendline.slope;
    let forward = Director { x: 1.0, y: m };
    let backward = Director { x: -1.0, y: -m };
    // Orient the trendline along the actual travel direction
    let v2 = match (m > 0.0, moved_down) {
        (true, true) => forward,
        (true, false) => backward,
        (false, true) => backward,
        (false, false) => forward,
    };

    let cos_angle = (v1.dot(&v2) / (v1.norm() * v2.norm())).clamp(-1.0, 1.0);
    let mut angle_degrees = cos_angle.acos().to_degrees();

    let flip = if v1.x == 1.0 {
        (m < 0.0 && v2.x == 1.0)
            || (m > 0.0
                && ((v2.x == -1.0 && v1.y < v2.y.abs()) || (v2.x == 1.0 && v1.y > v2.y)))
    } else {
        (m > 0.0 && v2.x == 1.0)
            || (m < 0.0
                && ((v2.x == 1.0 && v1.y > v2.y) || (v2.x == -1.0 && v1.y < v2.y.abs())))
    };
    if flip {
        angle_degrees = 360.0 - angle_degrees;
    }
    (angle_degrees as i32).rem_euclid(360)
}
