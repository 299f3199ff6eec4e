use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{distance_point_to_line, mean, variance, vector_norm, Point, TrackBox};

/// Identifier assigned by the external tracker
pub type TrackId = u64;

/// Slope used instead of infinity when the dominant direction is vertical
pub const VERTICAL_SLOPE: f64 = 999999.0;

/// Line y = slope * x + intercept in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
}

/// Relative speed: displacement over the sampling span divided by the average box height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub dx: f64,
    pub dy: f64,
}

impl SpeedSample {
    pub fn new(dx: f64, dy: f64) -> Self {
        SpeedSample { dx, dy }
    }
    pub fn magnitude(&self) -> f64 {
        vector_norm(self.dx, self.dy)
    }
}

/// State of a single track while it is being validated.
///
/// The external `track_id` may come back later after the entity is destroyed; in that case a
/// brand new entity (with a new `id`) starts from scratch.
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    id: Uuid,
    track_id: TrackId,
    box_history: Vec<TrackBox>,
    speed_history: Vec<SpeedSample>,
    trendline: Option<Trendline>,
}

impl TrackedEntity {
    pub fn new(track_id: TrackId, first_box: TrackBox) -> Self {
        let mut newe = TrackedEntity {
            id: Uuid::new_v4(),
            track_id,
            box_history: Vec::new(),
            speed_history: Vec::new(),
            trendline: None,
        };
        newe.box_history.push(first_box);
        newe
    }
    pub fn get_id(&self) -> Uuid {
        self.id
    }
    pub fn get_track_id(&self) -> TrackId {
        self.track_id
    }
    pub fn get_box_history(&self) -> &[TrackBox] {
        &self.box_history
    }
    pub fn get_speed_history(&self) -> &[SpeedSample] {
        &self.speed_history
    }
    pub fn get_trendline(&self) -> Option<Trendline> {
        self.trendline
    }
    pub fn track_len(&self) -> usize {
        self.box_history.len()
    }
    pub fn first_position(&self) -> Point {
        self.box_history[0].get_center()
    }
    pub fn last_position(&self) -> Point {
        self.box_history[self.box_history.len() - 1].get_center()
    }
    pub fn add_position(&mut self, newbox: TrackBox) {
        self.box_history.push(newbox);
    }
    /// True if either x or y of box centers varies over the whole history
    pub fn has_variance(&self) -> bool {
        let (xs, ys) = self.centers();
        variance(&xs) != 0.0 || variance(&ys) != 0.0
    }
    /// Fits trendline through box centers along the principal component of their spread
    pub fn calculate_trendline_coefficients(&mut self) -> Trendline {
        let (xs, ys) = self.centers();
        let mean_x = mean(&xs);
        let mean_y = mean(&ys);
        let count = xs.len() as f64;
        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (x, y) in xs.iter().zip(ys.iter()) {
            let cx = x - mean_x;
            let cy = y - mean_y;
            sxx += cx * cx;
            sxy += cx * cy;
            syy += cy * cy;
        }
        let covariance = Matrix2::new(sxx, sxy, sxy, syy) / count;
        let eigen = covariance.symmetric_eigen();
        let main = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] { 0 } else { 1 };
        let direction = eigen.eigenvectors.column(main);
        let slope = if direction[0].abs() <= f64::EPSILON {
            VERTICAL_SLOPE
        } else {
            direction[1] / direction[0]
        };
        let line = Trendline {
            slope,
            intercept: mean_y - slope * mean_x,
        };
        self.trendline = Some(line);
        line
    }
    /// Distance from the latest position to the current trendline. None if no line was fitted yet
    pub fn distance_point_to_trendline(&self) -> Option<f64> {
        let line = self.trendline?;
        let last = self.last_position();
        Some(distance_point_to_line(
            line.slope,
            line.intercept,
            last.x as f64,
            last.y as f64,
        ))
    }
    /// Appends relative speed measured over the last `x` boxes.
    /// The span is `x` samples, i.e. `x - 1` steps between the first and the last box.
    pub fn calculate_speed(&mut self, x: usize) {
        let span = usize::min(x, self.box_history.len());
        let window = &self.box_history[self.box_history.len() - span..];
        let heights: Vec<f64> = window.iter().map(|b| b.height as f64).collect();
        let average_box_height = mean(&heights);
        // Degenerate boxes carry no scale, count them as standing still
        if average_box_height <= 0.0 {
            self.speed_history.push(SpeedSample::new(0.0, 0.0));
            return;
        }
        let first = window[0];
        let last = window[window.len() - 1];
        self.speed_history.push(SpeedSample::new(
            (last.x as f64 - first.x as f64) / average_box_height,
            (last.y as f64 - first.y as f64) / average_box_height,
        ));
    }
    /// Mean magnitude of the last `t` speed samples
    pub fn calculate_average_speed(&self, t: usize) -> f64 {
        let span = usize::min(t, self.speed_history.len());
        let magnitudes: Vec<f64> = self.speed_history[self.speed_history.len() - span..]
            .iter()
            .map(SpeedSample::magnitude)
            .collect();
        mean(&magnitudes)
    }
    /// Both speed components flipped sign between the two most recent samples
    pub fn is_reversed(&self) -> bool {
        let len = self.speed_history.len();
        if len < 2 {
            return false;
        }
        let prev = self.speed_history[len - 2];
        let last = self.speed_history[len - 1];
        last.dx * prev.dx < 0.0 && last.dy * prev.dy < 0.0
    }
    fn centers(&self) -> (Vec<f64>, Vec<f64>) {
        self.box_history
            .iter()
            .map(|b| (b.x as f64, b.y as f64))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_from(points: &[(i32, i32)]) -> TrackedEntity {
        let mut e = TrackedEntity::new(7, TrackBox::new(points[0].0, points[0].1, 20, 50));
        for &(x, y) in &points[1..] {
            e.add_position(TrackBox::new(x, y, 20, 50));
        }
        e
    }

    #[test]
    fn test_new_entity() {
        let e = TrackedEntity::new(3, TrackBox::new(10, 20, 30, 40));
        assert_eq!(e.get_track_id(), 3);
        assert_eq!(e.track_len(), 1);
        assert!(e.get_trendline().is_none());
        assert!(e.distance_point_to_trendline().is_none());
        assert_eq!(e.first_position(), Point::new(10, 20));
        assert_eq!(e.last_position(), Point::new(10, 20));
        let other = TrackedEntity::new(3, TrackBox::new(10, 20, 30, 40));
        assert_ne!(e.get_id(), other.get_id());
    }

    #[test]
    fn test_variance() {
        assert!(!entity_from(&[(5, 5), (5, 5), (5, 5)]).has_variance());
        assert!(entity_from(&[(5, 5), (5, 6), (5, 5)]).has_variance());
        assert!(entity_from(&[(5, 5), (6, 5)]).has_variance());
    }

    #[test]
    fn test_trendline_diagonal() {
        let mut e = entity_from(&[(0, 10), (10, 30), (20, 50), (30, 70)]);
        e.calculate_trendline_coefficients();
        let line = e.get_trendline().unwrap();
        assert!((line.slope - 2.0).abs() < 1e-9);
        assert!((line.intercept - 10.0).abs() < 1e-9);
        assert!(e.distance_point_to_trendline().unwrap() < 1e-9);
    }

    #[test]
    fn test_trendline_horizontal_and_vertical() {
        let mut horizontal = entity_from(&[(0, 40), (5, 40), (10, 40)]);
        horizontal.calculate_trendline_coefficients();
        let line = horizontal.get_trendline().unwrap();
        assert!(line.slope.abs() < 1e-9);
        assert!((line.intercept - 40.0).abs() < 1e-9);

        let mut vertical = entity_from(&[(100, 0), (100, 5), (100, 10)]);
        vertical.calculate_trendline_coefficients();
        assert_eq!(vertical.get_trendline().unwrap().slope, VERTICAL_SLOPE);
    }

    #[test]
    fn test_distance_uses_latest_point() {
        let mut e = entity_from(&[(0, 0), (10, 0), (20, 0)]);
        e.calculate_trendline_coefficients();
        e.add_position(TrackBox::new(30, 12, 20, 50));
        assert!((e.distance_point_to_trendline().unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed() {
        // boxes of height 50, moving 10px per frame on x; 5 boxes span 4 steps
        let mut e = entity_from(&[(0, 0), (10, 0), (20, 0), (30, 0), (40, 0)]);
        e.calculate_speed(5);
        let s = e.get_speed_history()[0];
        assert!((s.dx - 40.0 / 50.0).abs() < 1e-12);
        assert_eq!(s.dy, 0.0);
        e.calculate_speed(2);
        assert!((e.get_speed_history()[1].dx - 10.0 / 50.0).abs() < 1e-12);
        assert!((e.calculate_average_speed(2) - 0.5).abs() < 1e-12);
        assert!((e.calculate_average_speed(1) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_long_history() {
        let mut e = TrackedEntity::new(3, TrackBox::new(0, 0, 20, 50));
        for k in 1..200 {
            e.add_position(TrackBox::new(k, 0, 20, 50));
        }
        assert_eq!(e.track_len(), 200);
        assert_eq!(e.get_box_history()[199], TrackBox::new(199, 0, 20, 50));
        e.calculate_speed(100);
        assert!((e.get_speed_history()[0].dx - 99.0 / 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_speed_zero_height() {
        let mut e = TrackedEntity::new(1, TrackBox::new(0, 0, 0, 0));
        e.add_position(TrackBox::new(50, 50, 0, 0));
        e.calculate_speed(2);
        assert_eq!(e.get_speed_history()[0], SpeedSample::new(0.0, 0.0));
    }

    #[test]
    fn test_reversal() {
        let mut e = entity_from(&[(0, 0)]);
        e.speed_history = vec![SpeedSample::new(1.0, 1.0)];
        assert!(!e.is_reversed());
        e.speed_history.push(SpeedSample::new(-1.0, -1.0));
        assert!(e.is_reversed());
        e.speed_history = vec![SpeedSample::new(1.0, 1.0), SpeedSample::new(1.0, -1.0)];
        assert!(!e.is_reversed());
        e.speed_history = vec![SpeedSample::new(1.0, 0.0), SpeedSample::new(-1.0, 0.0)];
        assert!(!e.is_reversed());
    }
}
