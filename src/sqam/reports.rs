use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::sqam::frame_window::FrameWindow;
use crate::sqam::tracked_entity::{TrackId, TrackedEntity};
use crate::utils::Point;

/// Why an entity was dropped before completing its sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    ZeroVariance,
    DirectionChange { distance: f64, max_distance: f64 },
    BelowMinimumSpeed { speed: f64, min_speed: f64 },
    ReversedDirection,
    TrackingDiscontinuity,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExclusionReason::ZeroVariance => write!(f, "Zero Variance"),
            ExclusionReason::DirectionChange {
                distance,
                max_distance,
            } => write!(f, "Direction Change ({:.2}>{})", distance, max_distance),
            ExclusionReason::BelowMinimumSpeed { speed, min_speed } => {
                write!(f, "Below Minimum Speed ({:.4}<{})", speed, min_speed)
            }
            ExclusionReason::ReversedDirection => write!(f, "Reversed Direction"),
            ExclusionReason::TrackingDiscontinuity => write!(f, "Tracking Discontinuity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FrameSummary {
    pub detections_num: usize,
    pub new_entries: usize,
    pub exclusions_num: usize,
    pub valid_sequence_num: usize,
    pub num_max_frames: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusionRecord {
    pub person_id: TrackId,
    pub reason: ExclusionReason,
    pub frames_tracked: usize,
    pub first_position: Point,
    pub last_position: Point,
}

impl ExclusionRecord {
    /// Captures everything needed from the entity right before it is destroyed
    pub fn capture(entity: &TrackedEntity, reason: ExclusionReason) -> Self {
        ExclusionRecord {
            person_id: entity.get_track_id(),
            reason,
            frames_tracked: entity.track_len(),
            first_position: entity.first_position(),
            last_position: entity.last_position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub person_id: TrackId,
    pub angle: i32,
    pub frames_tracked: usize,
    pub first_position: Point,
    pub last_position: Point,
}

impl CompletionRecord {
    pub fn capture(entity: &TrackedEntity, angle: i32) -> Self {
        CompletionRecord {
            person_id: entity.get_track_id(),
            angle,
            frames_tracked: entity.track_len(),
            first_position: entity.first_position(),
            last_position: entity.last_position(),
        }
    }
}

/// Everything a single call of `process_new_frame` produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub summary: FrameSummary,
    pub exclusions: Vec<ExclusionRecord>,
    pub completions: Vec<CompletionRecord>,
}

/// Receiver of per-frame reports (logging, metrics, storage...)
pub trait ReportSink {
    fn report(
        &mut self,
        summary: &FrameSummary,
        exclusions: &[ExclusionRecord],
        completions: &[CompletionRecord],
    );
}

/// Consumer of completed sequences. Gets the frames window too, so it could
/// store the pictures matching the sequence boxes.
pub trait SequenceHandler<F> {
    fn handle_sequence(&mut self, entity: &TrackedEntity, angle: i32, frames: &FrameWindow<F>);
}

/// Logs each frame report via `tracing` together with the time elapsed since the previous one
pub struct TracingSink {
    iteration: usize,
    last_report: DateTime<Utc>,
}

impl TracingSink {
    pub fn new() -> Self {
        TracingSink {
            iteration: 0,
            last_report: Utc::now(),
        }
    }
    /// Restarts the cost timer, e.g. right before the first frame arrives
    pub fn reset_time(&mut self) {
        self.last_report = Utc::now();
    }
    pub fn iterations(&self) -> usize {
        self.iteration
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for TracingSink {
    fn report(
        &mut self,
        summary: &FrameSummary,
        exclusions: &[ExclusionRecord],
        completions: &[CompletionRecord],
    ) {
        let now = Utc::now();
        self.iteration += 1;
        let cost_ms = (now - self.last_report).num_microseconds().unwrap_or(0) as f64 / 1000.0;
        let cost = format!("{:.2}", cost_ms);
        info!(
            frame = self.iteration,
            cost_ms = %cost,
            detections_num = summary.detections_num,
            new_entries = summary.new_entries,
            exclusions_num = summary.exclusions_num,
            valid_sequence_num = summary.valid_sequence_num,
            num_max_frames = summary.num_max_frames,
            "Frame {:05}",
            self.iteration
        );
        for exclusion in exclusions {
            info!(
                person_id = exclusion.person_id,
                reason = %exclusion.reason,
                frames_tracked = exclusion.frames_tracked,
                first_position = ?(exclusion.first_position.x, exclusion.first_position.y),
                last_position = ?(exclusion.last_position.x, exclusion.last_position.y),
                "Excluded sequence"
            );
        }
        for completion in completions {
            info!(
                person_id = completion.person_id,
                angle = completion.angle,
                frames_tracked = completion.frames_tracked,
                first_position = ?(completion.first_position.x, completion.first_position.y),
                last_position = ?(completion.last_position.x, completion.last_position.y),
                "Completed sequence"
            );
        }
        self.last_report = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TrackBox;

    #[test]
    fn test_reason_display() {
        assert_eq!(ExclusionReason::ZeroVariance.to_string(), "Zero Variance");
        let r = ExclusionReason::DirectionChange {
            distance: 17.3071,
            max_distance: 15.0,
        };
        assert_eq!(r.to_string(), "Direction Change (17.31>15)");
        let r = ExclusionReason::BelowMinimumSpeed {
            speed: 0.01,
            min_speed: 0.025,
        };
        assert_eq!(r.to_string(), "Below Minimum Speed (0.0100<0.025)");
        assert_eq!(
            ExclusionReason::TrackingDiscontinuity.to_string(),
            "Tracking Discontinuity"
        );
    }

    #[test]
    fn test_capture_records() {
        let mut e = TrackedEntity::new(11, TrackBox::new(1, 2, 10, 10));
        e.add_position(TrackBox::new(3, 4, 10, 10));
        let ex = ExclusionRecord::capture(&e, ExclusionReason::ReversedDirection);
        assert_eq!(ex.person_id, 11);
        assert_eq!(ex.frames_tracked, 2);
        assert_eq!(ex.first_position, Point::new(1, 2));
        assert_eq!(ex.last_position, Point::new(3, 4));
        let done = CompletionRecord::capture(&e, 90);
        assert_eq!(done.angle, 90);
        assert_eq!(done.last_position, Point::new(3, 4));
    }

    #[test]
    fn test_tracing_sink_counts_frames() {
        let mut sink = TracingSink::new();
        sink.reset_time();
        sink.report(&FrameSummary::default(), &[], &[]);
        sink.report(&FrameSummary::default(), &[], &[]);
        assert_eq!(sink.iterations(), 2);
    }
}
