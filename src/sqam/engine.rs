use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::sqam::angle::{camera_reference, derive_angle};
use crate::sqam::config::SqamConfig;
use crate::sqam::diagram::{DiagramAccumulator, DiagramMode, SENTINEL_SET};
use crate::sqam::frame_window::FrameWindow;
use crate::sqam::reports::{
    CompletionRecord, ExclusionReason, ExclusionRecord, FrameReport, FrameSummary, ReportSink,
    SequenceHandler,
};
use crate::sqam::sqam_errors::{ConfigError, SqamError};
use crate::sqam::tracked_entity::{TrackId, TrackedEntity};
use crate::utils::{Point, Rect, TrackBox};

/// Sequence Quality Analysis Module.
///
/// Consumes tracker output frame by frame and validates every track against a set of rules:
/// it should keep roughly the same direction, move fast enough and never turn back. Tracks that
/// survive `n` frames are completed and reported with their motion angle.
pub struct SequenceQualityEngine<F> {
    // Scene size in pixels
    height: i32,
    width: i32,
    config: SqamConfig,
    // Point the motion angle is measured from
    reference: Point,
    // Storage
    entities: Vec<TrackedEntity>,
    last_frames: FrameWindow<F>,
    all_data: Option<DiagramAccumulator>,
    filtered_data: Option<DiagramAccumulator>,
    sink: Option<Box<dyn ReportSink>>,
    sequence_handler: Option<Box<dyn SequenceHandler<F>>>,
}

impl<F> SequenceQualityEngine<F> {
    /// Creates new engine for the scene of given size
    ///
    /// Basic usage:
    ///
    /// ```
    /// use sqam_rs::sqam::{SequenceQualityEngine, SqamConfig};
    /// let engine: SequenceQualityEngine<()> = SequenceQualityEngine::new(480, 640, SqamConfig::default()).unwrap();
    /// assert_eq!(engine.live_count(), 0);
    ///
    /// let bad = SqamConfig { p: 1, ..SqamConfig::default() };
    /// assert!(SequenceQualityEngine::<()>::new(480, 640, bad).is_err());
    /// ```
    pub fn new(height: i32, width: i32, config: SqamConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if height < 1 || width < 1 {
            return Err(ConfigError::SceneSize { height, width });
        }
        let reference = camera_reference(height, width, config.camera_dist).ok_or(
            ConfigError::CameraOutOfRange {
                height,
                camera_dist: config.camera_dist,
            },
        )?;
        let (all_data, filtered_data) = if config.diagrams {
            (Some(DiagramAccumulator::new()), Some(DiagramAccumulator::new()))
        } else {
            (None, None)
        };
        Ok(SequenceQualityEngine {
            height,
            width,
            reference,
            last_frames: FrameWindow::new(config.n),
            config,
            entities: Vec::new(),
            all_data,
            filtered_data,
            sink: None,
            sequence_handler: None,
        })
    }
    /// Attaches receiver of per-frame reports
    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }
    /// Attaches consumer of completed sequences
    pub fn with_sequence_handler(mut self, handler: Box<dyn SequenceHandler<F>>) -> Self {
        self.sequence_handler = Some(handler);
        self
    }
    pub fn get_config(&self) -> &SqamConfig {
        &self.config
    }
    pub fn get_entities(&self) -> &[TrackedEntity] {
        &self.entities
    }
    pub fn get_entity(&self, track_id: TrackId) -> Option<&TrackedEntity> {
        self.entities.iter().find(|e| e.get_track_id() == track_id)
    }
    pub fn live_count(&self) -> usize {
        self.entities.len()
    }
    pub fn get_frames(&self) -> &FrameWindow<F> {
        &self.last_frames
    }
    pub fn get_all_data(&self) -> Option<&DiagramAccumulator> {
        self.all_data.as_ref()
    }
    pub fn get_filtered_data(&self) -> Option<&DiagramAccumulator> {
        self.filtered_data.as_ref()
    }
    /// Processes detections of a single frame.
    ///
    /// `boxes` are (center_x, center_y, width, height) and must be index-aligned with
    /// `track_ids`; ids must be unique within the frame.
    pub fn process_new_frame(
        &mut self,
        frame: F,
        boxes: &[Rect],
        track_ids: &[TrackId],
    ) -> FrameReport {
        self.last_frames.push(frame);

        if boxes.len() != track_ids.len() {
            warn!(
                boxes = boxes.len(),
                track_ids = track_ids.len(),
                "Boxes and track ids are not aligned, extra items are ignored"
            );
        }
        let detections: Vec<(TrackBox, TrackId)> = boxes
            .iter()
            .zip(track_ids.iter())
            .map(|(bbox, track_id)| (TrackBox::from(bbox), *track_id))
            .collect();
        let detections_num = detections.len();

        // Detections which are already taken by someone (or duplicated) are marked here
        let mut consumed = vec![false; detections.len()];
        let mut index: HashMap<TrackId, usize> = HashMap::with_capacity(detections.len());
        for (i, (_, track_id)) in detections.iter().enumerate() {
            if index.contains_key(track_id) {
                warn!(track_id = track_id, "Duplicated track id in a single frame, ignoring it");
                consumed[i] = true;
                continue;
            }
            index.insert(*track_id, i);
        }

        let mut report = FrameReport::default();
        let mut num_max_frames = 0;

        // Work on the snapshot: survivors are put back once the frame is done
        let snapshot = std::mem::take(&mut self.entities);
        let mut survivors = Vec::with_capacity(snapshot.len() + detections.len());
        for mut entity in snapshot {
            let idx = match index.get(&entity.get_track_id()) {
                Some(&idx) if !consumed[idx] => idx,
                _ => {
                    self.exclude(&entity, ExclusionReason::TrackingDiscontinuity, &mut report);
                    continue;
                }
            };
            consumed[idx] = true;
            let bbox = detections[idx].0;
            entity.add_position(bbox);
            match self.validate(&mut entity) {
                Ok(()) => {
                    if let Some(all_data) = self.all_data.as_mut() {
                        all_data.record_point(entity.get_track_id(), &bbox);
                    }
                    num_max_frames = usize::max(num_max_frames, entity.track_len());
                    if entity.track_len() >= self.config.n {
                        self.complete(entity, &bbox, &mut report);
                    } else {
                        survivors.push(entity);
                    }
                }
                Err(reason) => {
                    if let Some(all_data) = self.all_data.as_mut() {
                        all_data.record_point(SENTINEL_SET, &bbox);
                    }
                    self.exclude(&entity, reason, &mut report);
                }
            }
        }

        // Whatever left unmatched is a new entity
        let mut new_entries = 0;
        for ((bbox, track_id), taken) in detections.iter().zip(consumed.iter()) {
            if *taken {
                continue;
            }
            if let Some(all_data) = self.all_data.as_mut() {
                all_data.record_point(*track_id, bbox);
            }
            debug!(track_id = track_id, "New entry");
            survivors.push(TrackedEntity::new(*track_id, *bbox));
            new_entries += 1;
        }
        if new_entries > 0 && num_max_frames == 0 {
            num_max_frames = 1;
        }

        self.entities = survivors;
        self.last_frames.trim(num_max_frames);

        report.summary = FrameSummary {
            detections_num,
            new_entries,
            exclusions_num: report.exclusions.len(),
            valid_sequence_num: report.completions.len(),
            num_max_frames,
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.report(&report.summary, &report.exclusions, &report.completions);
        }
        report
    }
    /// Exports diagrams (if enabled) into `<output_path>/diagrams`.
    ///
    /// Returns directory the diagrams were written to.
    pub fn end<P: AsRef<Path>>(&self, output_path: P) -> Result<Option<PathBuf>, SqamError> {
        let mut saved_to = None;
        if let (Some(all_data), Some(filtered_data)) = (&self.all_data, &self.filtered_data) {
            let output_dir = output_path.as_ref().join("diagrams");
            all_data.save(DiagramMode::AllData, self.height, self.width, &output_dir)?;
            filtered_data.save(DiagramMode::FilteredData, self.height, self.width, &output_dir)?;
            info!(
                "Diagrams and respective legends are saved in {}",
                output_dir.display()
            );
            saved_to = Some(output_dir);
        }
        info!(live = self.entities.len(), "Sequence quality analysis is finished");
        Ok(saved_to)
    }
    // Runs validators in order and stops on the first failure
    fn validate(&self, entity: &mut TrackedEntity) -> Result<(), ExclusionReason> {
        let num_frames_tracked = entity.track_len();
        if num_frames_tracked >= 2 {
            self.check_direction_changes(entity)?;
        }
        if num_frames_tracked % self.config.x == 0 {
            self.check_minimum_speed(entity)?;
            self.check_direction_reversal(entity)?;
        }
        Ok(())
    }
    fn check_direction_changes(&self, entity: &mut TrackedEntity) -> Result<(), ExclusionReason> {
        if entity.track_len() > self.config.p {
            // Trendline still holds the fit of the previous frame here
            if let Some(distance) = entity.distance_point_to_trendline() {
                if distance > self.config.d {
                    return Err(ExclusionReason::DirectionChange {
                        distance,
                        max_distance: self.config.d,
                    });
                }
            }
        } else if !entity.has_variance() {
            return Err(ExclusionReason::ZeroVariance);
        }
        entity.calculate_trendline_coefficients();
        Ok(())
    }
    fn check_minimum_speed(&self, entity: &mut TrackedEntity) -> Result<(), ExclusionReason> {
        entity.calculate_speed(self.config.x);
        if entity.get_speed_history().len() >= self.config.t {
            let speed = entity.calculate_average_speed(self.config.t);
            if speed < self.config.v {
                return Err(ExclusionReason::BelowMinimumSpeed {
                    speed,
                    min_speed: self.config.v,
                });
            }
        }
        Ok(())
    }
    fn check_direction_reversal(&self, entity: &TrackedEntity) -> Result<(), ExclusionReason> {
        if entity.is_reversed() {
            return Err(ExclusionReason::ReversedDirection);
        }
        Ok(())
    }
    fn exclude(&self, entity: &TrackedEntity, reason: ExclusionReason, report: &mut FrameReport) {
        debug!(
            track_id = entity.get_track_id(),
            frames_tracked = entity.track_len(),
            reason = %reason,
            "Entity excluded"
        );
        report.exclusions.push(ExclusionRecord::capture(entity, reason));
    }
    fn complete(&mut self, mut entity: TrackedEntity, last_box: &TrackBox, report: &mut FrameReport) {
        let trendline = match entity.get_trendline() {
            Some(line) => line,
            None => entity.calculate_trendline_coefficients(),
        };
        let angle = derive_angle(self.reference, entity.get_box_history(), trendline);
        if let Some(filtered_data) = self.filtered_data.as_mut() {
            filtered_data.record_set(entity.get_track_id(), entity.get_box_history(), angle);
            filtered_data.record_point(SENTINEL_SET, last_box);
        }
        info!(
            track_id = entity.get_track_id(),
            angle = angle,
            "Sequence completed"
        );
        report.completions.push(CompletionRecord::capture(&entity, angle));
        if let Some(handler) = self.sequence_handler.as_mut() {
            handler.handle_sequence(&entity, angle, &self.last_frames);
        }
    }
}

impl<F> fmt::Display for SequenceQualityEngine<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Scene: {}x{}\n\tWindow (n): {}\n\tDirection warmup (p): {}\n\tSpeed stride (x): {}\n\tSpeed samples (t): {}\n\tMax deviation (d): {}\n\tMin speed (v): {}\n\tCamera distance: {}\n\tDiagrams: {}",
            self.width,
            self.height,
            self.config.n,
            self.config.p,
            self.config.x,
            self.config.t,
            self.config.d,
            self.config.v,
            self.config.camera_dist,
            self.config.diagrams
        )
    }
}
