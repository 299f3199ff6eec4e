use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::sqam::sqam_errors::SqamError;
use crate::sqam::tracked_entity::TrackId;
use crate::utils::{Point, TrackBox};

/// Set for points of rejected observations and for endpoints of completed sequences
pub const SENTINEL_SET: TrackId = 0;

/// Which of the two engine diagrams is being finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramMode {
    /// Every observation, labelled by track id
    AllData,
    /// Completed sequences only, labelled by track id and angles
    FilteredData,
}

impl DiagramMode {
    fn file_stem(&self) -> &'static str {
        match self {
            DiagramMode::AllData => "all_data",
            DiagramMode::FilteredData => "filtered_data",
        }
    }
    fn title(&self) -> &'static str {
        match self {
            DiagramMode::AllData => "Trajectory Plot of All Data Points by ID",
            DiagramMode::FilteredData => {
                "Trajectory Plot of Valid Data Points by ID and Respective Angles"
            }
        }
    }
    fn legend_title(&self) -> &'static str {
        match self {
            DiagramMode::AllData => "Legend by ID",
            DiagramMode::FilteredData => "Legend by ID with Respective Angles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeries {
    pub set_id: TrackId,
    pub label: Option<String>,
    pub points: Vec<Point>,
}

/// Finalized content of an accumulator: what has to be drawn, not how
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub mode: DiagramMode,
    pub series: Vec<PointSeries>,
    pub sentinel: Option<PointSeries>,
}

impl Diagram {
    pub fn labels(&self) -> Vec<String> {
        self.series.iter().filter_map(|s| s.label.clone()).collect()
    }
}

#[derive(Serialize)]
struct DiagramExport<'a> {
    title: &'a str,
    x_label: &'a str,
    y_label: &'a str,
    x_limits: [i32; 2],
    y_limits: [i32; 2],
    diagram: &'a Diagram,
}

#[derive(Serialize)]
struct LegendExport<'a> {
    title: &'a str,
    labels: Vec<String>,
}

/// Collects trajectory points per set id. Y is stored inverted so that
/// the picture looks like the image when plotted with a usual Y axis.
#[derive(Debug, Clone, Default)]
pub struct DiagramAccumulator {
    points: BTreeMap<TrackId, Vec<Point>>,
    angles: BTreeMap<TrackId, Vec<i32>>,
}

impl DiagramAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn record_point(&mut self, set_id: TrackId, point: &TrackBox) {
        self.points
            .entry(set_id)
            .or_default()
            .push(Point::new(point.x, -point.y));
    }
    pub fn record_set(&mut self, set_id: TrackId, points: &[TrackBox], angle: i32) {
        let set = self.points.entry(set_id).or_default();
        set.extend(points.iter().map(|b| Point::new(b.x, -b.y)));
        self.angles.entry(set_id).or_default().push(angle);
    }
    pub fn get_points(&self, set_id: TrackId) -> Option<&[Point]> {
        self.points.get(&set_id).map(|v| v.as_slice())
    }
    pub fn get_angles(&self, set_id: TrackId) -> Option<&[i32]> {
        self.angles.get(&set_id).map(|v| v.as_slice())
    }
    pub fn finalize(&self, mode: DiagramMode) -> Diagram {
        let series = self
            .points
            .iter()
            .filter(|(set_id, _)| **set_id != SENTINEL_SET)
            .map(|(set_id, points)| {
                let label = match mode {
                    DiagramMode::AllData => set_id.to_string(),
                    DiagramMode::FilteredData => {
                        let angles = self
                            .angles
                            .get(set_id)
                            .map(|a| a.iter().join(", "))
                            .unwrap_or_default();
                        format!("{}: {}", set_id, angles)
                    }
                };
                PointSeries {
                    set_id: *set_id,
                    label: Some(label),
                    points: points.clone(),
                }
            })
            .collect();
        let sentinel = self.points.get(&SENTINEL_SET).map(|points| PointSeries {
            set_id: SENTINEL_SET,
            label: None,
            points: points.clone(),
        });
        Diagram {
            mode,
            series,
            sentinel,
        }
    }
    /// Writes `<stem>.json` and `<stem>_legend.json` into `output_dir`
    pub fn save<P: AsRef<Path>>(
        &self,
        mode: DiagramMode,
        max_height: i32,
        max_width: i32,
        output_dir: P,
    ) -> Result<(), SqamError> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;
        let diagram = self.finalize(mode);
        let export = DiagramExport {
            title: mode.title(),
            x_label: "Coordinate X",
            y_label: "Inverted Coordinate Y",
            x_limits: [0, max_width],
            y_limits: [-max_height, 0],
            diagram: &diagram,
        };
        let legend = LegendExport {
            title: mode.legend_title(),
            labels: diagram.labels(),
        };
        let stem = mode.file_stem();
        fs::write(
            output_dir.join(format!("{}.json", stem)),
            serde_json::to_string_pretty(&export)?,
        )?;
        fs::write(
            output_dir.join(format!("{}_legend.json", stem)),
            serde_json::to_string_pretty(&legend)?,
        )?;
        Ok(())
    }
}
