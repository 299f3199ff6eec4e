//! Sequence quality analysis for multi object tracking output.
//!
//! Feed every frame's detections (boxes + track identifiers coming from any external tracker)
//! into [`sqam::SequenceQualityEngine`] and it will keep only trajectories which are long enough,
//! fast enough, straight enough and never reverse. Each accepted trajectory is reported together
//! with its motion angle relative to the camera.
pub mod sqam;
pub mod utils;
