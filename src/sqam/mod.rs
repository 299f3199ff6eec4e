//! Export contents of `sqam` folder
mod angle;
mod config;
mod diagram;
mod engine;
mod frame_window;
mod reports;
mod sqam_errors;
mod tracked_entity;

#[cfg(test)]
mod test_data;

pub use self::{
    angle::*,
    config::*,
    diagram::*,
    engine::*,
    frame_window::*,
    reports::*,
    sqam_errors::*,
    tracked_entity::*,
};
