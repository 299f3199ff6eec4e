use crate::utils::Rect;

/// Boxes of an entity moving with constant velocity: start + k * step for k in 0..frames
pub fn get_linear_track(
    start: (f32, f32),
    step: (f32, f32),
    frames: usize,
    size: (f32, f32),
) -> Vec<Rect> {
    (0..frames)
        .map(|k| {
            Rect::new(
                start.0 + step.0 * k as f32,
                start.1 + step.1 * k as f32,
                size.0,
                size.1,
            )
        })
        .collect()
}

/// Same box repeated over and over
pub fn get_still_track(position: (f32, f32), frames: usize) -> Vec<Rect> {
    get_linear_track(position, (0.0, 0.0), frames, (20.0, 50.0))
}

/// Moves along y = x forward for `forward` frames and then goes back along the same line
pub fn get_reversing_track(forward: usize, backward: usize) -> Vec<Rect> {
    let mut boxes = get_linear_track((0.0, 0.0), (10.0, 10.0), forward, (20.0, 50.0));
    let turn = boxes[boxes.len() - 1];
    boxes.extend(
        get_linear_track((turn.x, turn.y), (-10.0, -10.0), backward + 1, (20.0, 50.0))
            .into_iter()
            .skip(1),
    );
    boxes
}
