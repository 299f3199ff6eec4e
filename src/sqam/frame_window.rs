use std::collections::VecDeque;

/// Bounded FIFO of the most recent raw frames.
///
/// Frames are opaque for the engine: it only keeps them around so that whoever consumes a
/// completed sequence has the pictures matching its boxes.
#[derive(Debug, Clone)]
pub struct FrameWindow<F> {
    capacity: usize,
    frames: VecDeque<F>,
}

impl<F> FrameWindow<F> {
    /// Creates new window holding at most `capacity` frames
    ///
    /// Basic usage:
    ///
    /// ```
    /// use sqam_rs::sqam::FrameWindow;
    /// let mut window: FrameWindow<u32> = FrameWindow::new(2);
    /// window.push(1);
    /// window.push(2);
    /// window.push(3);
    /// assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    /// ```
    pub fn new(capacity: usize) -> Self {
        FrameWindow {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }
    /// Appends frame, evicting the oldest one when full
    pub fn push(&mut self, frame: F) {
        if self.capacity == 0 {
            return;
        }
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }
    /// Drops oldest frames until at most `max_len` remain
    pub fn trim(&mut self, max_len: usize) {
        while self.frames.len() > max_len {
            self.frames.pop_front();
        }
    }
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.frames.iter()
    }
    pub fn latest(&self) -> Option<&F> {
        self.frames.back()
    }
}
