// src/estimator.rs - Pose estimation capability the session pulls detections from
use std::collections::VecDeque;

use anyhow::Result;

use crate::keypoint::Keypoint;

/// A pose model, owned and initialized by the host. The session only asks it
/// for one frame's detections at a time.
pub trait PoseEstimator {
    type Frame;

    fn estimate(&mut self, frame: &Self::Frame) -> Result<Vec<Keypoint>>;
}

/// Replays recorded detections in order, one list per call. The frame
/// argument is ignored; once exhausted every call returns no detections.
pub struct ReplayEstimator {
    frames: VecDeque<Vec<Keypoint>>,
}

impl ReplayEstimator {
    pub fn new(frames: impl IntoIterator<Item = Vec<Keypoint>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseEstimator for ReplayEstimator {
    type Frame = ();

    fn estimate(&mut self, _frame: &()) -> Result<Vec<Keypoint>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
