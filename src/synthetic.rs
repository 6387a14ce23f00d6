// src/synthetic.rs - Deterministic squatting skeleton for tests and diagnostics
use std::f64::consts::TAU;

use crate::keypoint::{self, Keypoint};

#[derive(Debug, Clone, PartialEq)]
pub struct SquatParams {
    pub fps: f64,
    /// Standing to bottom and back, seconds
    pub period_s: f64,
    /// Standing pause before the first rep and after each rep, seconds
    pub hold_s: f64,
    /// Hip drop at the bottom, pixels
    pub depth_px: f64,
    /// Inward travel of each knee at the bottom, pixels
    pub knee_drift_px: f64,
    /// Forward trunk lean at the bottom, degrees
    pub trunk_lean_deg: f64,
    /// Extra forward drop of the arms relative to the trunk at the bottom
    pub arm_drop_deg: f64,
    pub shoulder_width_px: f64,
    /// Standing hip midpoint
    pub hip_origin: (f64, f64),
    pub confidence: f64,
    /// Amplitude of a fixed pseudo-random horizontal wobble, pixels
    pub jitter_px: f64,
}

impl Default for SquatParams {
    fn default() -> Self {
        Self {
            fps: 30.0,
            period_s: 3.0,
            hold_s: 1.0,
            depth_px: 100.0,
            knee_drift_px: 0.0,
            trunk_lean_deg: 0.0,
            arm_drop_deg: 0.0,
            shoulder_width_px: 100.0,
            hip_origin: (320.0, 360.0),
            confidence: 0.9,
            jitter_px: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticFrame {
    pub index: u64,
    /// Milliseconds since the first frame
    pub t: f64,
    pub keypoints: Vec<Keypoint>,
}

// Segment lengths, pixels
const THIGH: f64 = 100.0;
const SHIN: f64 = 100.0;
const TRUNK: f64 = 150.0;
const UPPER_ARM: f64 = 80.0;
const FOREARM: f64 = 70.0;
const NECK: f64 = 40.0;

pub struct SyntheticSquat {
    params: SquatParams,
    period_frames: u64,
    hold_frames: u64,
}

impl SyntheticSquat {
    pub fn new(params: SquatParams) -> Self {
        let period_frames = (params.period_s * params.fps).round().max(1.0) as u64;
        let hold_frames = (params.hold_s * params.fps).round().max(0.0) as u64;
        Self {
            params,
            period_frames,
            hold_frames,
        }
    }

    pub fn params(&self) -> &SquatParams {
        &self.params
    }

    /// Frames covering `reps` squats: a lead-in hold, then each rep
    /// followed by a hold.
    pub fn frame_count(&self, reps: usize) -> u64 {
        self.hold_frames + reps as u64 * (self.period_frames + self.hold_frames)
    }

    /// Squat depth in [0, 1] at a frame index.
    pub fn depth_at(&self, index: u64, reps: usize) -> f64 {
        let Some(k) = index.checked_sub(self.hold_frames) else {
            return 0.0;
        };
        let cycle = self.period_frames + self.hold_frames;
        if k / cycle >= reps as u64 {
            return 0.0;
        }
        let within = k % cycle;
        if within >= self.period_frames {
            return 0.0;
        }
        let phase = within as f64 / self.period_frames as f64 * TAU;
        (1.0 - phase.cos()) / 2.0
    }

    pub fn frames(&self, reps: usize) -> impl Iterator<Item = SyntheticFrame> + '_ {
        (0..self.frame_count(reps)).map(move |i| SyntheticFrame {
            index: i,
            t: i as f64 * 1000.0 / self.params.fps,
            keypoints: self.pose(self.depth_at(i, reps), i),
        })
    }

    /// Full 17-landmark skeleton at squat depth `s` (0 standing, 1 bottom).
    pub fn pose(&self, s: f64, index: u64) -> Vec<Keypoint> {
        let p = &self.params;
        let (cx, hip_y0) = p.hip_origin;
        let half = p.shoulder_width_px / 2.0;
        let hip_half = half * 0.8;

        let ankle_y = hip_y0 + THIGH + SHIN;
        // Knees sink a little so the thigh never collapses to a point
        let knee_y = hip_y0 + THIGH + 0.2 * p.depth_px * s;
        let hip_y = hip_y0 + p.depth_px * s;

        // Upper body rotates forward about the hip midpoint
        let lean = (p.trunk_lean_deg * s).to_radians();
        let up = (lean.sin(), -lean.cos());
        let arm_angle = lean + (p.arm_drop_deg * s).to_radians();
        let arm = (arm_angle.sin(), -arm_angle.cos());
        let shoulder_mid = (cx + TRUNK * up.0, hip_y + TRUNK * up.1);

        let drift = p.knee_drift_px * s;
        let mut out = Vec::with_capacity(17);
        let mut push = |name: &str, x: f64, y: f64| {
            let j = out.len() as f64;
            let wobble = p.jitter_px * ((index as f64) * 12.9898 + j * 78.233).sin();
            out.push(Keypoint::new(name, x + wobble, y, p.confidence));
        };

        let head = (shoulder_mid.0 + NECK * up.0, shoulder_mid.1 + NECK * up.1);
        push(keypoint::NOSE, head.0, head.1);
        push(keypoint::LEFT_EYE, head.0 - 8.0, head.1 - 8.0);
        push(keypoint::RIGHT_EYE, head.0 + 8.0, head.1 - 8.0);
        push(keypoint::LEFT_EAR, head.0 - 16.0, head.1 - 4.0);
        push(keypoint::RIGHT_EAR, head.0 + 16.0, head.1 - 4.0);

        for (side, sign) in [("left", -1.0), ("right", 1.0)] {
            let sx = shoulder_mid.0 + sign * half;
            let sy = shoulder_mid.1;
            let (ex, ey) = (sx + UPPER_ARM * arm.0, sy + UPPER_ARM * arm.1);
            let (wx, wy) = (ex + FOREARM * arm.0, ey + FOREARM * arm.1);
            let hx = cx + sign * hip_half;
            let ax = cx + sign * hip_half;
            // Valgus: knees travel toward the midline
            let kx = ax - sign * drift;

            let name = |joint: &str| format!("{}_{}", side, joint);
            push(&name("shoulder"), sx, sy);
            push(&name("elbow"), ex, ey);
            push(&name("wrist"), wx, wy);
            push(&name("hip"), hx, hip_y);
            push(&name("knee"), kx, knee_y);
            push(&name("ankle"), ax, ankle_y);
        }
        out
    }
}
