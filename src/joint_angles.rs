// src/joint_angles.rs - Per-frame joint angles for the overhead squat
use serde::{Deserialize, Serialize};

use crate::angles::{angle_between, angle_from_vertical, round1};
use crate::error::ConfigError;
use crate::keypoint::{self, find_confident, midpoint, Keypoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleJoint {
    Ankle,
    Knee,
    Hip,
    Spine,
    Shoulder,
    Elbow,
    Wrist,
}

impl AngleJoint {
    pub const ALL: [AngleJoint; 7] = [
        AngleJoint::Ankle,
        AngleJoint::Knee,
        AngleJoint::Hip,
        AngleJoint::Spine,
        AngleJoint::Shoulder,
        AngleJoint::Elbow,
        AngleJoint::Wrist,
    ];
}

/// Angles in degrees, rounded to one decimal. `None` means the landmarks
/// needed for that joint were missing or under-confident this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Shin lean from vertical (dorsiflexion proxy)
    pub ankle: Option<f64>,
    /// Hip-knee-ankle interior angle
    pub knee: Option<f64>,
    /// Shoulder-hip-knee interior angle
    pub hip: Option<f64>,
    /// Signed lean of shoulder midpoint over hip midpoint
    pub spine: Option<f64>,
    /// Elbow-shoulder-hip angle, 180 = arm stacked overhead
    pub shoulder: Option<f64>,
    /// Shoulder-elbow-wrist angle, 180 = locked out
    pub elbow: Option<f64>,
    /// Forearm lean from vertical. No hand landmarks exist, so this is a proxy
    pub wrist: Option<f64>,
}

impl JointAngles {
    pub fn get(&self, joint: AngleJoint) -> Option<f64> {
        match joint {
            AngleJoint::Ankle => self.ankle,
            AngleJoint::Knee => self.knee,
            AngleJoint::Hip => self.hip,
            AngleJoint::Spine => self.spine,
            AngleJoint::Shoulder => self.shoulder,
            AngleJoint::Elbow => self.elbow,
            AngleJoint::Wrist => self.wrist,
        }
    }

    pub fn measured_count(&self) -> usize {
        AngleJoint::ALL.iter().filter(|j| self.get(**j).is_some()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

impl AngleRange {
    const fn new(min: f64, max: f64, optimal: f64) -> Self {
        Self { min, max, optimal }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleThresholds {
    /// Within this many degrees of `optimal` counts as optimal.
    pub optimal_tolerance: f64,
    /// Landmarks below this score are treated as absent.
    pub min_landmark_score: f64,
    pub ankle: AngleRange,
    pub knee: AngleRange,
    pub hip: AngleRange,
    pub spine: AngleRange,
    pub shoulder: AngleRange,
    pub elbow: AngleRange,
    pub wrist: AngleRange,
}

impl Default for AngleThresholds {
    // Overhead squat reference values, degrees
    fn default() -> Self {
        Self {
            ankle: AngleRange::new(0.0, 45.0, 15.0),
            knee: AngleRange::new(80.0, 120.0, 100.0),
            hip: AngleRange::new(60.0, 100.0, 80.0),
            spine: AngleRange::new(-10.0, 10.0, 0.0),
            shoulder: AngleRange::new(150.0, 180.0, 170.0),
            elbow: AngleRange::new(170.0, 180.0, 175.0),
            wrist: AngleRange::new(0.0, 30.0, 15.0),
            optimal_tolerance: 5.0,
            min_landmark_score: 0.3,
        }
    }
}

impl AngleThresholds {
    pub fn range(&self, joint: AngleJoint) -> AngleRange {
        match joint {
            AngleJoint::Ankle => self.ankle,
            AngleJoint::Knee => self.knee,
            AngleJoint::Hip => self.hip,
            AngleJoint::Spine => self.spine,
            AngleJoint::Shoulder => self.shoulder,
            AngleJoint::Elbow => self.elbow,
            AngleJoint::Wrist => self.wrist,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for joint in AngleJoint::ALL {
            let r = self.range(joint);
            if !(r.min <= r.max) {
                return Err(ConfigError::invalid(format!(
                    "angles.{:?}: min {} exceeds max {}",
                    joint, r.min, r.max
                )));
            }
        }
        if !(self.optimal_tolerance >= 0.0) {
            return Err(ConfigError::invalid("angles.optimal_tolerance must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.min_landmark_score) {
            return Err(ConfigError::invalid("angles.min_landmark_score must be in [0, 1]"));
        }
        Ok(())
    }
}

const LEFT: Side = Side {
    shoulder: keypoint::LEFT_SHOULDER,
    elbow: keypoint::LEFT_ELBOW,
    wrist: keypoint::LEFT_WRIST,
    hip: keypoint::LEFT_HIP,
    knee: keypoint::LEFT_KNEE,
    ankle: keypoint::LEFT_ANKLE,
};

const RIGHT: Side = Side {
    shoulder: keypoint::RIGHT_SHOULDER,
    elbow: keypoint::RIGHT_ELBOW,
    wrist: keypoint::RIGHT_WRIST,
    hip: keypoint::RIGHT_HIP,
    knee: keypoint::RIGHT_KNEE,
    ankle: keypoint::RIGHT_ANKLE,
};

struct Side {
    shoulder: &'static str,
    elbow: &'static str,
    wrist: &'static str,
    hip: &'static str,
    knee: &'static str,
    ankle: &'static str,
}

pub fn calculate_joint_angles(keypoints: &[Keypoint], thresholds: &AngleThresholds) -> JointAngles {
    let min = thresholds.min_landmark_score;
    let get = |name: &str| find_confident(keypoints, name, min);

    // Vertex-in-the-middle triple, left side first
    let triple = |pick: fn(&Side) -> [&'static str; 3]| -> Option<f64> {
        [LEFT, RIGHT].iter().find_map(|side| {
            let [a, b, c] = pick(side);
            let (a, b, c) = (get(a)?, get(b)?, get(c)?);
            angle_between(a, b, c).ok()
        })
    };

    // Segment lean from vertical, left side first
    let lean = |pick: fn(&Side) -> [&'static str; 2]| -> Option<f64> {
        [LEFT, RIGHT].iter().find_map(|side| {
            let [top, bottom] = pick(side);
            Some(angle_from_vertical(get(top)?, get(bottom)?).abs())
        })
    };

    let shoulder_mid = match (get(keypoint::LEFT_SHOULDER), get(keypoint::RIGHT_SHOULDER)) {
        (Some(l), Some(r)) => Some(midpoint("shoulder_mid", l, r)),
        _ => None,
    };
    let hip_mid = match (get(keypoint::LEFT_HIP), get(keypoint::RIGHT_HIP)) {
        (Some(l), Some(r)) => Some(midpoint("hip_mid", l, r)),
        _ => None,
    };
    let spine = match (&shoulder_mid, &hip_mid) {
        (Some(s), Some(h)) if s.confidence() >= min && h.confidence() >= min => {
            Some(angle_from_vertical(s, h))
        }
        _ => None,
    };

    let angles = JointAngles {
        ankle: lean(|s| [s.knee, s.ankle]),
        knee: triple(|s| [s.hip, s.knee, s.ankle]),
        hip: triple(|s| [s.shoulder, s.hip, s.knee]),
        spine,
        shoulder: triple(|s| [s.elbow, s.shoulder, s.hip]),
        elbow: triple(|s| [s.shoulder, s.elbow, s.wrist]),
        wrist: lean(|s| [s.wrist, s.elbow]),
    };

    JointAngles {
        ankle: angles.ankle.map(round1),
        knee: angles.knee.map(round1),
        hip: angles.hip.map(round1),
        spine: angles.spine.map(round1),
        shoulder: angles.shoulder.map(round1),
        elbow: angles.elbow.map(round1),
        wrist: angles.wrist.map(round1),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleStatus {
    Optimal,
    Acceptable,
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleAssessment {
    pub joint: AngleJoint,
    pub status: AngleStatus,
    pub message: String,
}

/// Grades every angle against its configured band. Unmeasured joints always
/// need improvement.
pub fn assess_angles(angles: &JointAngles, thresholds: &AngleThresholds) -> Vec<AngleAssessment> {
    AngleJoint::ALL
        .iter()
        .map(|&joint| {
            let AngleRange { min, max, optimal } = thresholds.range(joint);
            let (status, message) = match angles.get(joint) {
                None => (AngleStatus::NeedsImprovement, "Unable to measure".to_string()),
                Some(angle) if (angle - optimal).abs() <= thresholds.optimal_tolerance => (
                    AngleStatus::Optimal,
                    format!("{}° (optimal: {}°)", angle, optimal),
                ),
                Some(angle) if angle >= min && angle <= max => (
                    AngleStatus::Acceptable,
                    format!("{}° (range: {}-{}°)", angle, min, max),
                ),
                Some(angle) => (
                    AngleStatus::NeedsImprovement,
                    format!("{}° (should be {}-{}°)", angle, min, max),
                ),
            };
            AngleAssessment {
                joint,
                status,
                message,
            }
        })
        .collect()
}
