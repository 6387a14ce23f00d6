// src/keypoint.rs
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f64, y: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score: Some(score),
        }
    }

    /// Confidence with an absent score treated as fully confident.
    pub fn confidence(&self) -> f64 {
        self.score.unwrap_or(1.0)
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

// Landmark vocabulary (MoveNet / COCO-17 names)
pub const NOSE: &str = "nose";
pub const LEFT_EYE: &str = "left_eye";
pub const RIGHT_EYE: &str = "right_eye";
pub const LEFT_EAR: &str = "left_ear";
pub const RIGHT_EAR: &str = "right_ear";
pub const LEFT_SHOULDER: &str = "left_shoulder";
pub const RIGHT_SHOULDER: &str = "right_shoulder";
pub const LEFT_ELBOW: &str = "left_elbow";
pub const RIGHT_ELBOW: &str = "right_elbow";
pub const LEFT_WRIST: &str = "left_wrist";
pub const RIGHT_WRIST: &str = "right_wrist";
pub const LEFT_HIP: &str = "left_hip";
pub const RIGHT_HIP: &str = "right_hip";
pub const LEFT_KNEE: &str = "left_knee";
pub const RIGHT_KNEE: &str = "right_knee";
pub const LEFT_ANKLE: &str = "left_ankle";
pub const RIGHT_ANKLE: &str = "right_ankle";

/// First keypoint with the given name. Duplicates later in the list are ignored.
pub fn find<'a>(keypoints: &'a [Keypoint], name: &str) -> Option<&'a Keypoint> {
    keypoints.iter().find(|k| k.name == name)
}

/// First keypoint with the given name, only if it clears `min_score`.
pub fn find_confident<'a>(
    keypoints: &'a [Keypoint],
    name: &str,
    min_score: f64,
) -> Option<&'a Keypoint> {
    find(keypoints, name).filter(|k| k.confidence() >= min_score)
}

/// Midpoint of two landmarks; the score is the weaker of the pair.
pub fn midpoint(name: &str, a: &Keypoint, b: &Keypoint) -> Keypoint {
    Keypoint {
        name: name.to_string(),
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        score: Some(a.confidence().min(b.confidence())),
    }
}
