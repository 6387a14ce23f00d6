// src/scoring.rs - Overhead squat (OHS) risk scoring for a single frame
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::angles::{angle_between, angle_from_vertical};
use crate::error::ConfigError;
use crate::keypoint::{self, find_confident, Keypoint};
use crate::strategies::recommendations;

/// Categorical risk for one body region in one frame.
///
/// `Low < Medium < High`; `Unknown` (insufficient data) is not ordered
/// against the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    pub fn rank(self) -> Option<u8> {
        match self {
            Severity::Low => Some(0),
            Severity::Medium => Some(1),
            Severity::High => Some(2),
            Severity::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self.rank().is_some()
    }

    /// Points a severity is worth in a checkpoint score.
    pub fn score(self) -> f64 {
        match self {
            Severity::Low => 90.0,
            Severity::Medium => 60.0,
            Severity::High => 30.0,
            Severity::Unknown => 50.0,
        }
    }

    /// Worse of two severities. Unknown yields to any measured value.
    pub fn worst(self, other: Severity) -> Severity {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => {
                if a >= b {
                    self
                } else {
                    other
                }
            }
            (Some(_), None) => self,
            (None, _) => other,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyRegion {
    Ankle,
    Knee,
    Hip,
    Trunk,
    Shoulder,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 5] = [
        BodyRegion::Ankle,
        BodyRegion::Knee,
        BodyRegion::Hip,
        BodyRegion::Trunk,
        BodyRegion::Shoulder,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhsFlags {
    pub ankle: Severity,
    pub knee: Severity,
    pub hip: Severity,
    pub trunk: Severity,
    pub shoulder: Severity,
}

impl OhsFlags {
    pub fn uniform(severity: Severity) -> Self {
        Self {
            ankle: severity,
            knee: severity,
            hip: severity,
            trunk: severity,
            shoulder: severity,
        }
    }

    pub fn get(&self, region: BodyRegion) -> Severity {
        match region {
            BodyRegion::Ankle => self.ankle,
            BodyRegion::Knee => self.knee,
            BodyRegion::Hip => self.hip,
            BodyRegion::Trunk => self.trunk,
            BodyRegion::Shoulder => self.shoulder,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OhsMetrics {
    pub shoulder_width: f64,
    /// Knee x minus ankle x, signed, pixels
    pub knee_left_dx: f64,
    pub knee_right_dx: f64,
    pub trunk_angle_from_vertical: f64,
    pub lateral_shift_px: f64,
    /// Elbow-shoulder-hip angle; NaN when a ray is degenerate
    pub shoulder_left_angle: f64,
    pub shoulder_right_angle: f64,
    /// Shin lean from vertical
    pub shin_left_angle: f64,
    pub shin_right_angle: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub ankle: Vec<String>,
    pub knee: Vec<String>,
    pub hip: Vec<String>,
    pub trunk: Vec<String>,
    pub shoulder: Vec<String>,
}

impl Recommendations {
    fn for_flags(flags: &OhsFlags) -> Self {
        Self {
            ankle: recommendations(BodyRegion::Ankle, flags.ankle),
            knee: recommendations(BodyRegion::Knee, flags.knee),
            hip: recommendations(BodyRegion::Hip, flags.hip),
            trunk: recommendations(BodyRegion::Trunk, flags.trunk),
            shoulder: recommendations(BodyRegion::Shoulder, flags.shoulder),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhsResult {
    pub flags: OhsFlags,
    pub metrics: OhsMetrics,
    pub recommendations: Recommendations,
}

impl OhsResult {
    pub fn unknown() -> Self {
        Self {
            flags: OhsFlags::uniform(Severity::Unknown),
            metrics: OhsMetrics::default(),
            recommendations: Recommendations::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        BodyRegion::ALL
            .iter()
            .all(|r| self.flags.get(*r) == Severity::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PctBand {
    pub medium_pct: f64,
    pub high_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegBand {
    pub medium_deg: f64,
    pub high_deg: f64,
}

/// Minimum angles: at or above `low_min_deg` is Low, at or above
/// `medium_min_deg` is Medium, anything smaller is High.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinDegBand {
    pub medium_min_deg: f64,
    pub low_min_deg: f64,
}

impl MinDegBand {
    fn classify(&self, angle: f64) -> Severity {
        if angle.is_nan() {
            Severity::Unknown
        } else if angle >= self.low_min_deg {
            Severity::Low
        } else if angle >= self.medium_min_deg {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnklePolicy {
    /// Ankle severity copies the knee severity.
    MirrorKnee,
    /// Graded from shin lean (dorsiflexion proxy), worst side wins.
    /// Meaningful from the side view.
    Dorsiflexion(MinDegBand),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRanges {
    /// Threshold-set version, recorded with exported results.
    pub version: String,
    /// Landmarks below this score count as missing.
    pub min_score: f64,
    /// Knee drift from its ankle, as a fraction of shoulder width
    pub knee_valgus: PctBand,
    pub trunk_lean: DegBand,
    /// Shoulder-mid to hip-mid x offset, as a fraction of shoulder width
    pub trunk_lateral_shift: PctBand,
    pub shoulder_flexion: MinDegBand,
    pub ankle: AnklePolicy,
}

impl Default for ScoringRanges {
    fn default() -> Self {
        Self {
            version: "ohs-2024.1".to_string(),
            min_score: 0.5,
            knee_valgus: PctBand {
                medium_pct: 0.10,
                high_pct: 0.20,
            },
            trunk_lean: DegBand {
                medium_deg: 15.0,
                high_deg: 30.0,
            },
            trunk_lateral_shift: PctBand {
                medium_pct: 0.10,
                high_pct: 0.20,
            },
            shoulder_flexion: MinDegBand {
                medium_min_deg: 120.0,
                low_min_deg: 150.0,
            },
            ankle: AnklePolicy::MirrorKnee,
        }
    }
}

impl ScoringRanges {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::invalid("scoring.min_score must be in [0, 1]"));
        }
        check_pct("scoring.knee_valgus", &self.knee_valgus)?;
        check_pct("scoring.trunk_lateral_shift", &self.trunk_lateral_shift)?;
        let lean = &self.trunk_lean;
        if !(0.0 <= lean.medium_deg && lean.medium_deg <= lean.high_deg) {
            return Err(ConfigError::invalid(
                "scoring.trunk_lean needs 0 <= medium_deg <= high_deg",
            ));
        }
        check_min_band("scoring.shoulder_flexion", &self.shoulder_flexion)?;
        if let AnklePolicy::Dorsiflexion(band) = &self.ankle {
            check_min_band("scoring.ankle", band)?;
        }
        Ok(())
    }
}

fn check_pct(field: &str, band: &PctBand) -> Result<(), ConfigError> {
    if 0.0 <= band.medium_pct && band.medium_pct <= band.high_pct {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!(
            "{} needs 0 <= medium_pct <= high_pct",
            field
        )))
    }
}

fn check_min_band(field: &str, band: &MinDegBand) -> Result<(), ConfigError> {
    if band.medium_min_deg <= band.low_min_deg {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!(
            "{} needs medium_min_deg <= low_min_deg",
            field
        )))
    }
}

fn graded(value: f64, medium: f64, high: f64) -> Severity {
    if value > high {
        Severity::High
    } else if value > medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// All ten of shoulders, elbows, hips, knees and ankles must clear
/// `ranges.min_score`; otherwise every flag is Unknown and metrics are zero.
pub fn compute_ohs(keypoints: &[Keypoint], ranges: &ScoringRanges) -> OhsResult {
    let get = |name: &str| find_confident(keypoints, name, ranges.min_score);

    let (ls, rs, le, re, lh, rh, lk, rk, la, ra) = match (
        get(keypoint::LEFT_SHOULDER),
        get(keypoint::RIGHT_SHOULDER),
        get(keypoint::LEFT_ELBOW),
        get(keypoint::RIGHT_ELBOW),
        get(keypoint::LEFT_HIP),
        get(keypoint::RIGHT_HIP),
        get(keypoint::LEFT_KNEE),
        get(keypoint::RIGHT_KNEE),
        get(keypoint::LEFT_ANKLE),
        get(keypoint::RIGHT_ANKLE),
    ) {
        (
            Some(ls),
            Some(rs),
            Some(le),
            Some(re),
            Some(lh),
            Some(rh),
            Some(lk),
            Some(rk),
            Some(la),
            Some(ra),
        ) => (ls, rs, le, re, lh, rh, lk, rk, la, ra),
        _ => {
            debug!("ohs: required landmarks missing, frame not scored");
            return OhsResult::unknown();
        }
    };

    // Shoulder width is the body-scale reference
    let shoulder_width = (rs.position() - ls.position()).norm();
    if shoulder_width == 0.0 {
        debug!("ohs: zero shoulder width, frame not scored");
        return OhsResult::unknown();
    }

    // Knee drift relative to its own ankle, either direction
    let knee_left_dx = lk.x - la.x;
    let knee_right_dx = rk.x - ra.x;
    let worst_drift = knee_left_dx.abs().max(knee_right_dx.abs());
    let knee = graded(
        worst_drift,
        ranges.knee_valgus.medium_pct * shoulder_width,
        ranges.knee_valgus.high_pct * shoulder_width,
    );

    // Forward lean of the trunk line
    let shoulder_mid = keypoint::midpoint("shoulder_mid", ls, rs);
    let hip_mid = keypoint::midpoint("hip_mid", lh, rh);
    let trunk_angle_from_vertical = angle_from_vertical(&shoulder_mid, &hip_mid).abs();
    let hip = graded(
        trunk_angle_from_vertical,
        ranges.trunk_lean.medium_deg,
        ranges.trunk_lean.high_deg,
    );

    // Lateral shift of shoulders over hips
    let lateral_shift_px = (shoulder_mid.x - hip_mid.x).abs();
    let trunk = graded(
        lateral_shift_px,
        ranges.trunk_lateral_shift.medium_pct * shoulder_width,
        ranges.trunk_lateral_shift.high_pct * shoulder_width,
    );

    // Arms overhead: elbow-shoulder-hip, worst side wins
    let shoulder_left_angle = angle_between(le, ls, lh).unwrap_or(f64::NAN);
    let shoulder_right_angle = angle_between(re, rs, rh).unwrap_or(f64::NAN);
    let shoulder = ranges
        .shoulder_flexion
        .classify(shoulder_left_angle)
        .worst(ranges.shoulder_flexion.classify(shoulder_right_angle));

    let shin_left_angle = angle_from_vertical(lk, la).abs();
    let shin_right_angle = angle_from_vertical(rk, ra).abs();
    let ankle = match &ranges.ankle {
        AnklePolicy::MirrorKnee => knee,
        AnklePolicy::Dorsiflexion(band) => band
            .classify(shin_left_angle)
            .worst(band.classify(shin_right_angle)),
    };

    let flags = OhsFlags {
        ankle,
        knee,
        hip,
        trunk,
        shoulder,
    };

    OhsResult {
        recommendations: Recommendations::for_flags(&flags),
        flags,
        metrics: OhsMetrics {
            shoulder_width,
            knee_left_dx,
            knee_right_dx,
            trunk_angle_from_vertical,
            lateral_shift_px,
            shoulder_left_angle,
            shoulder_right_angle,
            shin_left_angle,
            shin_right_angle,
        },
    }
}
