// src/assessment.rs - Two-view assessment: merge per-rep OHS snapshots into a tiered report
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{self, Prescription};
use crate::scoring::{BodyRegion, OhsResult, ScoringRanges, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Front,
    Side,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Front => write!(f, "front"),
            View::Side => write!(f, "side"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Checkpoint {
    Ankle,
    Knee,
    Hip,
    Trunk,
    Shoulder,
    Symmetry,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 6] = [
        Checkpoint::Ankle,
        Checkpoint::Knee,
        Checkpoint::Hip,
        Checkpoint::Trunk,
        Checkpoint::Shoulder,
        Checkpoint::Symmetry,
    ];

    /// Body region scored per frame; Symmetry is derived and has none.
    pub fn region(self) -> Option<BodyRegion> {
        match self {
            Checkpoint::Ankle => Some(BodyRegion::Ankle),
            Checkpoint::Knee => Some(BodyRegion::Knee),
            Checkpoint::Hip => Some(BodyRegion::Hip),
            Checkpoint::Trunk => Some(BodyRegion::Trunk),
            Checkpoint::Shoulder => Some(BodyRegion::Shoulder),
            Checkpoint::Symmetry => None,
        }
    }
}

impl From<BodyRegion> for Checkpoint {
    fn from(region: BodyRegion) -> Self {
        match region {
            BodyRegion::Ankle => Checkpoint::Ankle,
            BodyRegion::Knee => Checkpoint::Knee,
            BodyRegion::Hip => Checkpoint::Hip,
            BodyRegion::Trunk => Checkpoint::Trunk,
            BodyRegion::Shoulder => Checkpoint::Shoulder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Either view High gives HIGH, else either Medium gives MEDIUM.
    pub fn from_views(front: Severity, side: Severity) -> Self {
        if front == Severity::High || side == Severity::High {
            RiskLevel::High
        } else if front == Severity::Medium || side == Severity::Medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn from_symmetry(score: u8) -> Self {
        if score >= 80 {
            RiskLevel::Low
        } else if score >= 60 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Elite,
    Pro,
    Amateur,
    Novice,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Elite => "ELITE",
            Tier::Pro => "PRO",
            Tier::Amateur => "AMATEUR",
            Tier::Novice => "NOVICE",
        };
        f.write_str(s)
    }
}

/// Overall tier from the mean checkpoint score and the number of HIGH
/// checkpoints. Rules are tried in order.
pub fn tier_from_scores(avg: f64, high_count: usize) -> Tier {
    if avg >= 90.0 && high_count == 0 {
        Tier::Elite
    } else if (80.0..90.0).contains(&avg) || (high_count <= 1 && avg >= 85.0) {
        Tier::Pro
    } else if (65.0..80.0).contains(&avg) || high_count == 2 {
        Tier::Amateur
    } else {
        Tier::Novice
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub checkpoint: Checkpoint,
    /// 0-100
    pub score: u8,
    pub risk: RiskLevel,
    /// Dysfunction tag ids from the catalog
    pub dysfunctions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athlete_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub tier: Tier,
    /// 0-100
    pub symmetry_score: u8,
    pub checkpoints: Vec<CheckpointResult>,
    /// Threshold set the snapshots were scored with
    pub ranges_version: String,
}

impl AssessmentResult {
    pub fn checkpoint(&self, checkpoint: Checkpoint) -> Option<&CheckpointResult> {
        self.checkpoints.iter().find(|c| c.checkpoint == checkpoint)
    }

    /// Checkpoint to review first: highest risk, earliest on ties.
    pub fn highest_risk(&self) -> Option<&CheckpointResult> {
        let mut best: Option<&CheckpointResult> = None;
        for cp in &self.checkpoints {
            if best.map_or(true, |b| cp.risk > b.risk) {
                best = Some(cp);
            }
        }
        best
    }

    pub fn high_count(&self) -> usize {
        self.checkpoints
            .iter()
            .filter(|c| c.risk == RiskLevel::High)
            .count()
    }
}

/// Prescriptions for every attached dysfunction, grouped by checkpoint.
/// Every checkpoint has an entry; ids missing from the catalog are skipped.
pub fn build_prescriptions(
    result: &AssessmentResult,
) -> BTreeMap<Checkpoint, Vec<&'static Prescription>> {
    let mut out: BTreeMap<Checkpoint, Vec<&'static Prescription>> =
        Checkpoint::ALL.iter().map(|cp| (*cp, Vec::new())).collect();

    for cp in &result.checkpoints {
        for id in &cp.dysfunctions {
            if let Some(p) = catalog::prescription(id) {
                out.entry(cp.checkpoint).or_default().push(p);
            }
        }
    }
    out
}

/// Left/right balance from the front-view snapshot, 0-100.
///
/// Knee component is `100 - 2 * |  |dx_l| - |dx_r|  |`, shoulder component
/// is `100 - |angle_l - angle_r|`, each floored at 0, then averaged. A
/// shoulder side without an angle drops that component. A degraded
/// snapshot scores the neutral 50.
pub fn symmetry_score(front: &OhsResult) -> u8 {
    if front.is_degraded() {
        return Severity::Unknown.score() as u8;
    }

    let m = &front.metrics;
    let knee_diff = (m.knee_left_dx.abs() - m.knee_right_dx.abs()).abs();
    let mut components = vec![(100.0 - 2.0 * knee_diff).max(0.0)];

    let shoulder_diff = (m.shoulder_left_angle - m.shoulder_right_angle).abs();
    if !shoulder_diff.is_nan() {
        components.push((100.0 - shoulder_diff).max(0.0));
    }

    let mean = components.iter().sum::<f64>() / components.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

fn region_checkpoint(region: BodyRegion, front: &OhsResult, side: &OhsResult) -> CheckpointResult {
    let f = front.flags.get(region);
    let s = side.flags.get(region);
    let score = ((f.score() + s.score()) / 2.0).round() as u8;
    let risk = RiskLevel::from_views(f, s);
    let checkpoint = Checkpoint::from(region);

    let mut dysfunctions = Vec::new();
    if risk == RiskLevel::High {
        dysfunctions.push(catalog::primary_dysfunction(checkpoint).to_string());
    }

    let mut notes = Vec::new();
    for (view, sev) in [(View::Front, f), (View::Side, s)] {
        if sev == Severity::Unknown {
            notes.push(format!("not measurable from the {} view", view));
        }
    }

    CheckpointResult {
        checkpoint,
        score,
        risk,
        dysfunctions,
        notes,
    }
}

pub fn combine_views(
    front: &OhsResult,
    side: &OhsResult,
    created_at: DateTime<Utc>,
    ranges_version: &str,
) -> AssessmentResult {
    let mut checkpoints: Vec<CheckpointResult> = BodyRegion::ALL
        .iter()
        .map(|r| region_checkpoint(*r, front, side))
        .collect();

    let symmetry = symmetry_score(front);
    let symmetry_risk = RiskLevel::from_symmetry(symmetry);
    checkpoints.push(CheckpointResult {
        checkpoint: Checkpoint::Symmetry,
        score: symmetry,
        risk: symmetry_risk,
        dysfunctions: if symmetry_risk == RiskLevel::High {
            vec![catalog::primary_dysfunction(Checkpoint::Symmetry).to_string()]
        } else {
            Vec::new()
        },
        notes: if front.is_degraded() {
            vec!["front view could not be assessed".to_string()]
        } else {
            Vec::new()
        },
    });

    let avg = checkpoints.iter().map(|c| c.score as f64).sum::<f64>() / checkpoints.len() as f64;
    let high_count = checkpoints
        .iter()
        .filter(|c| c.risk == RiskLevel::High)
        .count();

    AssessmentResult {
        athlete_id: None,
        created_at,
        tier: tier_from_scores(avg, high_count),
        symmetry_score: symmetry,
        checkpoints,
        ranges_version: ranges_version.to_string(),
    }
}

/// Holds the latest rep-bottom snapshot per view and produces the report
/// once both exist. Completion happens exactly once; later snapshots are
/// ignored until `reset`.
pub struct AssessmentAggregator {
    front: Option<OhsResult>,
    side: Option<OhsResult>,
    result: Option<AssessmentResult>,
    ranges_version: String,
    athlete_id: Option<String>,
}

impl Default for AssessmentAggregator {
    fn default() -> Self {
        Self::new(ScoringRanges::default().version)
    }
}

impl AssessmentAggregator {
    pub fn new(ranges_version: impl Into<String>) -> Self {
        Self {
            front: None,
            side: None,
            result: None,
            ranges_version: ranges_version.into(),
            athlete_id: None,
        }
    }

    pub fn with_athlete(mut self, athlete_id: impl Into<String>) -> Self {
        self.athlete_id = Some(athlete_id.into());
        self
    }

    pub fn snapshot(&self, view: View) -> Option<&OhsResult> {
        match view {
            View::Front => self.front.as_ref(),
            View::Side => self.side.as_ref(),
        }
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn reset(&mut self) {
        self.front = None;
        self.side = None;
        self.result = None;
    }

    /// Store a snapshot for `view`. Returns the report on the call that
    /// completes the assessment, `None` otherwise.
    pub fn record(&mut self, view: View, snapshot: OhsResult) -> Option<AssessmentResult> {
        self.record_at(view, snapshot, Utc::now())
    }

    pub fn record_at(
        &mut self,
        view: View,
        snapshot: OhsResult,
        created_at: DateTime<Utc>,
    ) -> Option<AssessmentResult> {
        if self.result.is_some() {
            debug!(%view, "assessment already complete, snapshot ignored");
            return None;
        }

        match view {
            View::Front => self.front = Some(snapshot),
            View::Side => self.side = Some(snapshot),
        }

        let (front, side) = match (&self.front, &self.side) {
            (Some(f), Some(s)) => (f, s),
            _ => {
                debug!(%view, "snapshot stored, waiting for the other view");
                return None;
            }
        };

        let mut result = combine_views(front, side, created_at, &self.ranges_version);
        result.athlete_id = self.athlete_id.clone();
        info!(
            tier = %result.tier,
            symmetry = result.symmetry_score,
            high = result.high_count(),
            "assessment complete"
        );
        self.result = Some(result.clone());
        Some(result)
    }
}
