// src/strategies.rs - Corrective strategies per body region and severity
use crate::scoring::{BodyRegion, Severity};

/// Ordered corrective strategies. Low and Unknown never carry any.
pub fn strategies_for(region: BodyRegion, severity: Severity) -> &'static [&'static str] {
    use BodyRegion::*;
    use Severity::*;

    match (region, severity) {
        (_, Low) | (_, Unknown) => &[],

        (Ankle, Medium) => &[
            "Calf SMR with lacrosse ball",
            "Ankle mobility drill: wall ankle slides",
            "Balance reach exercises",
            "Band ankle mobilization",
        ],
        (Ankle, High) => &[
            "Deep tissue calf massage",
            "Ankle dorsiflexion stretches",
            "Mobility work: ankle circles and alphabet",
            "Progressive ankle strengthening",
            "Consider orthotic consultation",
        ],

        (Knee, Medium) => &[
            "Glute medius activation drills",
            "Single-leg balance work",
            "Lateral tube walks",
            "Hip abduction exercises",
        ],
        (Knee, High) => &[
            "Immediate form correction focus",
            "Glute medius and hip stabilizer work",
            "Lateral movement training",
            "Single-leg strength development",
            "Consider physical therapy assessment",
        ],

        (Hip, Medium) => &[
            "Hip flexor stretching",
            "Core activation drills",
            "Wall slides practice",
            "TVA bracing exercises",
        ],
        (Hip, High) => &[
            "Comprehensive hip mobility work",
            "Core stability training",
            "Posterior chain strengthening",
            "Movement pattern retraining",
            "Professional movement assessment",
        ],

        (Trunk, Medium) => &[
            "Wall slides practice",
            "TVA bracing exercises",
            "Dead bug variations",
            "Bird dog exercises",
        ],
        (Trunk, High) => &[
            "Core stability foundation work",
            "Anti-rotation training",
            "Breathing pattern work",
            "Postural awareness training",
            "Consider professional assessment",
        ],

        (Shoulder, Medium) => &[
            "Latissimus dorsi stretching",
            "Thoracic spine mobility",
            "Shoulder blade retraction",
            "Overhead carry drills",
        ],
        (Shoulder, High) => &[
            "Comprehensive shoulder mobility work",
            "Lat and chest stretching",
            "Thoracic extension exercises",
            "Scapular stability training",
            "Professional shoulder assessment",
        ],
    }
}

pub fn recommendations(region: BodyRegion, severity: Severity) -> Vec<String> {
    strategies_for(region, severity)
        .iter()
        .map(|s| s.to_string())
        .collect()
}
