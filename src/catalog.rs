// src/catalog.rs - Static dysfunction tags and corrective prescriptions
use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::assessment::Checkpoint;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DysfunctionTag {
    pub id: &'static str,
    pub label: &'static str,
    pub checkpoint: Checkpoint,
    /// One sentence on why it matters
    pub reason: &'static str,
}

/// Exercise ids for one dysfunction: three strength, two stretch, two
/// foam-roll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prescription {
    pub checkpoint: Checkpoint,
    pub dysfunction_id: &'static str,
    pub strength: [&'static str; 3],
    pub stretch: [&'static str; 2],
    pub foam_roll: [&'static str; 2],
}

const fn tag(
    id: &'static str,
    label: &'static str,
    checkpoint: Checkpoint,
    reason: &'static str,
) -> DysfunctionTag {
    DysfunctionTag {
        id,
        label,
        checkpoint,
        reason,
    }
}

static TAGS: [DysfunctionTag; 13] = [
    tag(
        "feet_turn_out",
        "Feet Turn Out",
        Checkpoint::Ankle,
        "External foot flare often reflects tight calves/TFL and weak anterior tib, reducing stable force transfer.",
    ),
    tag(
        "excessive_pronation",
        "Ankle Pronation",
        Checkpoint::Ankle,
        "Excessive rolling in stresses the arch/Achilles and alters knee tracking, raising shin and knee injury risk.",
    ),
    tag(
        "limited_dorsiflexion",
        "Limited Dorsiflexion",
        Checkpoint::Ankle,
        "Restricted ankle bend forces compensations up the chain, reducing squat depth and power absorption.",
    ),
    tag(
        "knee_valgus",
        "Knee Valgus",
        Checkpoint::Knee,
        "Knees collapsing inward increases ACL/MCL strain and reduces efficient cutting/jumping power.",
    ),
    tag(
        "knee_varus",
        "Knee Varus",
        Checkpoint::Knee,
        "Knees bowing out shifts load laterally and can irritate ITB/hip, reducing stable knee mechanics.",
    ),
    tag(
        "excessive_hip_internal_rotation",
        "Hip IR Dominance",
        Checkpoint::Hip,
        "Over-rotating inward at the hip compromises frontal-plane control and increases lumbar/patellofemoral stress.",
    ),
    tag(
        "anterior_pelvic_tilt",
        "Anterior Pelvic Tilt",
        Checkpoint::Hip,
        "Excessive tilt shortens hip flexors and extends lumbar spine, elevating low-back strain and inhibiting glutes.",
    ),
    tag(
        "excessive_forward_lean",
        "Excessive Forward Lean",
        Checkpoint::Trunk,
        "Forward torso angle shifts demand to low back and hips, reducing stacked posture for power and endurance.",
    ),
    tag(
        "low_back_arch",
        "Lumbar Extension (Arch)",
        Checkpoint::Trunk,
        "Over-extension jams facet joints and diminishes core bracing, risking low-back irritation.",
    ),
    tag(
        "low_back_round",
        "Lumbar Flexion (Round)",
        Checkpoint::Trunk,
        "Spinal flexion under load stresses discs and reduces efficient hip drive.",
    ),
    tag(
        "arms_fall_forward",
        "Arms Fall Forward",
        Checkpoint::Shoulder,
        "Tight lats/pecs and weak lower traps cause scapular dyskinesis, hurting overhead mobility and paddle speed.",
    ),
    tag(
        "scapular_winging",
        "Scapular Winging",
        Checkpoint::Shoulder,
        "Poor scap control destabilizes the shoulder complex and raises impingement risk.",
    ),
    tag(
        "asym_weight_shift",
        "Asymmetric Weight Shift",
        Checkpoint::Symmetry,
        "Favoring one side builds strength imbalances and increases overuse risk on the dominant limb.",
    ),
];

const fn rx(
    checkpoint: Checkpoint,
    dysfunction_id: &'static str,
    strength: [&'static str; 3],
    stretch: [&'static str; 2],
    foam_roll: [&'static str; 2],
) -> Prescription {
    Prescription {
        checkpoint,
        dysfunction_id,
        strength,
        stretch,
        foam_roll,
    }
}

static PRESCRIPTIONS: [Prescription; 13] = [
    rx(Checkpoint::Ankle, "feet_turn_out",
        ["wall_tib_raises", "clam_shells", "lateral_band_walk"],
        ["gastroc_stretch", "soleus_stretch_knee_bent"],
        ["smr_calf", "smr_tfl"]),
    rx(Checkpoint::Ankle, "excessive_pronation",
        ["wall_tib_raises", "single_leg_rdl_reach", "hip_airplane"],
        ["tfl_stretch", "gastroc_stretch"],
        ["smr_tfl", "smr_adductors"]),
    rx(Checkpoint::Ankle, "limited_dorsiflexion",
        ["wall_tib_raises", "glute_bridge_iso", "single_leg_rdl_reach"],
        ["soleus_stretch_knee_bent", "gastroc_stretch"],
        ["smr_calf", "smr_tfl"]),
    rx(Checkpoint::Knee, "knee_valgus",
        ["clam_shells", "lateral_band_walk", "hip_airplane"],
        ["tfl_stretch", "gastroc_stretch"],
        ["smr_tfl", "smr_adductors"]),
    rx(Checkpoint::Knee, "knee_varus",
        ["wall_tib_raises", "single_leg_rdl_reach", "dead_bug_press"],
        ["gastroc_stretch", "soleus_stretch_knee_bent"],
        ["smr_calf", "smr_lats"]),
    rx(Checkpoint::Hip, "excessive_hip_internal_rotation",
        ["hip_airplane", "single_leg_rdl_reach", "clam_shells"],
        ["tfl_stretch", "hip_flexor_half_kneel_pnf"],
        ["smr_tfl", "smr_adductors"]),
    rx(Checkpoint::Hip, "anterior_pelvic_tilt",
        ["glute_bridge_iso", "dead_bug_press", "anti_extension_plank_walkout"],
        ["hip_flexor_half_kneel_pnf", "lat_doorway_stretch"],
        ["smr_lats", "smr_tfl"]),
    rx(Checkpoint::Trunk, "excessive_forward_lean",
        ["dead_bug_press", "anti_extension_plank_walkout", "glute_bridge_iso"],
        ["hip_flexor_half_kneel_pnf", "lat_doorway_stretch"],
        ["smr_lats", "smr_tfl"]),
    rx(Checkpoint::Trunk, "low_back_arch",
        ["dead_bug_press", "glute_bridge_iso", "anti_extension_plank_walkout"],
        ["hip_flexor_half_kneel_pnf", "lat_doorway_stretch"],
        ["smr_lats", "smr_tfl"]),
    rx(Checkpoint::Trunk, "low_back_round",
        ["glute_bridge_iso", "single_leg_rdl_reach", "prone_y_t_w"],
        ["lat_doorway_stretch", "hip_flexor_half_kneel_pnf"],
        ["smr_lats", "smr_adductors"]),
    rx(Checkpoint::Shoulder, "arms_fall_forward",
        ["prone_y_t_w", "face_pull_band", "dead_bug_press"],
        ["lat_doorway_stretch", "tfl_stretch"],
        ["smr_lats", "smr_tfl"]),
    rx(Checkpoint::Shoulder, "scapular_winging",
        ["face_pull_band", "prone_y_t_w", "anti_extension_plank_walkout"],
        ["lat_doorway_stretch", "hip_flexor_half_kneel_pnf"],
        ["smr_lats", "smr_tfl"]),
    rx(Checkpoint::Symmetry, "asym_weight_shift",
        ["single_leg_rdl_reach", "hip_airplane", "clam_shells"],
        ["tfl_stretch", "gastroc_stretch"],
        ["smr_tfl", "smr_adductors"]),
];

static TAG_INDEX: Lazy<HashMap<&'static str, &'static DysfunctionTag>> =
    Lazy::new(|| TAGS.iter().map(|t| (t.id, t)).collect());

static PRESCRIPTION_INDEX: Lazy<HashMap<&'static str, &'static Prescription>> =
    Lazy::new(|| PRESCRIPTIONS.iter().map(|p| (p.dysfunction_id, p)).collect());

pub fn dysfunction(id: &str) -> Option<&'static DysfunctionTag> {
    TAG_INDEX.get(id).copied()
}

pub fn prescription(id: &str) -> Option<&'static Prescription> {
    PRESCRIPTION_INDEX.get(id).copied()
}

pub fn dysfunctions_for(checkpoint: Checkpoint) -> impl Iterator<Item = &'static DysfunctionTag> {
    TAGS.iter().filter(move |t| t.checkpoint == checkpoint)
}

/// The tag attached when a checkpoint is rated high risk.
pub fn primary_dysfunction(checkpoint: Checkpoint) -> &'static str {
    match checkpoint {
        Checkpoint::Ankle => "excessive_pronation",
        Checkpoint::Knee => "knee_valgus",
        Checkpoint::Hip => "anterior_pelvic_tilt",
        Checkpoint::Trunk => "excessive_forward_lean",
        Checkpoint::Shoulder => "arms_fall_forward",
        Checkpoint::Symmetry => "asym_weight_shift",
    }
}
