// src/bin/synthetic_squat.rs - Runs a generated front + side session through the pipeline
use ohs_tracker::joint_angles::{assess_angles, AngleStatus};
use ohs_tracker::synthetic::{SquatParams, SyntheticSquat};
use ohs_tracker::{AssessConfig, AssessmentSession, View};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("Synthetic overhead squat session\n");

    let front = SquatParams {
        knee_drift_px: 16.0,
        jitter_px: 1.5,
        ..SquatParams::default()
    };
    let side = SquatParams {
        trunk_lean_deg: 24.0,
        arm_drop_deg: 20.0,
        jitter_px: 1.5,
        ..SquatParams::default()
    };

    let mut session = AssessmentSession::new(AssessConfig::default(), View::Front)?;
    let mut t0 = 0.0;

    for (view, params) in [(View::Front, front), (View::Side, side)] {
        if session.view() != view {
            session.switch_view(view);
        }
        let gen = SyntheticSquat::new(params);
        let mut last_t = t0;
        for frame in gen.frames(3) {
            last_t = t0 + frame.t;
            let out = session.tick(last_t, &frame.keypoints);
            if let Some(rep) = out.rep {
                let f = &rep.ohs.flags;
                println!(
                    "✓ rep {} [{}] ankle={:?} knee={:?} hip={:?} trunk={:?} shoulder={:?}",
                    rep.rep, rep.view, f.ankle, f.knee, f.hip, f.trunk, f.shoulder
                );
                for a in assess_angles(&rep.angles, &session.config().angles) {
                    if a.status != AngleStatus::Optimal {
                        println!("    {:?}: {}", a.joint, a.message);
                    }
                }
            }
        }
        t0 = last_t + 1000.0;
    }

    match session.result() {
        Some(result) => {
            println!("\nTier: {}  Symmetry: {}", result.tier, result.symmetry_score);
            for cp in &result.checkpoints {
                println!(
                    "  {:?}: {} ({:?}) {:?}",
                    cp.checkpoint, cp.score, cp.risk, cp.dysfunctions
                );
            }
        }
        None => println!("\n✗ No assessment produced"),
    }
    Ok(())
}
