// src/main.rs
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::warn;

use ohs_tracker::data::{default_output_dir, DataExporter};
use ohs_tracker::{AssessConfig, AssessmentSession, Keypoint, View};

/// Replay a recorded session of pose detections through the assessment pipeline.
#[derive(Parser)]
#[command(name = "ohs_tracker")]
struct Cli {
    /// JSON-lines recording, one `{t, view, keypoints}` frame per line
    input: PathBuf,
    /// TOML file overriding the built-in thresholds
    #[arg(long)]
    config: Option<PathBuf>,
    /// Export directory; defaults to Documents/OHS Tracker
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Deserialize)]
struct FrameLine {
    t: f64,
    view: View,
    #[serde(default)]
    keypoints: Vec<Keypoint>,
}

fn read_frames(path: &Path) -> Result<Vec<FrameLine>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut frames = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: FrameLine = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: bad frame record", path.display(), i + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let config = match &args.config {
        Some(path) => AssessConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AssessConfig::default(),
    };

    let frames = read_frames(&args.input)?;
    let Some(first) = frames.first() else {
        bail!("{} contains no frames", args.input.display());
    };

    let mut session = AssessmentSession::new(config, first.view)?;
    let mut exporter = DataExporter::new(args.out.unwrap_or_else(default_output_dir), None);

    for frame in &frames {
        if frame.view != session.view() {
            session.switch_view(frame.view);
        }
        let out = session.tick(frame.t, &frame.keypoints);
        if let Some(rep) = out.rep {
            println!(
                "rep {:>2} [{}] t={:.0}  ankle={:?} knee={:?} hip={:?} trunk={:?} shoulder={:?}",
                rep.rep,
                rep.view,
                rep.t,
                rep.ohs.flags.ankle,
                rep.ohs.flags.knee,
                rep.ohs.flags.hip,
                rep.ohs.flags.trunk,
                rep.ohs.flags.shoulder,
            );
            exporter.add_rep(rep);
        }
    }

    let csv_path = exporter.export_csv()?;
    println!("\nReps: {} -> {}", exporter.rep_count(), csv_path.display());

    match session.result() {
        Some(result) => {
            println!("Tier: {}  Symmetry: {}", result.tier, result.symmetry_score);
            for cp in &result.checkpoints {
                println!(
                    "  {:<9} {:>3}  {:<6}  {}",
                    format!("{:?}", cp.checkpoint),
                    cp.score,
                    format!("{:?}", cp.risk),
                    cp.dysfunctions.join(", ")
                );
            }
            if let Some(first) = result.highest_risk() {
                println!("Review first: {:?}", first.checkpoint);
            }
            let json_path = exporter.export_assessment(result)?;
            let report_path = exporter.generate_report(result)?;
            println!("Assessment -> {}\nReport -> {}", json_path.display(), report_path.display());
        }
        None => {
            warn!("assessment incomplete: a rep from both the front and side views is required");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "ohs_tracker",
            "run.jsonl",
            "--config",
            "ohs.toml",
            "--out",
            "exports",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("run.jsonl"));
        assert_eq!(cli.config, Some(PathBuf::from("ohs.toml")));
        assert_eq!(cli.out, Some(PathBuf::from("exports")));

        let cli = Cli::try_parse_from(["ohs_tracker", "run.jsonl"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.out.is_none());
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        assert!(Cli::try_parse_from(["ohs_tracker"]).is_err());
        assert!(Cli::try_parse_from(["ohs_tracker", "run.jsonl", "--frobnicate"]).is_err());
        assert!(Cli::try_parse_from(["ohs_tracker", "run.jsonl", "--config"]).is_err());
    }

    #[test]
    fn test_read_frames_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"t": 0.0, "view": "front", "keypoints": []}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"t": 33.0, "view": "side"}}"#).unwrap();

        let frames = read_frames(file.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].view, View::Side);
        assert!(frames[1].keypoints.is_empty());
    }
}
