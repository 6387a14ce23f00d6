// src/data.rs - Session export: per-rep CSV, assessment JSON, HTML summary
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::assessment::{build_prescriptions, AssessmentResult, Checkpoint};
use crate::catalog::{self, Prescription};
use crate::scoring::Severity;
use crate::session::RepSnapshot;

#[derive(Debug, Serialize)]
struct RepRecord {
    rep: usize,
    view: String,
    t: f64,
    ankle: Severity,
    knee: Severity,
    hip: Severity,
    trunk: Severity,
    shoulder: Severity,
    shoulder_width: f64,
    knee_left_dx: f64,
    knee_right_dx: f64,
    trunk_angle_from_vertical: f64,
    lateral_shift_px: f64,
    shoulder_left_angle: Option<f64>,
    shoulder_right_angle: Option<f64>,
    knee_angle: Option<f64>,
    hip_angle: Option<f64>,
    spine_angle: Option<f64>,
}

impl From<&RepSnapshot> for RepRecord {
    fn from(s: &RepSnapshot) -> Self {
        let m = &s.ohs.metrics;
        let finite = |v: f64| if v.is_finite() { Some(v) } else { None };
        Self {
            rep: s.rep,
            view: s.view.to_string(),
            t: s.t,
            ankle: s.ohs.flags.ankle,
            knee: s.ohs.flags.knee,
            hip: s.ohs.flags.hip,
            trunk: s.ohs.flags.trunk,
            shoulder: s.ohs.flags.shoulder,
            shoulder_width: m.shoulder_width,
            knee_left_dx: m.knee_left_dx,
            knee_right_dx: m.knee_right_dx,
            trunk_angle_from_vertical: m.trunk_angle_from_vertical,
            lateral_shift_px: m.lateral_shift_px,
            shoulder_left_angle: finite(m.shoulder_left_angle),
            shoulder_right_angle: finite(m.shoulder_right_angle),
            knee_angle: s.angles.knee,
            hip_angle: s.angles.hip,
            spine_angle: s.angles.spine,
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Serialize)]
struct AssessmentExport<'a> {
    result: &'a AssessmentResult,
    prescriptions: std::collections::BTreeMap<Checkpoint, Vec<&'static Prescription>>,
}

/// `~/Documents/OHS Tracker`, or a fresh directory under the system temp
/// dir when there is no documents folder.
pub fn default_output_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("OHS Tracker")))
        .unwrap_or_else(|| {
            std::env::temp_dir().join(format!("ohs_tracker_{}", uuid::Uuid::new_v4()))
        })
}

pub struct DataExporter {
    output_dir: PathBuf,
    session_name: String,
    reps: Vec<RepSnapshot>,
}

impl DataExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            reps: Vec::new(),
        }
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_rep(&mut self, snapshot: RepSnapshot) {
        self.reps.push(snapshot);
    }

    pub fn rep_count(&self) -> usize {
        self.reps.len()
    }

    fn create_session_dir(&self) -> Result<PathBuf> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
        Ok(dir)
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.create_session_dir()?.join("reps.csv");
        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for snapshot in &self.reps {
            writer.serialize(RepRecord::from(snapshot))?;
        }

        writer.flush()?;
        info!(path = %csv_path.display(), reps = self.reps.len(), "rep data exported");
        Ok(csv_path)
    }

    /// Final result plus the prescriptions for every attached dysfunction.
    pub fn export_assessment(&self, result: &AssessmentResult) -> Result<PathBuf> {
        let json_path = self.create_session_dir()?.join("assessment.json");
        let export = AssessmentExport {
            result,
            prescriptions: build_prescriptions(result),
        };
        let file = File::create(&json_path)?;
        serde_json::to_writer_pretty(file, &export)?;
        info!(path = %json_path.display(), tier = %result.tier, "assessment exported");
        Ok(json_path)
    }

    pub fn generate_report(&self, result: &AssessmentResult) -> Result<PathBuf> {
        let report_path = self.create_session_dir()?.join("report.html");
        std::fs::write(&report_path, self.create_html_report(result))?;
        Ok(report_path)
    }

    fn create_html_report(&self, result: &AssessmentResult) -> String {
        let mut rows = String::new();
        for cp in &result.checkpoints {
            let labels: Vec<&str> = cp
                .dysfunctions
                .iter()
                .map(|id| catalog::dysfunction(id).map_or(id.as_str(), |t| t.label))
                .collect();
            rows.push_str(&format!(
                "        <tr><td>{:?}</td><td>{}</td><td>{:?}</td><td>{}</td></tr>\n",
                cp.checkpoint,
                cp.score,
                cp.risk,
                labels.join(", ")
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Overhead Squat Assessment - {session}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
        td, th {{ padding: 4px 12px; text-align: left; }}
    </style>
</head>
<body>
    <h1>Overhead Squat Assessment</h1>
    <div class="stats">
        <h2>Session: {session}</h2>
        <p><span class="stat-label">Tier:</span> <span class="stat-value">{tier}</span></p>
        <p><span class="stat-label">Symmetry:</span> <span class="stat-value">{symmetry}</span></p>
        <p><span class="stat-label">Reps recorded:</span> <span class="stat-value">{reps}</span></p>
        <p><span class="stat-label">Thresholds:</span> {version}</p>
        <table>
        <tr><th>Checkpoint</th><th>Score</th><th>Risk</th><th>Dysfunctions</th></tr>
{rows}        </table>
    </div>
</body>
</html>
"#,
            session = escape_html(&self.session_name),
            tier = result.tier,
            symmetry = result.symmetry_score,
            reps = self.reps.len(),
            version = escape_html(&result.ranges_version),
            rows = rows,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{combine_views, View};
    use crate::joint_angles::JointAngles;
    use crate::scoring::{OhsFlags, OhsResult};
    use chrono::Utc;
    use tempfile::tempdir;

    fn snapshot(rep: usize, view: View) -> RepSnapshot {
        let mut ohs = OhsResult::unknown();
        ohs.flags = OhsFlags::uniform(Severity::Low);
        ohs.flags.knee = Severity::High;
        ohs.metrics.shoulder_width = 100.0;
        ohs.metrics.knee_left_dx = 22.0;
        ohs.metrics.shoulder_left_angle = f64::NAN;
        RepSnapshot {
            rep,
            view,
            t: rep as f64 * 4000.0,
            ohs,
            angles: JointAngles {
                knee: Some(95.5),
                ..JointAngles::default()
            },
        }
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let mut exporter = DataExporter::new(dir.path(), Some("s1".to_string()));
        exporter.add_rep(snapshot(1, View::Front));
        exporter.add_rep(snapshot(2, View::Side));

        let path = exporter.export_csv().unwrap();
        assert_eq!(path, dir.path().join("s1").join("reps.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "rep");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "side");
        assert_eq!(&rows[0][4], "High");
        // NaN angle exported as an empty cell
        let col = headers.iter().position(|h| h == "shoulder_left_angle").unwrap();
        assert_eq!(&rows[0][col], "");
    }

    #[test]
    fn test_export_assessment_json() {
        let dir = tempdir().unwrap();
        let exporter = DataExporter::new(dir.path(), Some("s2".to_string()));
        let front = snapshot(1, View::Front).ohs;
        let side = snapshot(2, View::Side).ohs;
        let result = combine_views(&front, &side, Utc::now(), "ohs-2024.1");

        let path = exporter.export_assessment(&result).unwrap();
        let json: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(json["result"]["checkpoints"][1]["risk"], "HIGH");
        assert_eq!(
            json["prescriptions"]["KNEE"][0]["dysfunction_id"],
            "knee_valgus"
        );
        assert_eq!(json["prescriptions"]["HIP"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_report_lists_labels() {
        let dir = tempdir().unwrap();
        let exporter = DataExporter::new(dir.path(), Some("s3".to_string()));
        let ohs = snapshot(1, View::Front).ohs;
        let result = combine_views(&ohs, &ohs, Utc::now(), "v");
        let path = exporter.generate_report(&result).unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("Knee Valgus"));
        assert!(html.contains("Session: s3"));
    }

    #[test]
    fn test_report_escapes_session_name() {
        let dir = tempdir().unwrap();
        let exporter = DataExporter::new(dir.path(), Some("a<b>&\"c\"".to_string()));
        let ohs = snapshot(1, View::Front).ohs;
        let result = combine_views(&ohs, &ohs, Utc::now(), "v");
        let path = exporter.generate_report(&result).unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("Session: a&lt;b&gt;&amp;&quot;c&quot;</h2>"));
        assert!(!html.contains("a<b>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain_name-1"), "plain_name-1");
        assert_eq!(escape_html("<x y='1'>"), "&lt;x y=&#39;1&#39;&gt;");
    }

    #[test]
    fn test_default_session_name() {
        let exporter = DataExporter::new("/tmp", None);
        let name = exporter.session_dir();
        let name = name.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("session_"));
    }
}
