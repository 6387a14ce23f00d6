// src/lib.rs - Overhead squat assessment from 2D pose keypoints
pub mod angles;
pub mod assessment;
pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod estimator;
pub mod filter;
pub mod joint_angles;
pub mod keypoint;
pub mod rep;
pub mod scoring;
pub mod session;
pub mod strategies;
pub mod synthetic;

pub use assessment::{AssessmentAggregator, AssessmentResult, Checkpoint, RiskLevel, Tier, View};
pub use config::AssessConfig;
pub use error::{ConfigError, GeometryError};
pub use estimator::{PoseEstimator, ReplayEstimator};
pub use filter::{CaelinFilter, FilterConfig};
pub use joint_angles::{calculate_joint_angles, JointAngles};
pub use keypoint::Keypoint;
pub use rep::{RepConfig, RepDetector, RepEvent, RepPhase};
pub use scoring::{compute_ohs, OhsResult, ScoringRanges, Severity};
pub use session::{AssessmentSession, RepSnapshot, TickOutput};
