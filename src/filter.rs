// src/filter.rs - Caelin filter: per-joint EMA smoothing that bridges short dropouts
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConfigError;
use crate::keypoint::Keypoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub alpha_pos: f64,
    pub alpha_score: f64,
    /// Detections below this score do not move a track.
    pub min_score_consider: f64,
    /// Per-frame score decay while a joint is missing.
    pub fade_on_miss: f64,
    /// A track survives up to this many consecutive misses.
    pub max_keep_miss: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            alpha_pos: 0.6,
            alpha_score: 0.5,
            min_score_consider: 0.3,
            fade_on_miss: 0.92,
            max_keep_miss: 6,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha_pos > 0.0 && self.alpha_pos <= 1.0) {
            return Err(ConfigError::invalid(format!(
                "filter.alpha_pos must be in (0, 1], got {}",
                self.alpha_pos
            )));
        }
        if !(self.alpha_score > 0.0 && self.alpha_score <= 1.0) {
            return Err(ConfigError::invalid(format!(
                "filter.alpha_score must be in (0, 1], got {}",
                self.alpha_score
            )));
        }
        if !(self.fade_on_miss > 0.0 && self.fade_on_miss < 1.0) {
            return Err(ConfigError::invalid(format!(
                "filter.fade_on_miss must be in (0, 1), got {}",
                self.fade_on_miss
            )));
        }
        if !(0.0..=1.0).contains(&self.min_score_consider) {
            return Err(ConfigError::invalid(format!(
                "filter.min_score_consider must be in [0, 1], got {}",
                self.min_score_consider
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Track {
    x: f64,
    y: f64,
    score: f64,
    miss: u32,
}

pub struct CaelinFilter {
    tracks: BTreeMap<String, Track>,
    config: FilterConfig,
}

impl CaelinFilter {
    pub fn new(config: FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracks: BTreeMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Fold one frame of detections into the tracks and return every
    /// surviving track, whether or not it was detected this frame.
    pub fn apply(&mut self, detections: &[Keypoint]) -> Vec<Keypoint> {
        let cfg = &self.config;
        let mut seen: HashSet<&str> = HashSet::new();

        for kp in detections {
            // Unnamed joints are not tracked; repeated names keep the first
            if kp.name.is_empty() || !seen.insert(kp.name.as_str()) {
                continue;
            }

            let s = kp.confidence();
            match self.tracks.get_mut(&kp.name) {
                Some(track) if s >= cfg.min_score_consider => {
                    let a = cfg.alpha_pos;
                    track.x = a * kp.x + (1.0 - a) * track.x;
                    track.y = a * kp.y + (1.0 - a) * track.y;
                    track.score = cfg.alpha_score * s + (1.0 - cfg.alpha_score) * track.score;
                    track.miss = 0;
                }
                Some(track) => {
                    // Low confidence: hold position, fade score
                    track.score *= cfg.fade_on_miss;
                    track.miss += 1;
                }
                None if s >= cfg.min_score_consider => {
                    trace!(joint = %kp.name, "track created");
                    self.tracks.insert(
                        kp.name.clone(),
                        Track {
                            x: kp.x,
                            y: kp.y,
                            score: s,
                            miss: 0,
                        },
                    );
                }
                None => {}
            }
        }

        for (name, track) in self.tracks.iter_mut() {
            if !seen.contains(name.as_str()) {
                track.score *= cfg.fade_on_miss;
                track.miss += 1;
            }
        }

        let max_keep_miss = cfg.max_keep_miss;
        self.tracks.retain(|name, track| {
            let keep = track.miss <= max_keep_miss;
            if !keep {
                trace!(joint = %name, miss = track.miss, "track pruned");
            }
            keep
        });

        self.tracks
            .iter()
            .map(|(name, track)| Keypoint {
                name: name.clone(),
                x: track.x,
                y: track.y,
                score: Some(track.score),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoint::find;
    use approx::assert_abs_diff_eq;

    fn filter() -> CaelinFilter {
        CaelinFilter::new(FilterConfig::default()).unwrap()
    }

    #[test]
    fn test_first_sighting_is_unsmoothed() {
        let mut f = filter();
        let out = f.apply(&[Keypoint::new("left_knee", 120.0, 340.0, 0.8)]);
        assert_eq!(out, vec![Keypoint::new("left_knee", 120.0, 340.0, 0.8)]);
    }

    #[test]
    fn test_ema_blend() {
        let mut f = filter();
        f.apply(&[Keypoint::new("left_knee", 0.0, 0.0, 1.0)]);
        let out = f.apply(&[Keypoint::new("left_knee", 10.0, 20.0, 0.5)]);
        let k = find(&out, "left_knee").unwrap();
        assert_abs_diff_eq!(k.x, 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(k.y, 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(k.score.unwrap(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_converges_on_constant_input() {
        let mut f = filter();
        f.apply(&[Keypoint::new("nose", 0.0, 0.0, 0.4)]);
        let mut out = Vec::new();
        for _ in 0..80 {
            out = f.apply(&[Keypoint::new("nose", 50.0, -25.0, 0.9)]);
        }
        let k = find(&out, "nose").unwrap();
        assert_abs_diff_eq!(k.x, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(k.y, -25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(k.score.unwrap(), 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_low_confidence_holds_position_and_fades() {
        let mut f = filter();
        f.apply(&[Keypoint::new("left_hip", 10.0, 10.0, 1.0)]);
        let out = f.apply(&[Keypoint::new("left_hip", 90.0, 90.0, 0.1)]);
        let k = find(&out, "left_hip").unwrap();
        assert_eq!((k.x, k.y), (10.0, 10.0));
        assert_abs_diff_eq!(k.score.unwrap(), 0.92, epsilon = 1e-12);
    }

    #[test]
    fn test_low_confidence_never_creates_track() {
        let mut f = filter();
        assert!(f.apply(&[Keypoint::new("left_hip", 1.0, 1.0, 0.29)]).is_empty());
    }

    #[test]
    fn test_dropout_bridged_then_pruned() {
        let cfg = FilterConfig {
            max_keep_miss: 2,
            ..FilterConfig::default()
        };
        let mut f = CaelinFilter::new(cfg).unwrap();
        f.apply(&[Keypoint::new("left_wrist", 5.0, 5.0, 1.0)]);

        // Misses 1 and 2 are bridged
        assert_eq!(f.apply(&[]).len(), 1);
        let out = f.apply(&[]);
        assert_abs_diff_eq!(out[0].score.unwrap(), 0.92 * 0.92, epsilon = 1e-12);

        // Miss 3 exceeds the cap
        assert!(f.apply(&[]).is_empty());
        assert!(f.apply(&[]).is_empty());
    }

    #[test]
    fn test_accepted_update_resets_miss() {
        let cfg = FilterConfig {
            max_keep_miss: 1,
            ..FilterConfig::default()
        };
        let mut f = CaelinFilter::new(cfg).unwrap();
        let kp = Keypoint::new("right_ankle", 0.0, 0.0, 1.0);
        for _ in 0..5 {
            f.apply(&[kp.clone()]);
            assert_eq!(f.apply(&[]).len(), 1);
        }
    }

    #[test]
    fn test_unnamed_and_duplicate_detections() {
        let mut f = filter();
        let out = f.apply(&[
            Keypoint::new("", 1.0, 1.0, 1.0),
            Keypoint::new("nose", 2.0, 2.0, 1.0),
            Keypoint::new("nose", 100.0, 100.0, 1.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].x, 2.0);
    }

    #[test]
    fn test_reset_clears_tracks() {
        let mut f = filter();
        f.apply(&[Keypoint::new("nose", 2.0, 2.0, 1.0)]);
        f.reset();
        assert_eq!(f.track_count(), 0);
        assert!(f.apply(&[]).is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = [
            FilterConfig { alpha_pos: 0.0, ..FilterConfig::default() },
            FilterConfig { alpha_score: 1.5, ..FilterConfig::default() },
            FilterConfig { fade_on_miss: 1.0, ..FilterConfig::default() },
            FilterConfig { min_score_consider: -0.1, ..FilterConfig::default() },
        ];
        for cfg in bad {
            assert!(matches!(
                CaelinFilter::new(cfg),
                Err(ConfigError::InvalidConfiguration(_))
            ));
        }
    }
}
