// src/rep.rs - Rep boundary detection on the hip-midpoint vertical signal
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepPhase {
    Idle,
    Descending,
    Bottom,
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepEvent {
    Bottom { t: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepConfig {
    pub window: usize,
    /// Smallest descent, in pixels, that counts as a rep.
    pub min_depth_px: f64,
    pub eps: f64,
    /// Minimum time between two bottom events, in caller time units.
    pub event_cooldown: f64,
}

impl Default for RepConfig {
    fn default() -> Self {
        Self {
            window: 6,
            min_depth_px: 40.0,
            eps: 0.25,
            event_cooldown: 1000.0,
        }
    }
}

impl RepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::invalid(format!(
                "rep.window must be at least 2, got {}",
                self.window
            )));
        }
        if !(self.min_depth_px >= 0.0 && self.min_depth_px.is_finite()) {
            return Err(ConfigError::invalid("rep.min_depth_px must be finite and >= 0"));
        }
        if !(self.eps >= 0.0 && self.eps.is_finite()) {
            return Err(ConfigError::invalid("rep.eps must be finite and >= 0"));
        }
        if !(self.event_cooldown >= 0.0 && self.event_cooldown.is_finite()) {
            return Err(ConfigError::invalid("rep.event_cooldown must be finite and >= 0"));
        }
        Ok(())
    }
}

pub struct RepDetector {
    config: RepConfig,
    buffer: VecDeque<f64>,
    phase: RepPhase,
    peak_y: Option<f64>,
    last_event_t: Option<f64>,
}

impl RepDetector {
    pub fn new(config: RepConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            buffer: VecDeque::with_capacity(config.window),
            config,
            phase: RepPhase::Idle,
            peak_y: None,
            last_event_t: None,
        })
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn peak_y(&self) -> Option<f64> {
        self.peak_y
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.phase = RepPhase::Idle;
        self.peak_y = None;
        self.last_event_t = None;
    }

    /// Feed one sample. `t` must not decrease between calls.
    ///
    /// Image y grows downward, so descending means the signal increases.
    pub fn update(&mut self, y: f64, t: f64) -> Vec<RepEvent> {
        self.buffer.push_back(y);
        if self.buffer.len() > self.config.window {
            self.buffer.pop_front();
        }

        let (oldest, newest) = match (self.buffer.front(), self.buffer.back()) {
            (Some(&o), Some(&n)) if self.buffer.len() >= 2 => (o, n),
            _ => return Vec::new(),
        };

        let mean = self.buffer.iter().sum::<f64>() / self.buffer.len() as f64;
        let velocity = newest - oldest;
        let eps = self.config.eps;

        match self.phase {
            RepPhase::Idle => {
                if velocity > eps {
                    self.peak_y = Some(mean);
                    self.transition(RepPhase::Descending, t);
                }
            }
            RepPhase::Descending => {
                if self.peak_y.map_or(true, |peak| mean < peak) {
                    self.peak_y = Some(mean);
                }
                // Frame sampling can step straight across the dead band;
                // reaching or crossing it both count as the stall.
                if velocity <= eps {
                    self.transition(RepPhase::Bottom, t);
                }
            }
            RepPhase::Bottom => {
                let deep_enough = self
                    .peak_y
                    .map_or(false, |peak| (mean - peak).abs() >= self.config.min_depth_px);
                let cooled = self
                    .last_event_t
                    .map_or(true, |last| t - last >= self.config.event_cooldown);

                if deep_enough && cooled {
                    self.last_event_t = Some(t);
                    self.transition(RepPhase::Ascending, t);
                    info!(t, depth = ?self.peak_y.map(|p| mean - p), "rep bottom");
                    return vec![RepEvent::Bottom { t }];
                }

                if velocity < -eps {
                    debug!(t, deep_enough, cooled, "rising before rep qualified, discarding dip");
                    self.transition(RepPhase::Ascending, t);
                }
            }
            RepPhase::Ascending => {
                if velocity >= -eps {
                    self.peak_y = None;
                    self.transition(RepPhase::Idle, t);
                }
            }
        }

        Vec::new()
    }

    fn transition(&mut self, next: RepPhase, t: f64) {
        debug!(from = ?self.phase, to = ?next, t, "rep phase");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> RepDetector {
        RepDetector::new(RepConfig::default()).unwrap()
    }

    // Standing at y=300, squatting to y=300+depth, 30 fps, t in ms
    fn squat_wave(cycles: usize, depth: f64, period_frames: usize) -> Vec<(f64, f64)> {
        let hold = 20;
        let mut out = Vec::new();
        let mut frame = 0usize;
        let mut push = |y: f64, out: &mut Vec<(f64, f64)>| {
            out.push((y, frame as f64 * 1000.0 / 30.0));
            frame += 1;
        };
        for _ in 0..hold {
            push(300.0, &mut out);
        }
        for _ in 0..cycles {
            for i in 0..period_frames {
                let phase = i as f64 / period_frames as f64 * std::f64::consts::TAU;
                push(300.0 + depth * (1.0 - phase.cos()) / 2.0, &mut out);
            }
            for _ in 0..hold {
                push(300.0, &mut out);
            }
        }
        out
    }

    fn run(det: &mut RepDetector, samples: &[(f64, f64)]) -> Vec<RepEvent> {
        samples.iter().flat_map(|&(y, t)| det.update(y, t)).collect()
    }

    #[test]
    fn test_one_event_per_cycle() {
        let mut det = detector();
        let events = run(&mut det, &squat_wave(4, 120.0, 60));
        assert_eq!(events.len(), 4);

        let times: Vec<f64> = events
            .iter()
            .map(|e| match e {
                RepEvent::Bottom { t } => *t,
            })
            .collect();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= 1000.0);
        }
    }

    #[test]
    fn test_flat_signal_never_fires() {
        let mut det = detector();
        for i in 0..500 {
            assert!(det.update(310.0, i as f64 * 33.0).is_empty());
        }
        assert_eq!(det.phase(), RepPhase::Idle);
    }

    #[test]
    fn test_shallow_dip_discarded() {
        let mut det = detector();
        let events = run(&mut det, &squat_wave(3, 25.0, 60));
        assert!(events.is_empty());
        assert_eq!(det.phase(), RepPhase::Idle);
    }

    #[test]
    fn test_first_rep_fires_without_prior_event() {
        // No cooldown before the first event, even when t starts at 0
        let mut det = detector();
        let samples: Vec<(f64, f64)> = squat_wave(1, 120.0, 40)
            .into_iter()
            .map(|(y, t)| (y, t * 0.01))
            .collect();
        assert_eq!(run(&mut det, &samples).len(), 1);
    }

    #[test]
    fn test_cooldown_suppresses_fast_reps() {
        let cfg = RepConfig {
            event_cooldown: 10_000.0,
            ..RepConfig::default()
        };
        let mut det = RepDetector::new(cfg).unwrap();
        let events = run(&mut det, &squat_wave(3, 120.0, 40));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_reset_replays_identically() {
        let samples = squat_wave(2, 120.0, 60);
        let half = &samples[..samples.len() / 2];

        let mut det = detector();
        let mut first = Vec::new();
        for &(y, t) in half {
            det.update(y, t);
            first.push((det.phase(), det.peak_y()));
        }

        det.reset();
        assert_eq!(det.phase(), RepPhase::Idle);
        assert_eq!(det.peak_y(), None);

        let mut second = Vec::new();
        for &(y, t) in half {
            det.update(y, t);
            second.push((det.phase(), det.peak_y()));
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_sample_is_silent() {
        let mut det = detector();
        assert!(det.update(100.0, 0.0).is_empty());
        assert_eq!(det.phase(), RepPhase::Idle);
    }

    #[test]
    fn test_invalid_config_rejected() {
        for cfg in [
            RepConfig { window: 1, ..RepConfig::default() },
            RepConfig { eps: -1.0, ..RepConfig::default() },
            RepConfig { min_depth_px: f64::NAN, ..RepConfig::default() },
        ] {
            assert!(RepDetector::new(cfg).is_err());
        }
    }
}
