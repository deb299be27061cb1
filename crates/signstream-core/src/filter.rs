//! Adaptive landmark smoothing (One-Euro filter)
//!
//! Smooth when slow (suppresses tracking jitter), responsive when fast
//! (follows real hand motion). One filter per (point, axis), created lazily
//! on the first valid sample so there is no warm-up artifact.

use crate::config::FilterConfig;
use crate::landmarks::{Frame, Point3, RawFrame, HAND_POINTS};
use std::collections::HashMap;
use std::f32::consts::PI;
use tracing::warn;

/// Adaptive low-pass filter for a single scalar coordinate.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,

    // State
    x_prev: f32,
    dx_prev: f32,
    t_prev: f64,
    initialized: bool,
}

impl OneEuroFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_cutoff: config.min_cutoff,
            beta: config.beta,
            d_cutoff: config.d_cutoff,
            x_prev: 0.0,
            dx_prev: 0.0,
            t_prev: 0.0,
            initialized: false,
        }
    }

    fn smoothing_factor(t_e: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * t_e;
        r / (r + 1.0)
    }

    /// Filter one sample at timestamp `t` (seconds). The first sample seeds
    /// the state and passes through unchanged.
    pub fn filter(&mut self, t: f64, x: f32) -> f32 {
        if !self.initialized {
            self.x_prev = x;
            self.t_prev = t;
            self.initialized = true;
            return x;
        }

        let t_e = (t - self.t_prev) as f32;
        if t_e <= 0.0 {
            return self.x_prev;
        }

        // Derivative estimate drives the cutoff: fast points smoothed less.
        let a_d = Self::smoothing_factor(t_e, self.d_cutoff);
        let dx = (x - self.x_prev) / t_e;
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        let cutoff = self.min_cutoff + self.beta * dx_hat.abs();
        let a = Self::smoothing_factor(t_e, cutoff);
        let x_hat = a * x + (1.0 - a) * self.x_prev;

        self.x_prev = x_hat;
        self.dx_prev = dx_hat;
        self.t_prev = t;

        x_hat
    }
}

/// Result of pushing one raw frame through the smoother.
#[derive(Debug, Clone)]
pub enum SmoothOutcome {
    /// Valid frame, smoothed coordinates.
    Smoothed(Frame),
    /// Malformed frame dropped; the prior valid smoothed frame (if any) is
    /// returned unchanged and filter state is untouched.
    Rejected { last_valid: Option<Frame> },
}

/// Per-session filter bank over all hand coordinates.
///
/// Anchor points are passed through unfiltered: they are coarse distance
/// targets whose thresholds sit far above jitter amplitude.
pub struct FrameSmoother {
    config: FilterConfig,
    filters: HashMap<usize, OneEuroFilter>,
    last_valid: Option<Frame>,
}

impl FrameSmoother {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            filters: HashMap::new(),
            last_valid: None,
        }
    }

    /// Smooth one frame at timestamp `t` (seconds). Malformed input (wrong
    /// point count, non-finite coordinates) never terminates the session:
    /// the frame is flagged and the prior valid output stands.
    pub fn smooth(&mut self, raw: &RawFrame, t: f64) -> SmoothOutcome {
        let frame = match Frame::try_from_raw(raw) {
            Ok(f) => f,
            Err(e) => {
                warn!("Dropping malformed frame: {e}");
                return SmoothOutcome::Rejected {
                    last_valid: self.last_valid.clone(),
                };
            }
        };

        let mut hand = *frame.hand();
        for (i, p) in hand.iter_mut().enumerate() {
            *p = Point3::new(
                self.axis_filter(i, 0).filter(t, p.x),
                self.axis_filter(i, 1).filter(t, p.y),
                self.axis_filter(i, 2).filter(t, p.z),
            );
        }

        let smoothed = Frame {
            hand,
            face: frame.face,
            shoulders: frame.shoulders,
        };
        self.last_valid = Some(smoothed.clone());
        SmoothOutcome::Smoothed(smoothed)
    }

    /// At most one filter per (point-index, axis) pair, created on first use.
    fn axis_filter(&mut self, point: usize, axis: usize) -> &mut OneEuroFilter {
        debug_assert!(point < HAND_POINTS && axis < 3);
        let Self {
            config, filters, ..
        } = self;
        filters
            .entry(point * 3 + axis)
            .or_insert_with(|| OneEuroFilter::new(config))
    }

    pub fn last_valid(&self) -> Option<&Frame> {
        self.last_valid.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{INDEX_TIP, WRIST};

    fn raw_hand(y: f32) -> RawFrame {
        RawFrame {
            hand: (0..HAND_POINTS)
                .map(|i| Point3::new(0.1 + i as f32 * 0.02, y, 0.0))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn first_sample_seeds_state() {
        let mut smoother = FrameSmoother::new(FilterConfig::default());
        let raw = raw_hand(0.4);
        match smoother.smooth(&raw, 0.0) {
            SmoothOutcome::Smoothed(frame) => {
                // No warm-up artifact: the seed passes through unchanged.
                assert_eq!(frame.point(WRIST).y, 0.4);
                assert_eq!(frame.point(INDEX_TIP).y, 0.4);
            }
            SmoothOutcome::Rejected { .. } => panic!("valid frame rejected"),
        }
    }

    #[test]
    fn idempotent_on_constant_input() {
        let mut smoother = FrameSmoother::new(FilterConfig::default());
        let raw = raw_hand(0.4);
        smoother.smooth(&raw, 0.0);
        for step in 1..10 {
            match smoother.smooth(&raw, step as f64 * 0.033) {
                SmoothOutcome::Smoothed(frame) => {
                    for p in frame.hand() {
                        assert!((p.y - 0.4).abs() < 1e-6);
                    }
                }
                SmoothOutcome::Rejected { .. } => panic!("valid frame rejected"),
            }
        }
    }

    #[test]
    fn smooths_toward_new_position() {
        let mut smoother = FrameSmoother::new(FilterConfig::default());
        smoother.smooth(&raw_hand(0.4), 0.0);
        let out = smoother.smooth(&raw_hand(0.8), 0.033);
        match out {
            SmoothOutcome::Smoothed(frame) => {
                let y = frame.point(WRIST).y;
                // Filtered output lands between the old and new positions.
                assert!(y > 0.4 && y < 0.8, "got {y}");
            }
            SmoothOutcome::Rejected { .. } => panic!("valid frame rejected"),
        }
    }

    #[test]
    fn malformed_frame_returns_last_valid() {
        let mut smoother = FrameSmoother::new(FilterConfig::default());
        smoother.smooth(&raw_hand(0.4), 0.0);

        let short = RawFrame {
            hand: vec![Point3::new(0.5, 0.5, 0.0); 5],
            ..Default::default()
        };
        match smoother.smooth(&short, 0.033) {
            SmoothOutcome::Rejected { last_valid } => {
                let frame = last_valid.expect("prior valid frame retained");
                assert_eq!(frame.point(WRIST).y, 0.4);
            }
            SmoothOutcome::Smoothed(_) => panic!("malformed frame accepted"),
        }

        // Filter state survives the bad capture untouched.
        match smoother.smooth(&raw_hand(0.4), 0.066) {
            SmoothOutcome::Smoothed(frame) => {
                assert!((frame.point(WRIST).y - 0.4).abs() < 1e-6);
            }
            SmoothOutcome::Rejected { .. } => panic!("valid frame rejected"),
        }
    }

    #[test]
    fn rejected_before_any_valid_frame_has_no_fallback() {
        let mut smoother = FrameSmoother::new(FilterConfig::default());
        let short = RawFrame::default();
        match smoother.smooth(&short, 0.0) {
            SmoothOutcome::Rejected { last_valid } => assert!(last_valid.is_none()),
            SmoothOutcome::Smoothed(_) => panic!("empty frame accepted"),
        }
    }
}
