//! Hand and anchor landmark model.
//!
//! A frame carries the 21-point hand layout produced by the external tracking
//! component (wrist, then four joints per digit, fixed order), plus optional
//! facial and shoulder anchor points used only as distance targets.

use crate::error::{SignError, SignResult};
use serde::{Deserialize, Serialize};

/// Number of hand points in a valid frame.
pub const HAND_POINTS: usize = 21;

// Hand landmark indices (MediaPipe order).
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// One landmark in normalized frame coordinates (0..1 for x/y; z is
/// camera-relative depth, ordering only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the x/y plane. Anchor tests deliberately ignore
    /// depth, which is too noisy for thresholding.
    pub fn distance_xy(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(a: &Point3, b: &Point3) -> Point3 {
        Point3::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5, (a.z + b.z) * 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Facial anchor points. Each is optional; rules that depend on a missing
/// anchor are skipped rather than matched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceAnchors {
    #[serde(default)]
    pub chin: Option<Point3>,
    #[serde(default)]
    pub forehead: Option<Point3>,
    #[serde(default)]
    pub nose: Option<Point3>,
    #[serde(default)]
    pub left_cheek: Option<Point3>,
    #[serde(default)]
    pub right_cheek: Option<Point3>,
}

impl FaceAnchors {
    fn drop_non_finite(mut self) -> Self {
        for slot in [
            &mut self.chin,
            &mut self.forehead,
            &mut self.nose,
            &mut self.left_cheek,
            &mut self.right_cheek,
        ] {
            if slot.map_or(false, |p| !p.is_finite()) {
                *slot = None;
            }
        }
        self
    }
}

/// Unvalidated per-frame payload as delivered by the tracking component.
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    pub hand: Vec<Point3>,
    pub face: Option<FaceAnchors>,
    pub shoulders: Option<[Point3; 2]>,
}

/// A validated frame: exactly 21 ordered, finite hand points plus optional
/// anchors. Construction is the only validation gate; everything downstream
/// can index the hand array unchecked.
#[derive(Debug, Clone)]
pub struct Frame {
    pub(crate) hand: [Point3; HAND_POINTS],
    pub(crate) face: Option<FaceAnchors>,
    pub(crate) shoulders: Option<[Point3; 2]>,
}

impl Frame {
    /// Validate a raw payload. Fewer than 21 hand points or any non-finite
    /// hand coordinate rejects the frame; extra trailing points are ignored.
    /// Non-finite anchors are dropped individually, not fatal.
    pub fn try_from_raw(raw: &RawFrame) -> SignResult<Frame> {
        if raw.hand.len() < HAND_POINTS {
            return Err(SignError::InvalidFrame(format!(
                "expected {} hand points, got {}",
                HAND_POINTS,
                raw.hand.len()
            )));
        }
        let mut hand = [Point3::new(0.0, 0.0, 0.0); HAND_POINTS];
        for (i, p) in raw.hand.iter().take(HAND_POINTS).enumerate() {
            if !p.is_finite() {
                return Err(SignError::InvalidFrame(format!(
                    "non-finite coordinate at hand point {i}"
                )));
            }
            hand[i] = *p;
        }
        let face = raw.face.clone().map(FaceAnchors::drop_non_finite);
        let shoulders = raw
            .shoulders
            .filter(|[l, r]| l.is_finite() && r.is_finite());
        Ok(Frame {
            hand,
            face,
            shoulders,
        })
    }

    pub fn point(&self, idx: usize) -> Point3 {
        self.hand[idx]
    }

    pub fn hand(&self) -> &[Point3; HAND_POINTS] {
        &self.hand
    }

    pub fn face(&self) -> Option<&FaceAnchors> {
        self.face.as_ref()
    }

    pub fn shoulders(&self) -> Option<&[Point3; 2]> {
        self.shoulders.as_ref()
    }

    /// Chest-center anchor: midpoint of the two shoulders when available.
    pub fn chest_center(&self) -> Option<Point3> {
        self.shoulders
            .as_ref()
            .map(|[l, r]| Point3::midpoint(l, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand() -> Vec<Point3> {
        (0..HAND_POINTS as i32)
            .map(|i| Point3::new(0.5, 0.5 + i as f32 * 0.01, 0.0))
            .collect()
    }

    #[test]
    fn accepts_exact_hand() {
        let raw = RawFrame {
            hand: flat_hand(),
            ..Default::default()
        };
        assert!(Frame::try_from_raw(&raw).is_ok());
    }

    #[test]
    fn rejects_short_hand() {
        let raw = RawFrame {
            hand: flat_hand()[..20].to_vec(),
            ..Default::default()
        };
        assert!(Frame::try_from_raw(&raw).is_err());
    }

    #[test]
    fn rejects_non_finite_coordinate() {
        let mut hand = flat_hand();
        hand[INDEX_TIP].y = f32::NAN;
        let raw = RawFrame {
            hand,
            ..Default::default()
        };
        assert!(Frame::try_from_raw(&raw).is_err());
    }

    #[test]
    fn ignores_extra_points() {
        let mut hand = flat_hand();
        hand.push(Point3::new(9.0, 9.0, 9.0));
        let raw = RawFrame {
            hand,
            ..Default::default()
        };
        let frame = Frame::try_from_raw(&raw).unwrap();
        assert_eq!(frame.hand().len(), HAND_POINTS);
    }

    #[test]
    fn chest_center_is_shoulder_midpoint() {
        let raw = RawFrame {
            hand: flat_hand(),
            shoulders: Some([Point3::new(0.3, 0.8, 0.0), Point3::new(0.7, 0.8, 0.0)]),
            ..Default::default()
        };
        let frame = Frame::try_from_raw(&raw).unwrap();
        let center = frame.chest_center().unwrap();
        assert!((center.x - 0.5).abs() < 1e-6);
        assert!((center.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn drops_non_finite_anchor_keeps_frame() {
        let raw = RawFrame {
            hand: flat_hand(),
            face: Some(FaceAnchors {
                chin: Some(Point3::new(f32::INFINITY, 0.2, 0.0)),
                forehead: Some(Point3::new(0.5, 0.1, 0.0)),
                ..Default::default()
            }),
            ..Default::default()
        };
        let frame = Frame::try_from_raw(&raw).unwrap();
        let face = frame.face().unwrap();
        assert!(face.chin.is_none());
        assert!(face.forehead.is_some());
    }
}
