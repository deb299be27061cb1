//! Geometric sign classification.
//!
//! A fixed, ordered table of gesture rules evaluated against one smoothed
//! frame; the first matching rule wins. Rules needing a facial or torso
//! anchor run before hand-only rules, and more-constrained hand shapes run
//! before less-constrained ones, so a general rule never masks a specific
//! one. Ties resolve by table order, never by comparing confidences.

use crate::config::GeometryConfig;
use crate::landmarks::{
    Frame, Point3, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP,
    RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP,
};

/// Confidence reported when no rule matches.
const NO_MATCH_CONFIDENCE: f32 = 0.25;

/// Extension state of the five digits.
///
/// A digit is extended when its fingertip sits above (numerically smaller y
/// than) its proximal joint: the PIP for the four fingers, the IP for the
/// thumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandShape {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl HandShape {
    pub fn of(frame: &Frame) -> Self {
        let ext = |tip: usize, joint: usize| frame.point(tip).y < frame.point(joint).y;
        Self {
            thumb: ext(THUMB_TIP, THUMB_IP),
            index: ext(INDEX_TIP, INDEX_PIP),
            middle: ext(MIDDLE_TIP, MIDDLE_PIP),
            ring: ext(RING_TIP, RING_PIP),
            pinky: ext(PINKY_TIP, PINKY_PIP),
        }
    }

    /// All four non-thumb fingers extended (flat hand).
    fn fingers_extended(&self) -> bool {
        self.index && self.middle && self.ring && self.pinky
    }

    /// All four non-thumb fingers curled.
    fn fingers_curled(&self) -> bool {
        !self.index && !self.middle && !self.ring && !self.pinky
    }
}

/// Everything a rule predicate may inspect.
pub struct RuleCtx<'a> {
    pub frame: &'a Frame,
    pub shape: HandShape,
    pub geometry: &'a GeometryConfig,
}

impl RuleCtx<'_> {
    /// Anchor-distance primitive: x/y-plane distance between a hand point
    /// and an anchor, against the given radius. An absent anchor never
    /// matches, so anchor-dependent rules are skipped rather than satisfied.
    fn near(&self, hand_idx: usize, anchor: Option<Point3>, radius: f32) -> bool {
        anchor.map_or(false, |a| {
            self.frame.point(hand_idx).distance_xy(&a) <= radius
        })
    }

    fn chin(&self) -> Option<Point3> {
        self.frame.face().and_then(|f| f.chin)
    }

    fn forehead(&self) -> Option<Point3> {
        self.frame.face().and_then(|f| f.forehead)
    }
}

/// One classification rule: label, predicate, fixed confidence.
pub struct GestureRule {
    pub label: &'static str,
    pub confidence: f32,
    predicate: fn(&RuleCtx) -> bool,
}

/// Classifier output for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: Option<&'static str>,
    pub confidence: f32,
}

/// Stateless rule-based sign classifier. One instance serves the whole
/// process; the rule table is immutable configuration.
pub struct SignClassifier {
    rules: Vec<GestureRule>,
    geometry: GeometryConfig,
}

impl SignClassifier {
    pub fn new(geometry: GeometryConfig) -> Self {
        Self {
            rules: rule_table(),
            geometry,
        }
    }

    /// Map one frame to a candidate label. Pure and deterministic: the first
    /// rule whose predicate holds wins.
    pub fn classify(&self, frame: &Frame) -> Classification {
        let ctx = RuleCtx {
            frame,
            shape: HandShape::of(frame),
            geometry: &self.geometry,
        };
        for rule in &self.rules {
            if (rule.predicate)(&ctx) {
                return Classification {
                    label: Some(rule.label),
                    confidence: rule.confidence,
                };
            }
        }
        Classification {
            label: None,
            confidence: NO_MATCH_CONFIDENCE,
        }
    }

    /// Number of rules in the lexicon (reported by the health endpoint).
    pub fn lexicon_size(&self) -> usize {
        self.rules.len()
    }
}

/// The ordered lexicon. Anchored rules first, then hand-only shapes from
/// most to least constrained.
fn rule_table() -> Vec<GestureRule> {
    vec![
        GestureRule {
            label: "MOTHER",
            confidence: 0.95,
            predicate: |c| {
                c.shape.fingers_extended() && c.near(THUMB_TIP, c.chin(), c.geometry.face_radius)
            },
        },
        GestureRule {
            label: "FATHER",
            confidence: 0.95,
            predicate: |c| {
                c.shape.fingers_extended()
                    && c.near(THUMB_TIP, c.forehead(), c.geometry.face_radius)
            },
        },
        GestureRule {
            label: "THINK",
            confidence: 0.93,
            predicate: |c| {
                c.shape.index
                    && !c.shape.middle
                    && !c.shape.ring
                    && !c.shape.pinky
                    && c.near(INDEX_TIP, c.forehead(), c.geometry.face_radius)
            },
        },
        GestureRule {
            label: "THANK YOU",
            confidence: 0.92,
            predicate: |c| {
                c.shape.fingers_extended() && c.near(INDEX_TIP, c.chin(), c.geometry.face_radius)
            },
        },
        GestureRule {
            label: "ME",
            confidence: 0.92,
            predicate: |c| {
                c.shape.index
                    && !c.shape.middle
                    && !c.shape.ring
                    && !c.shape.pinky
                    && c.near(
                        INDEX_TIP,
                        c.frame.chest_center(),
                        c.geometry.chest_radius,
                    )
            },
        },
        GestureRule {
            label: "PLEASE",
            confidence: 0.90,
            predicate: |c| {
                c.shape.fingers_extended()
                    && c.near(
                        MIDDLE_MCP,
                        c.frame.chest_center(),
                        c.geometry.chest_radius,
                    )
            },
        },
        // Hand-only from here down; the closed fist is the most constrained
        // shape and runs first.
        GestureRule {
            label: "STOP",
            confidence: 0.92,
            predicate: |c| !c.shape.thumb && c.shape.fingers_curled(),
        },
        GestureRule {
            label: "YES",
            confidence: 0.92,
            predicate: |c| c.shape.thumb && c.shape.fingers_curled(),
        },
        GestureRule {
            label: "I LOVE YOU",
            confidence: 0.93,
            predicate: |c| {
                c.shape.thumb && c.shape.index && c.shape.pinky && !c.shape.middle && !c.shape.ring
            },
        },
        GestureRule {
            label: "CALL",
            confidence: 0.90,
            predicate: |c| {
                c.shape.thumb
                    && c.shape.pinky
                    && !c.shape.index
                    && !c.shape.middle
                    && !c.shape.ring
            },
        },
        GestureRule {
            label: "NO",
            confidence: 0.90,
            predicate: |c| {
                c.shape.thumb
                    && c.shape.index
                    && c.shape.middle
                    && !c.shape.ring
                    && !c.shape.pinky
            },
        },
        GestureRule {
            label: "HELLO",
            confidence: 0.90,
            predicate: |c| c.shape.thumb && c.shape.fingers_extended(),
        },
        GestureRule {
            label: "I",
            confidence: 0.88,
            predicate: |c| {
                c.shape.pinky
                    && !c.shape.thumb
                    && !c.shape.index
                    && !c.shape.middle
                    && !c.shape.ring
            },
        },
        // Single extended index with the thumb unconstrained: the least
        // constrained shape in the table, checked last.
        GestureRule {
            label: "GO",
            confidence: 0.86,
            predicate: |c| c.shape.index && !c.shape.middle && !c.shape.ring && !c.shape.pinky,
        },
    ]
}

#[cfg(test)]
pub(crate) mod test_frames {
    use crate::landmarks::{FaceAnchors, Point3, RawFrame};

    /// Build a synthetic 21-point hand. `ext` is per-digit extension in
    /// thumb, index, middle, ring, pinky order. y grows downward, so an
    /// extended fingertip sits at a smaller y than its proximal joint.
    pub fn hand(ext: [bool; 5]) -> RawFrame {
        let mut pts = vec![Point3::new(0.5, 0.85, 0.0)]; // wrist

        // Thumb: CMC, MCP, IP, TIP
        let thumb_tip_y = if ext[0] { 0.50 } else { 0.66 };
        pts.extend([
            Point3::new(0.42, 0.75, 0.0),
            Point3::new(0.40, 0.68, 0.0),
            Point3::new(0.38, 0.60, 0.0),
            Point3::new(0.37, thumb_tip_y, 0.0),
        ]);

        // Four fingers: MCP, PIP, DIP, TIP per finger.
        let xs = [0.46, 0.50, 0.54, 0.58];
        for (i, x) in xs.iter().enumerate() {
            let tip_y = if ext[i + 1] { 0.35 } else { 0.70 };
            pts.extend([
                Point3::new(*x, 0.65, 0.0),
                Point3::new(*x, 0.55, 0.0),
                Point3::new(*x, 0.50, 0.0),
                Point3::new(*x, tip_y, 0.0),
            ]);
        }

        RawFrame {
            hand: pts,
            ..Default::default()
        }
    }

    pub fn with_chin_at_thumb(mut raw: RawFrame) -> RawFrame {
        let thumb_tip = raw.hand[crate::landmarks::THUMB_TIP];
        raw.face = Some(FaceAnchors {
            chin: Some(Point3::new(thumb_tip.x + 0.02, thumb_tip.y, 0.0)),
            ..Default::default()
        });
        raw
    }

    pub fn with_shoulders_at_index(mut raw: RawFrame) -> RawFrame {
        let index_tip = raw.hand[crate::landmarks::INDEX_TIP];
        raw.shoulders = Some([
            Point3::new(index_tip.x - 0.1, index_tip.y, 0.0),
            Point3::new(index_tip.x + 0.1, index_tip.y, 0.0),
        ]);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::test_frames::*;
    use super::*;
    use crate::landmarks::{Frame, RawFrame};

    fn classify(raw: &RawFrame) -> Classification {
        let classifier = SignClassifier::new(GeometryConfig::default());
        let frame = Frame::try_from_raw(raw).expect("valid test frame");
        classifier.classify(&frame)
    }

    #[test]
    fn closed_fist_is_stop() {
        let c = classify(&hand([false; 5]));
        assert_eq!(c.label, Some("STOP"));
        assert!(c.confidence >= 0.85);
    }

    #[test]
    fn thumbs_up_is_yes() {
        let c = classify(&hand([true, false, false, false, false]));
        assert_eq!(c.label, Some("YES"));
    }

    #[test]
    fn open_palm_is_hello() {
        let c = classify(&hand([true; 5]));
        assert_eq!(c.label, Some("HELLO"));
    }

    #[test]
    fn pinky_only_is_i() {
        let c = classify(&hand([false, false, false, false, true]));
        assert_eq!(c.label, Some("I"));
    }

    #[test]
    fn index_only_is_go() {
        let c = classify(&hand([false, true, false, false, false]));
        assert_eq!(c.label, Some("GO"));
    }

    #[test]
    fn thumb_index_pinky_is_i_love_you() {
        let c = classify(&hand([true, true, false, false, true]));
        assert_eq!(c.label, Some("I LOVE YOU"));
    }

    #[test]
    fn thumb_pinky_is_call() {
        let c = classify(&hand([true, false, false, false, true]));
        assert_eq!(c.label, Some("CALL"));
    }

    #[test]
    fn anchored_rule_outranks_hand_only() {
        // Open palm with the chin at the thumb tip: MOTHER, not HELLO.
        let raw = with_chin_at_thumb(hand([true; 5]));
        let c = classify(&raw);
        assert_eq!(c.label, Some("MOTHER"));
    }

    #[test]
    fn absent_anchor_skips_rule() {
        // Same hand without a face: anchor rules are skipped, HELLO wins.
        let c = classify(&hand([true; 5]));
        assert_eq!(c.label, Some("HELLO"));
    }

    #[test]
    fn index_at_chest_center_is_me() {
        let raw = with_shoulders_at_index(hand([false, true, false, false, false]));
        let c = classify(&raw);
        assert_eq!(c.label, Some("ME"));
    }

    #[test]
    fn unmatched_shape_reports_none_with_low_confidence() {
        // Index + ring only: no rule covers it.
        let c = classify(&hand([false, true, false, true, false]));
        assert_eq!(c.label, None);
        assert!(c.confidence < 0.5);
    }

    #[test]
    fn classification_is_deterministic() {
        let raw = hand([true, false, false, false, false]);
        assert_eq!(classify(&raw), classify(&raw));
    }
}
