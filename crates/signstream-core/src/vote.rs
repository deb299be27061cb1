//! Temporal majority-vote stabilization.
//!
//! A burst of per-frame classifier outputs becomes a single stable decision
//! once one label holds a supermajority of the sliding window. The window is
//! never cleared on emission; it keeps sliding, and the latch below makes the
//! transition into stability fire exactly once.

use std::collections::VecDeque;

/// One classifier output pushed into the window.
#[derive(Debug, Clone)]
struct Vote {
    label: Option<&'static str>,
    confidence: f32,
}

/// A confirmed decision emitted by the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct StableSign {
    pub label: &'static str,
    pub confidence: f32,
}

/// Per-session sliding vote window.
pub struct VoteBuffer {
    window: VecDeque<Vote>,
    capacity: usize,
    majority_ratio: f32,
    confidence_threshold: f32,
    /// Label currently latched as stable; released when the stability
    /// condition lapses so the same sign can stabilize again later.
    latched: Option<&'static str>,
}

impl VoteBuffer {
    pub fn new(capacity: usize, majority_ratio: f32, confidence_threshold: f32) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            majority_ratio,
            confidence_threshold,
            latched: None,
        }
    }

    /// Append one classifier output. Returns a stable decision only on the
    /// transition into stability: the majority label's share of the window
    /// capacity reaches the majority ratio and its confidence clears the
    /// threshold, and it is not already latched.
    pub fn push(&mut self, label: Option<&'static str>, confidence: f32) -> Option<StableSign> {
        self.window.push_back(Vote { label, confidence });
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let Some((majority, count)) = self.majority() else {
            self.latched = None;
            return None;
        };

        // Share is measured against capacity, not current length, so a
        // half-filled window cannot stabilize prematurely.
        let share = count as f32 / self.capacity as f32;
        let confidence = self.latest_confidence(majority);
        let stable = share >= self.majority_ratio && confidence >= self.confidence_threshold;

        if !stable {
            self.latched = None;
            return None;
        }
        if self.latched == Some(majority) {
            return None;
        }
        self.latched = Some(majority);
        Some(StableSign {
            label: majority,
            confidence,
        })
    }

    /// Majority label among non-none entries, with its count.
    fn majority(&self) -> Option<(&'static str, usize)> {
        let mut best: Option<(&'static str, usize)> = None;
        for vote in &self.window {
            let Some(label) = vote.label else { continue };
            let count = self
                .window
                .iter()
                .filter(|v| v.label == Some(label))
                .count();
            match best {
                Some((_, n)) if n >= count => {}
                _ => best = Some((label, count)),
            }
        }
        best
    }

    /// Confidence of the most recent vote carrying the given label.
    fn latest_confidence(&self, label: &'static str) -> f32 {
        self.window
            .iter()
            .rev()
            .find(|v| v.label == Some(label))
            .map(|v| v.confidence)
            .unwrap_or(0.0)
    }

    /// Discard all votes and release the latch. Used by `clear` so stale
    /// votes cannot leak into a post-clear sentence.
    pub fn clear(&mut self) {
        self.window.clear();
        self.latched = None;
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
