//! Per-connection session state and the idle-eviction registry.
//!
//! A session owns one filter bank, one vote window, and one sentence; only
//! the task that owns the connection feeds it, so the per-session mutex is
//! uncontended in steady state. The registry's concurrent map is the single
//! resource shared with the background sweep.

use crate::classifier::SignClassifier;
use crate::config::{PipelineConfig, SessionConfig};
use crate::filter::{FrameSmoother, SmoothOutcome};
use crate::landmarks::RawFrame;
use crate::sentence::SentenceAssembler;
use crate::vote::{StableSign, VoteBuffer};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Consecutive invalid frames before one `error` event is surfaced.
const INVALID_STREAK_NOTIFY: u32 = 30;

/// Outcome of feeding one landmark frame through a session's pipeline.
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// A sign was confirmed by majority vote. `appended` is false when the
    /// sentence cooldown suppressed the word.
    Stable {
        sign: StableSign,
        appended: bool,
        sentence: String,
    },
    /// Valid frame, no stable decision yet.
    Pending,
    /// Malformed frame dropped; `notify` is set once per failure streak.
    Invalid { notify: bool },
}

/// All mutable state for one connection.
pub struct Session {
    id: String,
    smoother: FrameSmoother,
    votes: VoteBuffer,
    sentence: SentenceAssembler,
    last_activity: Instant,
    invalid_streak: u32,
}

impl Session {
    pub fn new(id: String, config: &PipelineConfig) -> Self {
        Self {
            id,
            smoother: FrameSmoother::new(config.filter.clone()),
            votes: VoteBuffer::new(
                config.vote_window,
                config.majority_ratio,
                config.confidence_threshold,
            ),
            sentence: SentenceAssembler::new(config.word_cooldown_secs),
            last_activity: Instant::now(),
            invalid_streak: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run one frame through smoothing, classification, and voting; append
    /// to the sentence on a stable decision.
    pub fn process_frame(
        &mut self,
        raw: &RawFrame,
        t: f64,
        classifier: &SignClassifier,
    ) -> FrameOutcome {
        self.touch();
        let frame = match self.smoother.smooth(raw, t) {
            SmoothOutcome::Smoothed(frame) => frame,
            SmoothOutcome::Rejected { .. } => {
                self.invalid_streak += 1;
                return FrameOutcome::Invalid {
                    notify: self.invalid_streak == INVALID_STREAK_NOTIFY,
                };
            }
        };
        self.invalid_streak = 0;

        let candidate = classifier.classify(&frame);
        debug!(
            session = %self.id,
            label = candidate.label.unwrap_or("-"),
            confidence = candidate.confidence,
            "frame classified"
        );

        match self.votes.push(candidate.label, candidate.confidence) {
            Some(sign) => {
                let appended = self.sentence.append(sign.label, t);
                FrameOutcome::Stable {
                    sentence: self.sentence.text(),
                    sign,
                    appended,
                }
            }
            None => FrameOutcome::Pending,
        }
    }

    /// Current confirmed words, oldest first.
    pub fn words(&self) -> Vec<String> {
        self.sentence.words().to_vec()
    }

    pub fn sentence_text(&self) -> String {
        self.sentence.text()
    }

    /// Empty the word list and the vote window together so stale votes
    /// cannot leak into a post-clear sentence.
    pub fn clear(&mut self) {
        self.sentence.clear();
        self.votes.clear();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        if let Some(t) = self.last_activity.checked_sub(by) {
            self.last_activity = t;
        }
    }
}

/// Owns every live session and runs the periodic idle sweep.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    pipeline: PipelineConfig,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(pipeline: PipelineConfig, config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            pipeline,
            ttl: config.ttl(),
        }
    }

    /// Look up a session by id, creating it on first contact. A missing id
    /// gets a server-generated UUID.
    pub fn get_or_create(&self, id: Option<&str>) -> (String, Arc<Mutex<Session>>) {
        let id = match id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let handle = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| {
                info!("Created new session: {id}");
                Arc::new(Mutex::new(Session::new(id.clone(), &self.pipeline)))
            })
            .value()
            .clone();
        (id, handle)
    }

    /// Update last-activity for an inbound message.
    pub async fn touch(&self, id: &str) {
        if let Some(handle) = self.sessions.get(id).map(|e| e.value().clone()) {
            handle.lock().await.touch();
        }
    }

    /// Reset a session's word list and vote window. Returns false for an
    /// unknown id.
    pub async fn clear(&self, id: &str) -> bool {
        match self.sessions.get(id).map(|e| e.value().clone()) {
            Some(handle) => {
                handle.lock().await.clear();
                true
            }
            None => false,
        }
    }

    /// Drop a session outright (explicit disconnect of an anonymous client).
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!("Removed session: {id}");
        }
        removed
    }

    /// Evict every session idle past the TTL. Iterates a snapshot of the key
    /// set so the map is never mutated mid-iteration; an in-flight message
    /// keeps its own `Arc`, so eviction never invalidates live state.
    pub async fn evict_idle(&self) -> usize {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut evicted = 0;
        for id in ids {
            let Some(handle) = self.sessions.get(&id).map(|e| e.value().clone()) else {
                continue;
            };
            let expired = handle.lock().await.idle_for() >= self.ttl;
            if expired {
                self.sessions.remove(&id);
                evicted += 1;
                info!("Cleaned up inactive session: {id}");
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Background sweep on a fixed interval, independent of message flow.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh process
            // does not sweep an empty map.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.evict_idle().await;
            }
        })
    }
}
