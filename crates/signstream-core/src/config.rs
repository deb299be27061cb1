//! Pipeline configuration loaded from the environment.
//!
//! Recognition thresholds, filter response, geometric tolerances, session
//! lifetimes, and the refinement provider chain. Change behavior without
//! code edits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One-Euro filter response parameters.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | SIGN_FILTER_MIN_CUTOFF | 1.5 | Minimum cutoff frequency (Hz); lower = smoother at rest. |
/// | SIGN_FILTER_BETA | 8.0 | Speed coefficient; higher = less lag during fast motion. |
/// | SIGN_FILTER_D_CUTOFF | 1.0 | Cutoff for the derivative estimate (Hz). |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_cutoff: f32,
    pub beta: f32,
    pub d_cutoff: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_cutoff: 1.5,
            beta: 8.0,
            d_cutoff: 1.0,
        }
    }
}

/// Geometric tolerances for the classifier's anchor-distance tests, in
/// normalized (0..1) frame coordinates. Tightest for precise targets like
/// the chin, loosest for the broad chest area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Fingertip-to-fingertip contact distance (SIGN_TOUCH_RADIUS).
    pub touch_radius: f32,
    /// Fingertip/thumb-tip to facial anchor distance (SIGN_FACE_RADIUS).
    pub face_radius: f32,
    /// Fingertip/palm to chest-center distance (SIGN_CHEST_RADIUS).
    pub chest_radius: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            touch_radius: 0.05,
            face_radius: 0.08,
            chest_radius: 0.15,
        }
    }
}

/// Recognition pipeline tunables.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | SIGN_CONFIDENCE_THRESHOLD | 0.85 | Minimum rule confidence for a stable decision. |
/// | SIGN_VOTE_WINDOW | 15 | Sliding vote window capacity (frames). |
/// | SIGN_MAJORITY_RATIO | 0.8 | Majority label share of the window required for stability. |
/// | SIGN_WORD_COOLDOWN_SECS | 1.0 | Minimum seconds before an identical word may repeat. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub confidence_threshold: f32,
    pub vote_window: usize,
    pub majority_ratio: f32,
    pub word_cooldown_secs: f64,
    pub filter: FilterConfig,
    pub geometry: GeometryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.85,
            vote_window: 15,
            majority_ratio: 0.8,
            word_cooldown_secs: 1.0,
            filter: FilterConfig::default(),
            geometry: GeometryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load tunables from environment. Unset or invalid => defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            confidence_threshold: env_f32("SIGN_CONFIDENCE_THRESHOLD", d.confidence_threshold),
            vote_window: env_usize("SIGN_VOTE_WINDOW", d.vote_window).max(1),
            majority_ratio: env_f32("SIGN_MAJORITY_RATIO", d.majority_ratio).clamp(0.0, 1.0),
            word_cooldown_secs: env_f64("SIGN_WORD_COOLDOWN_SECS", d.word_cooldown_secs),
            filter: FilterConfig {
                min_cutoff: env_f32("SIGN_FILTER_MIN_CUTOFF", d.filter.min_cutoff),
                beta: env_f32("SIGN_FILTER_BETA", d.filter.beta),
                d_cutoff: env_f32("SIGN_FILTER_D_CUTOFF", d.filter.d_cutoff),
            },
            geometry: GeometryConfig {
                touch_radius: env_f32("SIGN_TOUCH_RADIUS", d.geometry.touch_radius),
                face_radius: env_f32("SIGN_FACE_RADIUS", d.geometry.face_radius),
                chest_radius: env_f32("SIGN_CHEST_RADIUS", d.geometry.chest_radius),
            },
        }
    }
}

/// Session lifetime management.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | SIGN_SESSION_TTL_SECS | 3600 | Idle seconds before a session is evicted. |
/// | SIGN_SWEEP_INTERVAL_SECS | 300 | Interval between eviction sweeps. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            ttl_secs: env_u64("SIGN_SESSION_TTL_SECS", d.ttl_secs),
            sweep_interval_secs: env_u64("SIGN_SWEEP_INTERVAL_SECS", d.sweep_interval_secs).max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Refinement provider chain.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | SIGN_REFINE_PROVIDERS | gemini,groq,openai | Provider priority order. |
/// | SIGN_REFINE_TIMEOUT_SECS | 10 | Per-provider attempt timeout. |
///
/// Credentials come from `GEMINI_API_KEY`, `GROQ_API_KEY`, `OPENAI_API_KEY`;
/// a provider without its key is skipped like a failed attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    pub providers: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            providers: vec!["gemini".into(), "groq".into(), "openai".into()],
            timeout_secs: 10,
        }
    }
}

impl RefineConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            providers: env_list("SIGN_REFINE_PROVIDERS").unwrap_or(d.providers),
            timeout_secs: env_u64("SIGN_REFINE_TIMEOUT_SECS", d.timeout_secs).max(1),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_f32(name: &str, default: f32) -> f32 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_list(name: &str) -> Option<Vec<String>> {
    std::env::var(name)
        .ok()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|v: &Vec<String>| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuning() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.vote_window, 15);
        assert!((cfg.majority_ratio - 0.8).abs() < f32::EPSILON);
        assert!((cfg.confidence_threshold - 0.85).abs() < f32::EPSILON);
        assert!((cfg.word_cooldown_secs - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn session_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.ttl(), Duration::from_secs(3600));
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn provider_chain_default_order() {
        let cfg = RefineConfig::default();
        assert_eq!(cfg.providers, vec!["gemini", "groq", "openai"]);
    }
}
