//! # signstream-core - Landmark-to-Sentence Recognition
//!
//! This crate turns a live stream of per-frame hand-pose coordinates into a
//! stable sequence of recognized signs, assembles those signs into words, and
//! optionally rewrites the word list into fluent prose through a chain of
//! external language providers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Session (per connection)               │
//! │  ┌───────────┐  ┌────────────┐  ┌────────────┐  ┌─────────┐ │
//! │  │  Frame    │→ │  One-Euro  │→ │   Sign     │→ │  Vote   │ │
//! │  │ (21 pts)  │  │  Smoother  │  │ Classifier │  │ Buffer  │ │
//! │  └───────────┘  └────────────┘  └────────────┘  └─────────┘ │
//! │                                                      ↓       │
//! │  ┌──────────────┐                        ┌───────────────┐  │
//! │  │  Refinement  │←───────────────────────│   Sentence    │  │
//! │  │ Orchestrator │     refine request     │   Assembler   │  │
//! │  └──────────────┘                        └───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sessions live in a [`SessionRegistry`] with a periodic idle-eviction
//! sweep; the classifier and orchestrator are shared, immutable services.

pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod landmarks;
pub mod refine;
pub mod sentence;
pub mod session;
pub mod vote;

pub use classifier::{Classification, GestureRule, HandShape, SignClassifier};
pub use config::{FilterConfig, GeometryConfig, PipelineConfig, RefineConfig, SessionConfig};
pub use error::{SignError, SignResult};
pub use filter::{FrameSmoother, OneEuroFilter, SmoothOutcome};
pub use landmarks::{FaceAnchors, Frame, Point3, RawFrame, HAND_POINTS};
pub use refine::{
    basic_refinement, ChatCompletionsProvider, GeminiProvider, RefineProvider, Refined,
    RefinementOrchestrator,
};
pub use sentence::SentenceAssembler;
pub use session::{FrameOutcome, Session, SessionRegistry};
pub use vote::{StableSign, VoteBuffer};
