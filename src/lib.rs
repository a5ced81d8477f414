//! # glass-mind
//!
//! A thin HTTP service that asks a hosted language model to show its
//! reasoning, then normalizes whatever text comes back into a structured
//! [`ReasoningDocument`](types::ReasoningDocument), optionally annotated with
//! a heuristic transparency label.

pub mod clients;
pub mod config;
pub mod error;
pub mod label;
pub mod normalizer;
pub mod prompts;
pub mod server;
pub mod types;

pub use error::{GlassMindError, Result};
pub use normalizer::{NormalizeOutcome, normalize, normalize_with_outcome};
pub use types::{AnalysisType, ReasoningDocument, ReasoningStep, UserProfile};

