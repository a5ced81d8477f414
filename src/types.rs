//! Shared data model for questions, analysis styles, and reasoning documents

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One labeled unit of exposed reasoning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub label: String,
    pub content: String,
}

impl ReasoningStep {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Structured reasoning returned to the caller.
///
/// After normalization `thinking` and `conclusion` are non-empty, and
/// `follow_up_questions`, when present, holds at least one non-blank entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningDocument {
    pub thinking: Vec<ReasoningStep>,
    pub conclusion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
}

impl ReasoningDocument {
    pub fn step_count(&self) -> usize {
        self.thinking.len()
    }

    pub fn has_follow_ups(&self) -> bool {
        self.follow_up_questions
            .as_ref()
            .is_some_and(|qs| !qs.is_empty())
    }
}

/// Analysis style selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    #[default]
    Comprehensive,
    Strategic,
    Practical,
    Creative,
    RiskFocused,
    QuickDecision,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 6] = [
        AnalysisType::Comprehensive,
        AnalysisType::Strategic,
        AnalysisType::Practical,
        AnalysisType::Creative,
        AnalysisType::RiskFocused,
        AnalysisType::QuickDecision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "comprehensive",
            AnalysisType::Strategic => "strategic",
            AnalysisType::Practical => "practical",
            AnalysisType::Creative => "creative",
            AnalysisType::RiskFocused => "risk-focused",
            AnalysisType::QuickDecision => "quick-decision",
        }
    }

    /// Human-facing title, as shown in the analysis selector
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "Comprehensive Analysis",
            AnalysisType::Strategic => "Strategic Business Focus",
            AnalysisType::Practical => "Practical Action Steps",
            AnalysisType::Creative => "Creative Problem Solving",
            AnalysisType::RiskFocused => "Risk Assessment Focus",
            AnalysisType::QuickDecision => "Quick Decision Framework",
        }
    }

    /// Resolve a caller-supplied value; anything unrecognized falls back to the default.
    pub fn from_request(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        AnalysisType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown analysis type: {s}"))
    }
}

/// Light per-caller context, owned by the caller and resent on every request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub previous_questions: Vec<String>,
}
