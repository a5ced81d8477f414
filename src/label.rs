//! Heuristic transparency labels
//!
//! A label summarizes how much to trust a response: confidence scores, risk
//! flags, sourcing notes, and a transparency score. Everything is derived
//! from keyword matches over the question and the normalized document plus a
//! fixed scoring table per analysis style. [`assess`] is deterministic;
//! [`LabelRecord`] adds the id, timestamp, and model identity.
//!
//! This module only reads a finished [`ReasoningDocument`] and never feeds
//! back into normalization.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AnalysisType, ReasoningDocument};

static FINANCIAL_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)invest|money|financial|stock|trading|portfolio|budget|loan|mortgage|insurance|retirement",
    )
    .unwrap()
});

static MEDICAL_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)health|medical|disease|symptom|treatment|drug|medication|diagnosis|therapy|doctor",
    )
    .unwrap()
});

static LEGAL_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)legal|law|contract|lawsuit|attorney|court|regulation|compliance|liability")
        .unwrap()
});

const IMPLICIT_SOURCES: [&str; 3] = ["Training data", "Pattern recognition", "Reasoning frameworks"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    Basic,
    Enhanced,
    Premium,
}

impl VerificationLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            VerificationLevel::Premium
        } else if score >= 70 {
            VerificationLevel::Enhanced
        } else {
            VerificationLevel::Basic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub provider: String,
    pub name: String,
    pub version: String,
}

/// Scores on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub overall: u8,
    pub reasoning: u8,
    pub factual: u8,
    pub creative: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub cited: Vec<String>,
    pub implicit: Vec<String>,
    pub training_data_cutoff: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub hallucination_risk: RiskLevel,
    pub bias_risk: RiskLevel,
    pub sensitive_data: bool,
    pub financial_advice: bool,
    pub medical_advice: bool,
    pub legal_advice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certifications {
    pub ainl_certified: bool,
    pub transparency_score: u8,
    pub verification_level: VerificationLevel,
}

/// Sensitive-domain keyword hits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermFlags {
    pub financial: bool,
    pub medical: bool,
    pub legal: bool,
}

impl TermFlags {
    pub fn detect(text: &str) -> Self {
        Self {
            financial: FINANCIAL_TERMS.is_match(text),
            medical: MEDICAL_TERMS.is_match(text),
            legal: LEGAL_TERMS.is_match(text),
        }
    }

    pub fn any(&self) -> bool {
        self.financial || self.medical || self.legal
    }
}

/// Deterministic part of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelAssessment {
    pub confidence: ConfidenceScores,
    pub risks: RiskAssessment,
    pub certifications: Certifications,
}

/// Base confidence per analysis style
pub fn base_confidence(analysis_type: AnalysisType) -> u8 {
    match analysis_type {
        AnalysisType::Comprehensive => 85,
        AnalysisType::Strategic => 80,
        AnalysisType::Practical => 90,
        AnalysisType::Creative => 75,
        AnalysisType::RiskFocused => 88,
        AnalysisType::QuickDecision => 82,
    }
}

/// Score a response. Pure: same inputs always give the same assessment.
pub fn assess(
    question: &str,
    document: &ReasoningDocument,
    analysis_type: AnalysisType,
) -> LabelAssessment {
    let rendered = serde_json::to_string(document).unwrap_or_default();
    let terms = TermFlags::detect(&format!("{question}{rendered}"));
    let base = base_confidence(analysis_type);
    let steps = document.step_count();

    let confidence = ConfidenceScores {
        overall: (base + if steps > 4 { 5 } else { 0 }).min(100),
        reasoning: (base + 5).min(100),
        factual: if terms.any() { base - 10 } else { base },
        creative: if analysis_type == AnalysisType::Creative {
            90
        } else {
            base - 10
        },
    };

    let mut hallucination_risk = RiskLevel::Low;
    let mut bias_risk = RiskLevel::Low;
    if terms.any() {
        hallucination_risk = RiskLevel::Medium;
        bias_risk = RiskLevel::Medium;
    }
    if analysis_type == AnalysisType::Creative {
        hallucination_risk = RiskLevel::Medium;
    }
    if analysis_type == AnalysisType::QuickDecision {
        bias_risk = RiskLevel::Medium;
    }

    let risks = RiskAssessment {
        hallucination_risk,
        bias_risk,
        sensitive_data: false,
        financial_advice: terms.financial,
        medical_advice: terms.medical,
        legal_advice: terms.legal,
    };

    let transparency_score = transparency_score(document, analysis_type);
    LabelAssessment {
        confidence,
        risks,
        certifications: Certifications {
            ainl_certified: true,
            transparency_score,
            verification_level: VerificationLevel::from_score(transparency_score),
        },
    }
}

fn transparency_score(document: &ReasoningDocument, analysis_type: AnalysisType) -> u8 {
    let mut score: u8 = 70;
    if document.step_count() >= 5 {
        score += 15;
    }
    if document.has_follow_ups() {
        score += 10;
    }
    if analysis_type == AnalysisType::Comprehensive {
        score += 5;
    }
    score.min(100)
}

/// Full transparency label attached to a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub model: ModelInfo,
    pub confidence: ConfidenceScores,
    pub sources: SourceInfo,
    pub risks: RiskAssessment,
    pub certifications: Certifications,
}

impl LabelRecord {
    pub fn generate(
        question: &str,
        document: &ReasoningDocument,
        analysis_type: AnalysisType,
        model: ModelInfo,
        training_data_cutoff: &str,
    ) -> Self {
        Self::from_assessment(
            assess(question, document, analysis_type),
            model,
            training_data_cutoff,
        )
    }

    pub fn from_assessment(
        assessment: LabelAssessment,
        model: ModelInfo,
        training_data_cutoff: &str,
    ) -> Self {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("ainl_{}_{}", now.timestamp_millis(), &suffix[..9]),
            timestamp: now,
            model,
            confidence: assessment.confidence,
            sources: SourceInfo {
                // No retrieval step, so nothing is ever cited
                cited: Vec::new(),
                implicit: IMPLICIT_SOURCES.iter().map(|s| s.to_string()).collect(),
                training_data_cutoff: training_data_cutoff.to_string(),
            },
            risks: assessment.risks,
            certifications: assessment.certifications,
        }
    }
}
