//! Versioned prompt templates and the system-prompt composer
//!
//! Each analysis style owns one template record. Templates carry a stable id,
//! a version, and a SHA1 checksum of their text so a served prompt can be
//! traced back to the exact wording that produced it. Composition is plain
//! placeholder replacement; there is no templating engine.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::types::AnalysisType;

pub const PLACEHOLDER_ANALYSIS_TYPE: &str = "analysisType";
pub const PLACEHOLDER_PREVIOUS_QUESTIONS: &str = "previousQuestionsSummary";

pub const NO_PREVIOUS_QUESTIONS: &str = "No previous questions in this session.";

const TEMPLATE_VERSION: &str = "1.0.0";

const PREAMBLE: &str = "You are an AI that shows its complete reasoning process. \
The user has asked for a {{analysisType}} analysis.";

const SESSION_CONTEXT: &str = "Questions the user asked earlier in this session \
(use them to keep your answer consistent, do not answer them again):
{{previousQuestionsSummary}}";

const REASONING_RULES: &str = "When given any question, you must:

1. Break down your thinking into clear, distinct steps
2. Question your own assumptions explicitly
3. Identify what information would make you more confident
4. Show trade-offs and alternative perspectives
5. Provide a final conclusion";

const OUTPUT_CONTRACT: &str = r#"Structure your response as a JSON object with this exact format:
{
  "thinking": [
    {
      "label": "Understanding the Question",
      "content": "What I understand about this question and how I'm interpreting it..."
    },
    {
      "label": "My Approach",
      "content": "The method/framework I'm using to think through this..."
    },
    {
      "label": "Key Assumptions",
      "content": "What I'm assuming that might be wrong, and how that would change my analysis..."
    },
    {
      "label": "Missing Information",
      "content": "What additional context would make my reasoning more reliable..."
    },
    {
      "label": "Alternative Perspectives",
      "content": "Other ways to look at this problem and potential counterarguments..."
    }
  ],
  "conclusion": "Your final answer/recommendation based on the reasoning above",
  "followUpQuestions": [
    "A specific question that would deepen this analysis",
    "A question that challenges the conclusion",
    "A question about next steps"
  ]
}

Be specific and detailed in each step. Show your actual thought process, not generic statements.
Question yourself genuinely. Respond with the JSON object only, without code fences or commentary."#;

/// A versioned system-prompt template for one analysis style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Stable identifier (format: think-<style>-v1)
    pub id: String,
    pub analysis_type: AnalysisType,
    pub one_liner: String,
    pub version: String,
    /// SHA1 of the template text
    pub checksum: String,
    pub template: String,
}

impl PromptTemplate {
    pub fn new(
        analysis_type: AnalysisType,
        one_liner: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        let template = template.into();
        let checksum = sha1_checksum(&template);
        Self {
            id: format!("think-{}-v1", analysis_type.as_str()),
            analysis_type,
            one_liner: one_liner.into(),
            version: TEMPLATE_VERSION.to_string(),
            checksum,
            template,
        }
    }

    /// Substitute `params` into this template.
    pub fn render(&self, params: &PromptParams) -> String {
        compose(&self.template, params)
    }
}

fn sha1_checksum(content: &str) -> String {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Values recognized by [`compose`]
#[derive(Debug, Clone, Default)]
pub struct PromptParams {
    pub analysis_type: AnalysisType,
    pub previous_questions_summary: String,
}

/// Replace `{{name}}` placeholders in `template`.
///
/// Only the first occurrence of each recognized name is replaced. Unknown
/// names and repeated occurrences stay literal. Substituted values are never
/// rescanned, so a value containing `{{...}}` is emitted as-is.
pub fn compose(template: &str, params: &PromptParams) -> String {
    let values: [(&'static str, &str); 2] = [
        (PLACEHOLDER_ANALYSIS_TYPE, params.analysis_type.as_str()),
        (
            PLACEHOLDER_PREVIOUS_QUESTIONS,
            params.previous_questions_summary.as_str(),
        ),
    ];

    let mut out = String::with_capacity(template.len() + params.previous_questions_summary.len());
    let mut used: HashSet<&'static str> = HashSet::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let inner = &rest[open + 2..];
        let Some(close) = inner.find("}}") else {
            break;
        };
        let name = inner[..close].trim();
        out.push_str(&rest[..open]);
        match values.iter().find(|(key, _)| *key == name) {
            Some((key, value)) if used.insert(*key) => out.push_str(value),
            _ => out.push_str(&rest[open..open + close + 4]),
        }
        rest = &inner[close + 2..];
    }
    out.push_str(rest);
    out
}

/// Render the caller's earlier questions as a numbered list.
///
/// Keeps the most recent `limit` non-blank entries, skipping any that repeat
/// the current question.
pub fn summarize_previous_questions(previous: &[String], current: &str, limit: usize) -> String {
    let current = current.trim();
    let kept: Vec<&str> = previous
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty() && *q != current)
        .collect();
    let start = kept.len().saturating_sub(limit);
    let recent = &kept[start..];

    if recent.is_empty() {
        return NO_PREVIOUS_QUESTIONS.to_string();
    }
    recent
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Registry of prompt templates keyed by analysis style
#[derive(Debug, Default)]
pub struct PromptRegistry {
    templates: HashMap<AnalysisType, Arc<PromptTemplate>>,
}

impl PromptRegistry {
    /// Create a registry holding the built-in template for every analysis style
    pub fn new() -> Self {
        let mut registry = Self::default();
        for analysis_type in AnalysisType::ALL {
            registry.register(PromptTemplate::new(
                analysis_type,
                analysis_type.title(),
                build_template(focus_for(analysis_type)),
            ));
        }
        registry
    }

    /// Add or replace the template for its analysis style
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates
            .insert(template.analysis_type, Arc::new(template));
    }

    pub fn get(&self, analysis_type: AnalysisType) -> Option<Arc<PromptTemplate>> {
        self.templates.get(&analysis_type).cloned()
    }

    /// All templates, in analysis-style order
    pub fn list(&self) -> Vec<Arc<PromptTemplate>> {
        AnalysisType::ALL
            .iter()
            .filter_map(|t| self.templates.get(t).cloned())
            .collect()
    }

    /// Compose the system prompt for one request
    pub fn system_prompt(&self, params: &PromptParams) -> String {
        match self.get(params.analysis_type) {
            Some(template) => template.render(params),
            None => compose(
                &build_template(focus_for(params.analysis_type)),
                params,
            ),
        }
    }
}

fn build_template(focus: &str) -> String {
    [PREAMBLE, focus, SESSION_CONTEXT, REASONING_RULES, OUTPUT_CONTRACT].join("\n\n")
}

fn focus_for(analysis_type: AnalysisType) -> &'static str {
    match analysis_type {
        AnalysisType::Comprehensive => {
            "Cover the question from every relevant angle: context, options, evidence, \
             risks, and long-term consequences. Favor completeness over brevity."
        }
        AnalysisType::Strategic => {
            "Focus on strategy: competitive position, resource allocation, stakeholder \
             impact, and how each option plays out over the next one to three years."
        }
        AnalysisType::Practical => {
            "Focus on action: concrete next steps, who does what, required resources, \
             and what can be started this week."
        }
        AnalysisType::Creative => {
            "Focus on unconventional options: reframe the problem, borrow ideas from other \
             fields, and include at least one idea that seems counterintuitive."
        }
        AnalysisType::RiskFocused => {
            "Focus on risk: what could go wrong, how likely and how severe each failure \
             is, early warning signs, and mitigations."
        }
        AnalysisType::QuickDecision => {
            "The user needs to decide quickly. Keep each step short, name the single most \
             important factor, and give a clear recommendation."
        }
    }
}
