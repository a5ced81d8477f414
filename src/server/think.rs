//! `POST /api/think`: question in, normalized reasoning (plus label) out

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clients::{CompletionRequest, ModelError};
use crate::error::{GlassMindError, Result};
use crate::label::{LabelRecord, ModelInfo};
use crate::normalizer::{NormalizeOutcome, normalize_with_outcome};
use crate::prompts::{PromptParams, summarize_previous_questions};
use crate::server::AppState;
use crate::types::{AnalysisType, ReasoningDocument, UserProfile};

pub const QUESTION_REQUIRED: &str = "Question is required";

/// Validated request body
#[derive(Debug, Clone)]
pub struct ThinkRequest {
    pub question: String,
    pub analysis_type: AnalysisType,
    pub user_profile: UserProfile,
}

impl ThinkRequest {
    /// Validate a decoded JSON body. Only `question` is mandatory; a malformed
    /// `analysisType` or `userProfile` falls back to defaults.
    pub fn from_json(body: &Value) -> Result<Self> {
        let question = body
            .get("question")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| GlassMindError::Validation {
                message: QUESTION_REQUIRED.to_string(),
            })?;

        let analysis_type =
            AnalysisType::from_request(body.get("analysisType").and_then(Value::as_str));

        let user_profile = body
            .get("userProfile")
            .cloned()
            .and_then(|v| serde_json::from_value::<UserProfile>(v).ok())
            .unwrap_or_default();

        Ok(Self {
            question: question.to_string(),
            analysis_type,
            user_profile,
        })
    }
}

/// Response body: the document's fields, plus `label` when labels are enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkResponse {
    #[serde(flatten)]
    pub document: ReasoningDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelRecord>,
}

pub async fn think_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ThinkResponse>> {
    let body: Value = serde_json::from_slice(&body)?;
    let request = ThinkRequest::from_json(&body)?;
    Ok(Json(answer_question(&state, request).await?))
}

/// Compose the prompt, call the model, and normalize its reply.
pub async fn answer_question(state: &AppState, request: ThinkRequest) -> Result<ThinkResponse> {
    info!(
        "Answering question (chars={}, analysis={}, previous={})",
        request.question.chars().count(),
        request.analysis_type,
        request.user_profile.previous_questions.len()
    );

    let params = PromptParams {
        analysis_type: request.analysis_type,
        previous_questions_summary: summarize_previous_questions(
            &request.user_profile.previous_questions,
            &request.question,
            state.config.prompts.history_limit,
        ),
    };
    let completion = state
        .client
        .complete(&CompletionRequest {
            model: state.config.model.model.clone(),
            system_prompt: state.prompts.system_prompt(&params),
            user_message: request.question.clone(),
            temperature: state.config.model.temperature,
            max_tokens: state.config.model.max_tokens,
        })
        .await?;

    if completion.text.trim().is_empty() {
        return Err(ModelError::EmptyResponse.into());
    }

    let (document, outcome) = normalize_with_outcome(&completion.text);
    match outcome {
        NormalizeOutcome::Structured => debug!(
            "Model reply normalized (steps={}, follow_ups={})",
            document.step_count(),
            document.follow_up_questions.as_ref().map_or(0, Vec::len)
        ),
        NormalizeOutcome::Fallback => warn!(
            "Model reply was not structured JSON (chars={}); returned fallback document",
            completion.text.len()
        ),
    }

    let label = state.config.label.enabled.then(|| {
        LabelRecord::generate(
            &request.question,
            &document,
            request.analysis_type,
            ModelInfo {
                provider: state.config.label.provider.clone(),
                name: state.config.label.model_name.clone(),
                version: state.config.model.model.clone(),
            },
            &state.config.label.training_data_cutoff,
        )
    });

    Ok(ThinkResponse { document, label })
}
