//! Assistant service
//!
//! Optional AI helpers: breaking a task into steps and writing a short daily
//! summary. Every failure (missing key, network, malformed answer) is logged
//! and replaced with a fixed fallback; nothing here returns an error to the
//! caller.

use crate::config::{
    API_KEY_ENV_VARS, ASSISTANT_BASE_URL, ASSISTANT_MODEL, MAX_SUBTASKS, MIN_SUBTASKS,
    SUMMARY_ALL_CAUGHT_UP, SUMMARY_EMPTY_FALLBACK, SUMMARY_ERROR_FALLBACK,
};
use crate::error::{AppError, Result};
use crate::models::Task;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single text generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// When set, the model is asked to answer with JSON matching this schema
    pub response_schema: Option<serde_json::Value>,
}

/// Text generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

/// Client for the Gemini `generateContent` REST endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create client from environment variables, `None` if no key is set
    pub fn from_env() -> Option<Self> {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))?;
        Some(Self::new(ASSISTANT_BASE_URL, api_key, ASSISTANT_MODEL))
    }

    /// Create with explicit configuration
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn build_body(request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
        });

        if let Some(schema) = &request.response_schema {
            body["generationConfig"] = serde_json::json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        body
    }
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize, Debug)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Assistant(format!(
                "Generation request returned status: {}",
                status
            )));
        }

        let body: GenerateContentResponse = response.json().await?;
        Ok(body.text())
    }
}

/// Pending task as sent to the assistant for summaries
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryTask<'a> {
    title: &'a str,
    description: &'a str,
    priority: String,
    due_date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakdownResponse {
    #[serde(default)]
    sub_tasks: Vec<String>,
}

/// Service wrapping an optional text generator with fallbacks
#[derive(Clone, Default)]
pub struct AssistantService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AssistantService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Assistant backed by Gemini when an API key is configured
    pub fn from_env() -> Self {
        match GeminiClient::from_env() {
            Some(client) => Self::new(Some(Arc::new(client))),
            None => {
                tracing::info!("No assistant API key configured, AI features disabled");
                Self::new(None)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Suggest 3-5 actionable steps; empty on any failure
    pub async fn breakdown(&self, title: &str, description: &str) -> Vec<String> {
        let Some(generator) = &self.generator else {
            tracing::debug!("Assistant disabled, no breakdown for '{}'", title);
            return Vec::new();
        };

        let request = GenerationRequest {
            prompt: format!(
                "Break down the following task into a list of {}-{} small, actionable sub-tasks:\n\
                 Title: {}\n\
                 Description: {}",
                MIN_SUBTASKS, MAX_SUBTASKS, title, description
            ),
            response_schema: Some(breakdown_schema()),
        };

        match generator.generate(request).await.and_then(|text| parse_breakdown(&text)) {
            Ok(steps) => {
                tracing::info!("Assistant suggested {} steps for '{}'", steps.len(), title);
                steps
            }
            Err(e) => {
                tracing::warn!("AI breakdown failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Short motivational summary of the pending tasks in `tasks`.
    ///
    /// With nothing pending the static "all caught up" text is returned
    /// without calling the assistant.
    pub async fn daily_summary(&self, tasks: &[Task]) -> String {
        let pending: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
        if pending.is_empty() {
            return SUMMARY_ALL_CAUGHT_UP.to_string();
        }

        let Some(generator) = &self.generator else {
            return SUMMARY_ERROR_FALLBACK.to_string();
        };

        let payload: Vec<SummaryTask<'_>> = pending
            .iter()
            .map(|t| SummaryTask {
                title: &t.title,
                description: &t.description,
                priority: t.priority.to_string(),
                due_date: t.due_date.to_rfc3339(),
            })
            .collect();

        let tasks_json = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode tasks for summary: {}", e);
                return SUMMARY_ERROR_FALLBACK.to_string();
            }
        };

        let request = GenerationRequest {
            prompt: format!(
                "Provide a short, motivating 2-sentence summary of the user's workload for today based on these tasks: {}",
                tasks_json
            ),
            response_schema: None,
        };

        match generator.generate(request).await {
            Ok(text) if text.trim().is_empty() => SUMMARY_EMPTY_FALLBACK.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("AI summary failed: {}", e);
                SUMMARY_ERROR_FALLBACK.to_string()
            }
        }
    }
}

fn breakdown_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "subTasks": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of actionable sub-tasks"
            }
        },
        "required": ["subTasks"]
    })
}

/// Parse the `{"subTasks": [...]}` answer, tolerating a fenced code block
fn parse_breakdown(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    let parsed: BreakdownResponse = serde_json::from_str(json.trim())?;

    Ok(parsed
        .sub_tasks
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SUBTASKS)
        .collect())
}
