//! Narrative flavor lines for battle actions.
//!
//! The battle engine only ever talks to [`Commentator`], which never fails:
//! provider errors, timeouts and empty responses degrade to a fixed template.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::combat::logic::battle_calculations::Effectiveness;
use crate::config::CommentaryConfig;

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("commentary request failed")]
    Transport(#[from] reqwest::Error),

    #[error("commentary service returned status {0}")]
    Status(u16),

    #[error("commentary service returned no text")]
    EmptyResponse,

    #[error("commentary timed out after {0:?}")]
    Timeout(Duration),

    #[error("commentary unavailable: {0}")]
    Unavailable(String),
}

/// One attack to narrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryRequest {
    pub attacker: String,
    pub defender: String,
    pub move_name: String,
    pub critical: bool,
    pub effectiveness: Effectiveness,
}

impl CommentaryRequest {
    pub fn fallback_line(&self) -> String {
        format!("{} used {}!", self.attacker, self.move_name)
    }
}

pub fn fallback_victory_line(winner: &str) -> String {
    format!("{} won!", winner)
}

/// External text generator
#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    async fn battle_line(&self, request: &CommentaryRequest) -> Result<String, CommentaryError>;

    async fn victory_line(&self, winner: &str, loser: &str) -> Result<String, CommentaryError>;
}

/// Provider that always answers with the deterministic template
#[derive(Debug, Clone, Default)]
pub struct TemplateCommentary;

#[async_trait]
impl CommentaryProvider for TemplateCommentary {
    async fn battle_line(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        Ok(request.fallback_line())
    }

    async fn victory_line(&self, winner: &str, _loser: &str) -> Result<String, CommentaryError> {
        Ok(fallback_victory_line(winner))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Generative Language API client
pub struct GeminiCommentary {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiCommentary {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        GeminiCommentary {
            http_client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn battle_prompt(request: &CommentaryRequest) -> String {
        format!(
            "Write a short, dramatic Pokémon-style battle line for: {} used {} on {}.\n\
             Effectiveness: {}.\n\
             Critical hit: {}.\n\
             Keep it under 15 words and in English.",
            request.attacker,
            request.move_name,
            request.defender,
            request.effectiveness.as_str(),
            request.critical
        )
    }

    fn victory_prompt(winner: &str, loser: &str) -> String {
        format!(
            "Write a victory message for {} who just defeated {} in a Gemimon battle. Under 15 words.",
            winner, loser
        )
    }

    async fn generate(&self, prompt: String, generation_config: Option<GenerationConfig>) -> Result<String, CommentaryError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config,
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CommentaryError::Status(response.status().as_u16()));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.text().ok_or(CommentaryError::EmptyResponse)
    }
}

#[async_trait]
impl CommentaryProvider for GeminiCommentary {
    async fn battle_line(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        let config = GenerationConfig {
            temperature: 0.8,
            top_p: 0.95,
        };
        self.generate(Self::battle_prompt(request), Some(config)).await
    }

    async fn victory_line(&self, winner: &str, loser: &str) -> Result<String, CommentaryError> {
        self.generate(Self::victory_prompt(winner, loser), None).await
    }
}

/// Infallible front for a provider: applies a timeout and substitutes the
/// template line on any failure.
#[derive(Clone)]
pub struct Commentator {
    provider: Arc<dyn CommentaryProvider>,
    timeout: Duration,
}

impl Commentator {
    pub fn new(provider: Arc<dyn CommentaryProvider>, timeout: Duration) -> Self {
        Commentator { provider, timeout }
    }

    /// Template-only commentary
    pub fn template() -> Self {
        Self::new(Arc::new(TemplateCommentary), Duration::from_secs(1))
    }

    /// Gemini when an API key is configured, the template otherwise
    pub fn from_config(config: &CommentaryConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                tracing::info!("Using {} for battle commentary", config.model);
                Self::new(Arc::new(GeminiCommentary::new(&config.endpoint, &config.model, key)), timeout)
            }
            _ => {
                tracing::info!("No commentary API key configured, using template commentary");
                Self::new(Arc::new(TemplateCommentary), timeout)
            }
        }
    }

    pub async fn battle_line(&self, request: &CommentaryRequest) -> String {
        self.narrate("battle", self.provider.battle_line(request), || request.fallback_line())
            .await
    }

    pub async fn victory_line(&self, winner: &str, loser: &str) -> String {
        self.narrate("victory", self.provider.victory_line(winner, loser), || fallback_victory_line(winner))
            .await
    }

    /// Bound `line` by the timeout and fall back on an error or a blank answer
    async fn narrate<F>(&self, kind: &str, line: F, fallback: impl FnOnce() -> String) -> String
    where
        F: Future<Output = Result<String, CommentaryError>>,
    {
        let result = match tokio::time::timeout(self.timeout, line).await {
            Ok(result) => result,
            Err(_) => Err(CommentaryError::Timeout(self.timeout)),
        };
        match result.map(|line| line.trim().to_string()) {
            Ok(line) if !line.is_empty() => line,
            Ok(_) => {
                warn!("Commentary provider returned an empty {} line", kind);
                fallback()
            }
            Err(e) => {
                warn!("Commentary provider failed on a {} line: {}", kind, e);
                fallback()
            }
        }
    }
}
