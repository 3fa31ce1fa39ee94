//! Large-language-model access: a small provider trait with one HTTP
//! implementation per vendor, selected from configuration.

mod anthropic;
mod gemini;
pub mod normalize;
mod openai;
pub mod prompt;

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use normalize::CorrectIndexPolicy;
pub use openai::OpenAiProvider;

use crate::models::{Difficulty, ParsedDraft, Resource};
use prompt::ExplanationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Fallback order when no provider is named.
    pub const PRECEDENCE: [ProviderKind; 3] =
        [ProviderKind::OpenAi, ProviderKind::Anthropic, ProviderKind::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(AiError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no AI provider configured; set AI_PROVIDER and the matching API key")]
    NoProviderConfigured,
    #[error("missing API key for AI provider {0}")]
    MissingCredentials(ProviderKind),
    #[error("unknown AI provider: {0}")]
    UnknownProvider(String),
    #[error("request to AI provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

/// Raw completion text plus provider-specific metadata (model used, ids,
/// discovery details).
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub meta: serde_json::Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn generate(&self, prompt: &str) -> Result<Completion, AiError>;
}

/// Provider credentials and tuning, read from flags or the environment.
#[derive(Debug, Clone, clap::Args)]
pub struct AiConfig {
    /// Default provider: openai, anthropic or gemini.
    #[arg(long, env = "AI_PROVIDER")]
    pub ai_provider: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-3-5-haiku-latest")]
    pub anthropic_model: String,

    /// Also read from GOOGLE_API_KEY when unset.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Explicit Gemini model; discovered from the model listing when unset.
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// Timeout for every provider request, in seconds.
    #[arg(long, env = "AI_TIMEOUT_SECS", default_value_t = 30)]
    pub ai_timeout_secs: u64,

    /// How to treat generated items whose correct answer cannot be resolved.
    #[arg(long, env = "AI_CORRECT_INDEX_POLICY", value_enum, default_value_t = CorrectIndexPolicy::Strict)]
    pub ai_correct_index_policy: CorrectIndexPolicy,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            ai_provider: None,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            anthropic_api_key: None,
            anthropic_model: "claude-3-5-haiku-latest".to_string(),
            gemini_api_key: None,
            gemini_model: None,
            ai_timeout_secs: 30,
            ai_correct_index_policy: CorrectIndexPolicy::Strict,
        }
    }
}

fn present(key: &Option<String>) -> Option<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

/// Everything a draft row needs from one question-generation call.
#[derive(Debug, Clone)]
pub struct GeneratedQuestions {
    pub provider: ProviderKind,
    pub prompt: String,
    pub raw: String,
    pub parsed: ParsedDraft,
    pub meta: serde_json::Value,
}

/// A failed generation, with as much context as was known when it failed.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct GenerationError {
    pub provider: Option<ProviderKind>,
    pub prompt: String,
    #[source]
    pub source: AiError,
}

#[derive(Debug, Clone)]
pub struct GeneratedExplanation {
    pub provider: ProviderKind,
    pub summary: String,
    pub resources: Vec<Resource>,
}

pub struct AiService {
    providers: HashMap<ProviderKind, Arc<dyn LlmProvider>>,
    default_provider: Option<String>,
    policy: CorrectIndexPolicy,
}

impl AiService {
    /// Build one provider per configured credential, sharing an HTTP client
    /// with the configured timeout.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs.max(1)))
            .build()?;

        let gemini_key = present(&config.gemini_api_key)
            .or_else(|| present(&std::env::var("GOOGLE_API_KEY").ok()));

        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        if let Some(key) = present(&config.openai_api_key) {
            providers.push(Arc::new(OpenAiProvider::new(
                client.clone(),
                key,
                config.openai_model.clone(),
            )));
        }
        if let Some(key) = present(&config.anthropic_api_key) {
            providers.push(Arc::new(AnthropicProvider::new(
                client.clone(),
                key,
                config.anthropic_model.clone(),
            )));
        }
        if let Some(key) = gemini_key {
            providers.push(Arc::new(GeminiProvider::new(
                client,
                key,
                present(&config.gemini_model),
            )));
        }

        let service = Self::with_providers(
            providers,
            present(&config.ai_provider),
            config.ai_correct_index_policy,
        );
        let available: Vec<_> = ProviderKind::PRECEDENCE
            .iter()
            .filter(|k| service.providers.contains_key(*k))
            .map(ProviderKind::as_str)
            .collect();
        tracing::info!(
            "AI providers available: {available:?}, default={:?}, policy={:?}",
            service.default_provider,
            service.policy
        );

        Ok(service)
    }

    pub fn with_providers(
        providers: Vec<Arc<dyn LlmProvider>>,
        default_provider: Option<String>,
        policy: CorrectIndexPolicy,
    ) -> Self {
        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();
        Self {
            providers,
            default_provider,
            policy,
        }
    }

    pub fn policy(&self) -> CorrectIndexPolicy {
        self.policy
    }

    /// Explicit name, then the configured default, then the first provider
    /// with a credential in [`ProviderKind::PRECEDENCE`] order.
    pub fn select(&self, explicit: Option<&str>) -> Result<Arc<dyn LlmProvider>, AiError> {
        let named = explicit
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or(self.default_provider.as_deref());

        if let Some(name) = named {
            let kind: ProviderKind = name.parse()?;
            return self
                .providers
                .get(&kind)
                .cloned()
                .ok_or(AiError::MissingCredentials(kind));
        }

        ProviderKind::PRECEDENCE
            .iter()
            .find_map(|kind| self.providers.get(kind).cloned())
            .ok_or(AiError::NoProviderConfigured)
    }

    pub async fn generate_questions(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: i64,
        explicit: Option<&str>,
    ) -> Result<GeneratedQuestions, GenerationError> {
        let prompt = prompt::question_prompt(topic, difficulty, count);

        let provider = self.select(explicit).map_err(|source| GenerationError {
            provider: None,
            prompt: prompt.clone(),
            source,
        })?;
        let kind = provider.kind();

        tracing::info!("generating {count} {difficulty} questions on {topic:?} via {kind}");

        let completion = provider
            .generate(&prompt)
            .await
            .map_err(|source| GenerationError {
                provider: Some(kind),
                prompt: prompt.clone(),
                source,
            })?;

        let parsed = normalize::normalize_response(&completion.text, self.policy);
        tracing::info!("{kind} returned {} usable items", parsed.items.len());

        Ok(GeneratedQuestions {
            provider: kind,
            prompt,
            raw: completion.text,
            parsed,
            meta: completion.meta,
        })
    }

    pub async fn explain(
        &self,
        ctx: &ExplanationContext<'_>,
    ) -> Result<GeneratedExplanation, AiError> {
        let provider = self.select(None)?;
        let completion = provider
            .generate(&prompt::explanation_prompt(ctx))
            .await?;
        let (summary, resources) = normalize::parse_explanation(&completion.text);

        Ok(GeneratedExplanation {
            provider: provider.kind(),
            summary,
            resources,
        })
    }
}

/// Turn a non-success response into [`AiError::Provider`], keeping the body
/// for the draft's error text.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::error!("AI provider error: {status} - {body}");
    Err(AiError::Provider {
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}
