use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{check_status, AiError, Completion, LlmProvider, ProviderKind};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const LISTED_MODELS_IN_META: usize = 25;

/// Tried in order against the listing when no explicit model is usable.
const PREFERRED_MODELS: &[&str] = &[
    "gemini-flash-latest",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-2.5-pro",
    "gemini-1.5-pro-latest",
    "gemini-1.5-pro",
    "gemini-pro",
];

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    explicit_model: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, api_key: String, explicit_model: Option<String>) -> Self {
        Self {
            client,
            api_key,
            explicit_model,
        }
    }

    /// Plain ids of models supporting `generateContent`. Listing failures
    /// are logged and yield an empty list.
    async fn list_models(&self) -> Vec<String> {
        let result = async {
            let resp = self
                .client
                .get(format!("{API_BASE}/models"))
                .header("x-goog-api-key", &self.api_key)
                .send()
                .await?;
            let listing: ModelListing = check_status(resp).await?.json().await?;
            Ok::<_, AiError>(listing)
        }
        .await;

        match result {
            Ok(listing) => listing
                .models
                .into_iter()
                .filter(|m| {
                    m.supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
                })
                .map(|m| plain_model_id(&m.name).to_string())
                .collect(),
            Err(e) => {
                tracing::warn!("gemini model listing failed: {e}");
                Vec::new()
            }
        }
    }
}

#[derive(Deserialize)]
struct ModelListing {
    #[serde(default)]
    models: Vec<ListedModel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// `models/gemini-pro` -> `gemini-pro`.
fn plain_model_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// The explicit model when the listing is empty or contains it; else the
/// first preferred model present in the listing; else the first listed
/// model; else the first preferred model.
pub(super) fn choose_model(explicit: Option<&str>, listed: &[String]) -> String {
    if let Some(explicit) = explicit {
        let plain = plain_model_id(explicit);
        if listed.is_empty() || listed.iter().any(|m| m == plain) {
            return plain.to_string();
        }
    }

    PREFERRED_MODELS
        .iter()
        .find(|p| listed.iter().any(|m| m == *p))
        .map(|p| p.to_string())
        .or_else(|| listed.first().cloned())
        .unwrap_or_else(|| PREFERRED_MODELS[0].to_string())
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, AiError> {
        let listed = self.list_models().await;
        let model = choose_model(self.explicit_model.as_deref(), &listed);
        tracing::debug!("gemini model chosen: {model}");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.3 },
        });

        let resp = self
            .client
            .post(format!("{API_BASE}/models/{model}:generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp: GenerateResponse = check_status(resp).await?.json().await?;

        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(Completion {
            text,
            meta: json!({
                "model": model,
                "explicit_model": self.explicit_model,
                "listed_models": listed.iter().take(LISTED_MODELS_IN_META).collect::<Vec<_>>(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn explicit_model_wins_when_listed_or_listing_failed() {
        assert_eq!(choose_model(Some("gemini-pro"), &[]), "gemini-pro");
        assert_eq!(
            choose_model(Some("models/gemini-pro"), &listed(&["gemini-2.5-flash", "gemini-pro"])),
            "gemini-pro"
        );
    }

    #[test]
    fn unlisted_explicit_model_falls_back_to_preferred() {
        let models = listed(&["gemini-1.5-pro", "gemini-2.5-flash", "embedding-001"]);
        assert_eq!(choose_model(Some("gemini-9-ultra"), &models), "gemini-2.5-flash");
        assert_eq!(choose_model(None, &models), "gemini-2.5-flash");
    }

    #[test]
    fn unknown_listing_uses_first_listed_then_default() {
        assert_eq!(choose_model(None, &listed(&["custom-model"])), "custom-model");
        assert_eq!(choose_model(None, &[]), "gemini-flash-latest");
    }
}
