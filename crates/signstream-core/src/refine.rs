//! Sentence refinement via ranked external text-generation providers.
//!
//! Providers are tried in configured priority order, each under its own
//! bounded timeout; the first success wins and its text is returned verbatim
//! (trimmed). A provider that is unreachable, errors, times out, or has no
//! credential falls through to the next. The deterministic local fallback
//! cannot fail, so the chain always produces a result.

use crate::config::RefineConfig;
use crate::error::{SignError, SignResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const CHAT_SYSTEM_PROMPT: &str = "You are an ASL (American Sign Language) translator. \
    Convert ASL word sequences into proper, grammatically correct English sentences. \
    ASL has different grammar from English - signs may be in different order, \
    lack articles (a, an, the), and use different word forms. \
    Return ONLY the refined sentence, nothing else.";

/// One refinement attempt against an external provider.
#[async_trait]
pub trait RefineProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, text: &str) -> SignResult<String>;
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// OpenAI-compatible request/response; Groq and OpenAI share the shape.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Chat-completions provider (Groq, OpenAI).
pub struct ChatCompletionsProvider {
    name: &'static str,
    api_base: &'static str,
    model: &'static str,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn groq() -> Self {
        Self {
            name: "groq",
            api_base: GROQ_API_BASE,
            model: "mixtral-8x7b-32768",
            api_key: env_key("GROQ_API_KEY"),
            client: http_client(),
        }
    }

    pub fn openai() -> Self {
        Self {
            name: "openai",
            api_base: OPENAI_API_BASE,
            model: "gpt-3.5-turbo",
            api_key: env_key("OPENAI_API_KEY"),
            client: http_client(),
        }
    }
}

#[async_trait]
impl RefineProvider for ChatCompletionsProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, text: &str) -> SignResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SignError::MissingCredential {
                provider: self.name,
            })?;

        let body = ChatRequest {
            model: self.model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: CHAT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Convert this ASL sequence to proper English: {text}"),
                },
            ],
            temperature: 0.3,
            max_tokens: 200,
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {key}"))
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let detail = res.text().await.unwrap_or_default();
            return Err(SignError::Provider {
                provider: self.name,
                message: format!("API error {status}: {detail}"),
            });
        }

        let parsed: ChatResponse = res.json().await?;
        parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SignError::Provider {
                provider: self.name,
                message: "empty completion".to_string(),
            })
    }
}

// Gemini generateContent request/response.
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

pub struct GeminiProvider {
    model: &'static str,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn from_env() -> Self {
        Self {
            model: "gemini-pro",
            api_key: env_key("GEMINI_API_KEY"),
            client: http_client(),
        }
    }
}

#[async_trait]
impl RefineProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn attempt(&self, text: &str) -> SignResult<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SignError::MissingCredential { provider: "gemini" })?;

        let prompt = format!(
            "Convert this American Sign Language (ASL) word sequence into a \
             grammatically correct English sentence. ASL grammar differs from English. \
             Return only the refined sentence:\n\n{text}"
        );
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, key
        );
        let res = self.client.post(url).json(&body).send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let detail = res.text().await.unwrap_or_default();
            return Err(SignError::Provider {
                provider: "gemini",
                message: format!("API error {status}: {detail}"),
            });
        }

        let parsed: GeminiResponse = res.json().await?;
        parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SignError::Provider {
                provider: "gemini",
                message: "empty candidate".to_string(),
            })
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Result of a refinement request.
#[derive(Debug, Clone, PartialEq)]
pub enum Refined {
    /// Empty word list: nothing to refine, no provider was called.
    Nothing,
    Text {
        original: String,
        refined: String,
        provider: &'static str,
    },
}

/// Ordered provider chain with per-attempt timeout and a local fallback.
pub struct RefinementOrchestrator {
    providers: Vec<Box<dyn RefineProvider>>,
    timeout: Duration,
}

impl RefinementOrchestrator {
    /// Build the chain from configuration; unknown provider names are
    /// dropped with a warning.
    pub fn from_env(config: &RefineConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .filter_map(|name| -> Option<Box<dyn RefineProvider>> {
                match name.as_str() {
                    "gemini" => Some(Box::new(GeminiProvider::from_env())),
                    "groq" => Some(Box::new(ChatCompletionsProvider::groq())),
                    "openai" => Some(Box::new(ChatCompletionsProvider::openai())),
                    other => {
                        warn!("Unknown refinement provider in config: {other}");
                        None
                    }
                }
            })
            .collect();
        Self {
            providers,
            timeout: config.timeout(),
        }
    }

    pub fn with_providers(providers: Vec<Box<dyn RefineProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Refine a word list into fluent text. One pass over the chain, no
    /// retries; every failure falls through until the deterministic local
    /// fallback, which always succeeds.
    pub async fn refine(&self, words: &[String]) -> Refined {
        if words.is_empty() {
            return Refined::Nothing;
        }
        let original = words.join(" ");

        for provider in &self.providers {
            match tokio::time::timeout(self.timeout, provider.attempt(&original)).await {
                Ok(Ok(text)) => {
                    info!("Sentence refined by provider {}", provider.name());
                    return Refined::Text {
                        original,
                        refined: text,
                        provider: provider.name(),
                    };
                }
                Ok(Err(e)) => {
                    warn!("Refinement provider {} failed: {e}", provider.name());
                }
                Err(_) => {
                    warn!(
                        "Refinement provider {} timed out after {:?}",
                        provider.name(),
                        self.timeout
                    );
                }
            }
        }

        Refined::Text {
            refined: basic_refinement(words),
            original,
            provider: "local",
        }
    }
}

/// Deterministic fallback: lower-case join, capitalize the first character,
/// terminal period.
pub fn basic_refinement(words: &[String]) -> String {
    let joined = words.join(" ").to_lowercase();
    let mut chars = joined.chars();
    let mut refined = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => return String::new(),
    };
    if !refined.ends_with(['.', '!', '?']) {
        refined.push('.');
    }
    refined
}
