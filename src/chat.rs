//! One-shot chat-completion request.
//!
//! Sends a single user message to an OpenAI-compatible endpoint and returns the
//! first choice's content. Stateless, no retries. Any failure (missing key,
//! transport, HTTP status, malformed body) is `PlaybackError::ExternalCallFailure`.
//!
//! Settings come from the process environment, optionally seeded from a `.env`
//! file (see [`load_dotenv`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const GREETING: &str = "Hi ChatGPT. Say hi back!";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Load `.env` from the working directory or one of its parents. Variables
/// already set in the environment are kept. Returns the file that was read.
pub fn load_dotenv() -> Option<PathBuf> {
    loaded(dotenvy::dotenv())
}

/// Like [`load_dotenv`] for an explicit file.
pub fn load_env_file(path: &Path) -> Option<PathBuf> {
    loaded(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn loaded(result: dotenvy::Result<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => {
            log::debug!("loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            log::warn!("ignoring unreadable env file: {}", e);
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ChatSettings {
    /// `OPENAI_API_KEY` is required; `OPENAI_BASE_URL` and `OPENAI_MODEL` are optional.
    pub fn from_env() -> Result<Self, PlaybackError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PlaybackError::ExternalCallFailure(anyhow!("OPENAI_API_KEY is not set"))
            })?;
        let base_url = non_empty_env("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_empty_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Send `message` as a single user turn and return the reply text.
pub fn complete(settings: &ChatSettings, message: &str) -> Result<String, PlaybackError> {
    send(settings, message).map_err(PlaybackError::ExternalCallFailure)
}

fn send(settings: &ChatSettings, message: &str) -> Result<String> {
    let body = request_body(&settings.model, message)?;
    let endpoint = settings.endpoint();
    log::info!("chat: POST {} model={}", endpoint, settings.model);

    let response = ureq::post(&endpoint)
        .timeout(REQUEST_TIMEOUT)
        .set("Authorization", &format!("Bearer {}", settings.api_key))
        .set("Content-Type", "application/json")
        .send_string(&body)
        .with_context(|| format!("chat completion request to {}", endpoint))?;
    let raw = response
        .into_string()
        .context("read chat completion response")?;
    parse_reply(&raw)
}

fn request_body(model: &str, message: &str) -> Result<String> {
    let request = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: message,
        }],
    };
    serde_json::to_string(&request).context("encode chat request")
}

fn parse_reply(raw: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(raw).context("invalid chat completion response")?;
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("chat completion returned no choices"))?
        .message
        .content
        .ok_or_else(|| anyhow!("first choice has no content"))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
