//! Direct chat-completions client (fallback tier).
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint, OpenRouter
//! by default. Builds the prompts itself (see [`prompt`](super::prompt)),
//! extracts `choices[0].message`, strips markdown fences and normalises the
//! JSON it finds.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::http::{DEFAULT_HTTP_TIMEOUT, build_client, check_status};
use super::parse::{extract_image_uri, parse_recipe_text, parse_shopping_list_text};
use super::prompt::{
    self, CHEF_SYSTEM_PROMPT, EDITOR_SYSTEM_PROMPT, SHOPPER_SYSTEM_PROMPT,
};
use super::traits::RecipeService;
use crate::types::{GenerationRequest, Recipe, ShoppingList};
use crate::{Result, SproutError};

/// Default base URL for the OpenRouter API.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Default text model.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-v3.2";
/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-3-pro-image-preview";
/// Country used for shopping lists when none is given.
pub const DEFAULT_COUNTRY: &str = "US";

const REFERER: &str = "https://github.com/sprout-notes/sprout";
const APP_TITLE: &str = "Sprout - AI Vegan Recipe Generator";

/// Client for an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
}

impl OpenRouterClient {
    /// Create a client against OpenRouter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: build_client(DEFAULT_HTTP_TIMEOUT),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    /// Use a different text model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different image model.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Replace the HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http = build_client(timeout);
        self
    }

    /// Send a completion request and return `choices[0].message`.
    async fn complete(&self, body: &CompletionRequest<'_>) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = body.model, "calling chat completions");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(body)
            .send()
            .await?;

        let response = check_status(response, "OpenRouter").await?;
        let mut data: Value = response.json().await?;
        match data.pointer_mut("/choices/0/message").map(Value::take) {
            Some(message @ Value::Object(_)) => Ok(message),
            _ => Err(SproutError::EmptyResponse),
        }
    }

    /// Completion whose answer is expected as text content.
    async fn complete_text(&self, body: &CompletionRequest<'_>) -> Result<String> {
        let message = self.complete(body).await?;
        message
            .get("content")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .ok_or(SproutError::EmptyResponse)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modalities: Option<[&'static str; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

impl<'a> CompletionRequest<'a> {
    fn json_task(model: &'a str, system: &'a str, user: &'a str, temperature: f64, max_tokens: u32) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            modalities: None,
            image_config: None,
        }
    }
}

#[async_trait]
impl RecipeService for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Recipe> {
        if !request.is_dispatchable() {
            return Err(SproutError::InvalidInput(
                "ingredients must be a non-empty list".into(),
            ));
        }
        let user = prompt::recipe_prompt(request);
        let body = CompletionRequest::json_task(&self.model, CHEF_SYSTEM_PROMPT, &user, 0.7, 2000);
        let content = self.complete_text(&body).await?;
        parse_recipe_text(&content)
    }

    async fn edit(&self, recipe: &Recipe, instructions: &str) -> Result<Recipe> {
        let user = prompt::edit_prompt(recipe, instructions)?;
        let body = CompletionRequest::json_task(&self.model, EDITOR_SYSTEM_PROMPT, &user, 0.7, 2000);
        let content = self.complete_text(&body).await?;
        parse_recipe_text(&content)
    }

    async fn generate_image(&self, title: &str, ingredients: &[String]) -> Result<Option<String>> {
        let user = prompt::image_prompt(title, ingredients);
        let body = CompletionRequest {
            model: &self.image_model,
            messages: vec![ChatMessage {
                role: "user",
                content: &user,
            }],
            temperature: None,
            max_tokens: None,
            modalities: Some(["image", "text"]),
            image_config: Some(ImageConfig {
                aspect_ratio: "16:9",
            }),
        };
        let message = self.complete(&body).await?;
        Ok(extract_image_uri(&message))
    }

    async fn shopping_list(
        &self,
        ingredients: &[String],
        country: Option<&str>,
    ) -> Result<ShoppingList> {
        let user = prompt::shopping_list_prompt(ingredients, country.unwrap_or(DEFAULT_COUNTRY));
        let body = CompletionRequest::json_task(&self.model, SHOPPER_SYSTEM_PROMPT, &user, 0.5, 1500);
        let content = self.complete_text(&body).await?;
        parse_shopping_list_text(&content)
    }
}
