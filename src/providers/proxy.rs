//! Hosted proxy function client (primary tier).
//!
//! The proxy is a serverless function that holds the LLM API key and
//! multiplexes several operations on an `action` field:
//!
//! | action               | request fields                        | response        |
//! |----------------------|---------------------------------------|-----------------|
//! | `generateRecipe`     | ingredients, restrictions, cuisineType, mealType, servingSize | `{recipe}` |
//! | `edit`               | recipe, editInstructions              | `{recipe}`      |
//! | `generateImage`      | recipeName, ingredients               | `{imageUrl}`    |
//! | `generatePantryList` | ingredients, country                  | `{pantryList}`  |
//!
//! Failures come back as non-2xx with `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::http::{DEFAULT_HTTP_TIMEOUT, build_client, check_status};
use super::parse::{parse_recipe_value, parse_shopping_list};
use super::traits::RecipeService;
use crate::types::{GenerationRequest, Recipe, ShoppingList};
use crate::{Result, SproutError};

/// Function name of the proxy when none is configured.
pub const DEFAULT_FUNCTION: &str = "openrouter-proxy";

/// Error message the proxy uses when the image model returned no image.
const NO_IMAGE_MESSAGE: &str = "No image generated";

/// Client for the hosted recipe proxy.
#[derive(Clone)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
    function: String,
    api_key: String,
}

impl ProxyClient {
    /// Create a client for the project at `base_url` (e.g.
    /// `https://xyz.supabase.co`) authenticated with its public `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client with a custom HTTP timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: build_client(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            function: DEFAULT_FUNCTION.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Call a differently named function.
    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.function = name.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/functions/v1/{}", self.base_url, self.function)
    }

    async fn invoke<B: Serialize + Sync>(&self, body: &B) -> Result<Value> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        let response = check_status(response, "proxy").await?;
        Ok(response.json::<Value>().await?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    action: &'static str,
    ingredients: &'a [String],
    restrictions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    cuisine_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meal_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    serving_size: Option<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditBody<'a> {
    action: &'static str,
    recipe: &'a Recipe,
    edit_instructions: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageBody<'a> {
    action: &'static str,
    recipe_name: &'a str,
    ingredients: &'a [String],
}

#[derive(Serialize)]
struct PantryBody<'a> {
    action: &'static str,
    ingredients: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<&'a str>,
}

#[async_trait]
impl RecipeService for ProxyClient {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Recipe> {
        let body = GenerateBody {
            action: "generateRecipe",
            ingredients: request.ingredients(),
            restrictions: request.dietary_restrictions(),
            cuisine_type: request.cuisine_type(),
            meal_type: request.meal_type(),
            serving_size: request.serving_size(),
        };
        let value = self.invoke(&body).await?;
        debug!(function = %self.function, "proxy returned recipe payload");
        parse_recipe_value(value)
    }

    async fn edit(&self, recipe: &Recipe, instructions: &str) -> Result<Recipe> {
        let body = EditBody {
            action: "edit",
            recipe,
            edit_instructions: instructions,
        };
        parse_recipe_value(self.invoke(&body).await?)
    }

    async fn generate_image(&self, title: &str, ingredients: &[String]) -> Result<Option<String>> {
        let body = ImageBody {
            action: "generateImage",
            recipe_name: title,
            ingredients,
        };
        match self.invoke(&body).await {
            Ok(value) => Ok(value
                .get("imageUrl")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_string)),
            Err(SproutError::Api { message, .. }) if message == NO_IMAGE_MESSAGE => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn shopping_list(
        &self,
        ingredients: &[String],
        country: Option<&str>,
    ) -> Result<ShoppingList> {
        let body = PantryBody {
            action: "generatePantryList",
            ingredients,
            country,
        };
        parse_shopping_list(self.invoke(&body).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = ProxyClient::new("https://abc.supabase.co/", "anon");
        assert_eq!(
            client.endpoint(),
            "https://abc.supabase.co/functions/v1/openrouter-proxy"
        );
        let client = client.function("recipe-proxy");
        assert_eq!(
            client.endpoint(),
            "https://abc.supabase.co/functions/v1/recipe-proxy"
        );
    }

    #[test]
    fn generate_body_uses_wire_names() {
        let request = GenerationRequest::new(["tofu"]).meal("lunch").servings(2);
        let body = GenerateBody {
            action: "generateRecipe",
            ingredients: request.ingredients(),
            restrictions: request.dietary_restrictions(),
            cuisine_type: request.cuisine_type(),
            meal_type: request.meal_type(),
            serving_size: request.serving_size(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "generateRecipe",
                "ingredients": ["tofu"],
                "restrictions": [],
                "mealType": "lunch",
                "servingSize": 2
            })
        );
    }
}
