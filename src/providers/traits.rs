//! The remote tier contract.
//!
//! A tier is anything that can turn a [`GenerationRequest`] into a
//! [`Recipe`]: a hosted proxy function, a direct LLM API client, or a test
//! double. The generator only sees this trait, so its tests never touch
//! the network.
//!
//! # Failure semantics
//!
//! Every method is fallible. Any `Err` from the primary tier sends the
//! generator to the fallback tier; any `Err` from the fallback tier is
//! terminal. Implementations return already-normalised values (see
//! [`parse`](super::parse)) and report structurally invalid payloads as
//! [`SproutError::InvalidResponse`](crate::SproutError::InvalidResponse).

use async_trait::async_trait;

use crate::types::{GenerationRequest, Recipe, ShoppingList};
use crate::{Result, SproutError};

/// One remote implementation of the recipe capabilities.
#[async_trait]
pub trait RecipeService: Send + Sync {
    /// Tier name for logging/metrics.
    fn name(&self) -> &str;

    /// Generate a recipe for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<Recipe>;

    /// Rewrite `recipe` according to free-text `instructions`.
    async fn edit(&self, _recipe: &Recipe, _instructions: &str) -> Result<Recipe> {
        Err(SproutError::Unsupported)
    }

    /// Generate an image of a dish. `Ok(None)` means the model answered
    /// without an image.
    async fn generate_image(&self, _title: &str, _ingredients: &[String]) -> Result<Option<String>> {
        Err(SproutError::Unsupported)
    }

    /// Build a categorised shopping list, localised for `country`.
    async fn shopping_list(
        &self,
        _ingredients: &[String],
        _country: Option<&str>,
    ) -> Result<ShoppingList> {
        Err(SproutError::Unsupported)
    }
}
