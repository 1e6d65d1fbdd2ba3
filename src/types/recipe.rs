//! The recipe domain result.

use serde::{Deserialize, Serialize};

/// A generated or saved recipe.
///
/// Field names serialise in camelCase to match the JSON the remote tiers
/// produce (`prepTime`, `nutritionalNotes`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub ingredients: Vec<String>,

    /// Ordered preparation steps.
    pub instructions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,

    /// Free-text serving count as returned by the model ("4", "4-6").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nutritional_notes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cooking_tips: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Image of the dish, usually a `data:` URI or an https URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Recipe {
    /// Create a recipe with the required fields set.
    pub fn new(
        title: impl Into<String>,
        ingredients: Vec<String>,
        instructions: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            ingredients,
            instructions,
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the serving count.
    pub fn servings(mut self, servings: impl Into<String>) -> Self {
        self.servings = Some(servings.into());
        self
    }

    /// Names of required fields that are missing or empty.
    ///
    /// A recipe is usable only when this is empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.ingredients.iter().all(|i| i.trim().is_empty()) {
            missing.push("ingredients");
        }
        if self.instructions.iter().all(|i| i.trim().is_empty()) {
            missing.push("instructions");
        }
        missing
    }

    /// Copy identity and presentation fields the model may have dropped.
    pub(crate) fn inherit_from(mut self, original: &Recipe) -> Self {
        if self.id.is_none() {
            self.id = original.id.clone();
        }
        if self.category.is_none() {
            self.category = original.category.clone();
        }
        if self.image_url.is_none() {
            self.image_url = original.image_url.clone();
        }
        self
    }
}
