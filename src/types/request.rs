//! Recipe generation request.

use serde::{Deserialize, Serialize};

/// Smallest serving size a request may carry.
pub const MIN_SERVINGS: u8 = 1;
/// Largest serving size a request may carry.
pub const MAX_SERVINGS: u8 = 10;

/// Parameters for a recipe generation call.
///
/// Immutable once built. `ingredients` keeps its input order for prompt
/// construction; both list fields are treated as sets when deriving a
/// [`CacheKey`](crate::cache::CacheKey).
///
/// ```rust
/// # use sprout::GenerationRequest;
/// let request = GenerationRequest::new(["tofu", "broccoli"])
///     .restrictions(["soy-free"])
///     .cuisine("thai")
///     .servings(4);
/// assert_eq!(request.serving_size(), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRequest")]
pub struct GenerationRequest {
    ingredients: Vec<String>,
    dietary_restrictions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cuisine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    serving_size: Option<u8>,
}

impl GenerationRequest {
    /// Create a request for the given ingredients.
    ///
    /// Entries are trimmed and blank ones dropped. An empty list is allowed
    /// here; the generator rejects it at dispatch time.
    pub fn new<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ingredients: clean_list(ingredients),
            ..Self::default()
        }
    }

    /// Set dietary restriction tags (e.g. `"gluten-free"`).
    pub fn restrictions<I, S>(mut self, restrictions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary_restrictions = clean_list(restrictions);
        self
    }

    /// Set the cuisine style. Blank values clear it.
    pub fn cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine_type = clean_tag(cuisine.into());
        self
    }

    /// Set the meal type. Blank values clear it.
    pub fn meal(mut self, meal: impl Into<String>) -> Self {
        self.meal_type = clean_tag(meal.into());
        self
    }

    /// Set the serving size, clamped to [`MIN_SERVINGS`]..=[`MAX_SERVINGS`].
    pub fn servings(mut self, servings: u32) -> Self {
        let clamped = servings.clamp(MIN_SERVINGS as u32, MAX_SERVINGS as u32);
        self.serving_size = Some(clamped as u8);
        self
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn dietary_restrictions(&self) -> &[String] {
        &self.dietary_restrictions
    }

    pub fn cuisine_type(&self) -> Option<&str> {
        self.cuisine_type.as_deref()
    }

    pub fn meal_type(&self) -> Option<&str> {
        self.meal_type.as_deref()
    }

    pub fn serving_size(&self) -> Option<u8> {
        self.serving_size
    }

    /// Whether the request can be dispatched.
    pub fn is_dispatchable(&self) -> bool {
        !self.ingredients.is_empty()
    }
}

/// Wire form of a request. Decoded values pass through the same
/// normalisation as the builder methods.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    dietary_restrictions: Vec<String>,
    #[serde(default)]
    cuisine_type: Option<String>,
    #[serde(default)]
    meal_type: Option<String>,
    #[serde(default)]
    serving_size: Option<u32>,
}

impl From<RawRequest> for GenerationRequest {
    fn from(raw: RawRequest) -> Self {
        let mut request = GenerationRequest::new(raw.ingredients)
            .restrictions(raw.dietary_restrictions);
        if let Some(cuisine) = raw.cuisine_type {
            request = request.cuisine(cuisine);
        }
        if let Some(meal) = raw.meal_type {
            request = request.meal(meal);
        }
        if let Some(servings) = raw.serving_size {
            request = request.servings(servings);
        }
        request
    }
}

fn clean_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items
        .into_iter()
        .map(Into::into)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn clean_tag(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
