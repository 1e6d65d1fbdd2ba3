//! Prompt text for the direct chat-completions tier.

use crate::types::{GenerationRequest, Recipe};
use crate::Result;

/// Maximum number of ingredients mentioned in an image prompt.
pub const IMAGE_PROMPT_INGREDIENTS: usize = 5;

pub(crate) const CHEF_SYSTEM_PROMPT: &str = "You are a professional vegan chef. \
Create delicious, practical plant-based recipes. Always respond with valid JSON only.";

pub(crate) const EDITOR_SYSTEM_PROMPT: &str = "You are a professional vegan chef. \
Modify recipes as requested while keeping them delicious and practical. \
Always respond with valid JSON only.";

pub(crate) const SHOPPER_SYSTEM_PROMPT: &str = "You are a helpful shopping assistant. \
Organise ingredients into logical grocery store categories. Always respond with valid JSON only.";

/// User prompt for generating a recipe.
pub fn recipe_prompt(request: &GenerationRequest) -> String {
    let mut constraints = String::new();
    if !request.dietary_restrictions().is_empty() {
        constraints.push_str(&format!(
            " The recipe must be {}.",
            request.dietary_restrictions().join(" and ")
        ));
    }
    if let Some(cuisine) = request.cuisine_type() {
        constraints.push_str(&format!(" Make it a {cuisine} style dish."));
    }
    if let Some(meal) = request.meal_type() {
        constraints.push_str(&format!(" It should be suitable for {meal}."));
    }
    if let Some(servings) = request.serving_size() {
        constraints.push_str(&format!(" Make the recipe for {servings} servings."));
    }

    format!(
        "Generate a delicious vegan recipe using these ingredients: {ingredients}.{constraints}

The recipe should be practical for home cooking. Format the response as a JSON object with these fields:
- title: Creative, appetising name
- description: Brief enticing description (1-2 sentences)
- ingredients: Array of ingredients with measurements
- instructions: Array of clear step-by-step instructions
- prepTime: Preparation time (e.g., \"15 minutes\")
- cookTime: Cooking time (e.g., \"30 minutes\")
- servings: Number of servings
- nutritionalNotes: Array of key nutrition facts
- cookingTips: Array of 3-5 helpful tips

You may add common pantry staples if needed. Return ONLY valid JSON, no markdown.",
        ingredients = request.ingredients().join(", "),
    )
}

/// User prompt for editing a recipe.
pub fn edit_prompt(recipe: &Recipe, instructions: &str) -> Result<String> {
    // Identity and presentation fields are not the model's business.
    let mut editable = recipe.clone();
    editable.id = None;
    editable.category = None;
    editable.image_url = None;
    let recipe_json = serde_json::to_string_pretty(&editable)?;

    Ok(format!(
        "Modify this vegan recipe according to the instructions.

Current recipe:
{recipe_json}

Modification request: {instructions}

Return the modified recipe in the same JSON format. Keep it vegan and practical. Return ONLY valid JSON."
    ))
}

/// User prompt for generating a photograph of a dish.
pub fn image_prompt(title: &str, ingredients: &[String]) -> String {
    let featured = ingredients
        .iter()
        .take(IMAGE_PROMPT_INGREDIENTS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let featuring = if featured.is_empty() {
        String::new()
    } else {
        format!(" featuring {featured}")
    };

    format!(
        "Generate a beautiful, appetising photograph of a vegan dish called \"{title}\"{featuring}.

The image should have:
- Professional food photography styling
- Natural soft lighting from the side
- Clean white ceramic plate or rustic wooden board
- Fresh, vibrant colours of vegetables and ingredients
- Shallow depth of field for artistic effect
- Restaurant-quality plating and presentation
- Appropriate garnishes (fresh herbs, seeds, or microgreens)
- Clean, minimal background

Style: editorial food photography, high resolution, warm inviting tones."
    )
}

/// User prompt for a categorised shopping list.
pub fn shopping_list_prompt(ingredients: &[String], country: &str) -> String {
    format!(
        "Create a shopping list from these recipe ingredients: {}

Organise them by grocery store section/category (e.g., Produce, Dairy Alternatives, Pantry, etc.)
Localise ingredient names for {country} (use local terminology and common brand names where applicable).

Return as JSON object where keys are category names and values are arrays of items.
Example: {{ \"Produce\": [\"2 ripe avocados\", \"1 bunch fresh cilantro\"], \"Pantry\": [\"1 can black beans\"] }}

Return ONLY valid JSON.",
        ingredients.join(", ")
    )
}
