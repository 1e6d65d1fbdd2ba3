//! Strict parsing of untyped remote payloads.
//!
//! Both tiers hand back JSON produced by a language model. Nothing here
//! trusts its shape: every payload either becomes a validated domain value
//! or an explicit error, which the generator treats as a tier failure.

use serde_json::Value;

use crate::types::{Recipe, ShoppingList};
use crate::{Result, SproutError};

/// Remove markdown code fences a model may wrap its JSON in.
///
/// Every "```json" and "```" marker is dropped, then surrounding whitespace.
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse model output text into a recipe.
pub fn parse_recipe_text(content: &str) -> Result<Recipe> {
    let cleaned = strip_code_fences(content);
    if cleaned.is_empty() {
        return Err(SproutError::EmptyResponse);
    }
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| SproutError::InvalidResponse(format!("response is not JSON: {e}")))?;
    parse_recipe_value(value)
}

/// Normalise a JSON payload into a recipe.
///
/// Accepts either `{"recipe": {...}}` or a bare recipe object. Scalar
/// metadata the model sent as numbers (`"servings": 4`) is converted to
/// text. Fails when title, ingredients or instructions are missing or empty.
pub fn parse_recipe_value(value: Value) -> Result<Recipe> {
    let mut object = match value {
        Value::Object(mut map) => match map.remove("recipe") {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                return Err(SproutError::InvalidResponse(format!(
                    "`recipe` is not an object: {other}"
                )));
            }
            None => map,
        },
        other => {
            return Err(SproutError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    for field in ["servings", "prepTime", "cookTime"] {
        if let Some(Value::Number(n)) = object.get(field) {
            let text = n.to_string();
            object.insert(field.to_string(), Value::String(text));
        }
    }

    let recipe: Recipe = serde_json::from_value(Value::Object(object))
        .map_err(|e| SproutError::InvalidResponse(e.to_string()))?;

    let missing = recipe.missing_fields();
    if !missing.is_empty() {
        return Err(SproutError::InvalidResponse(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    Ok(recipe)
}

/// Normalise a JSON payload into a shopping list.
///
/// Accepts `{"pantryList": {...}}` or a bare `{category: [items]}` object.
/// Non-string items are skipped; empty categories are dropped.
pub fn parse_shopping_list(value: Value) -> Result<ShoppingList> {
    let object = match value {
        Value::Object(mut map) => match map.remove("pantryList") {
            Some(Value::Object(inner)) => inner,
            Some(_) => {
                return Err(SproutError::InvalidResponse(
                    "`pantryList` is not an object".into(),
                ));
            }
            None => map,
        },
        other => {
            return Err(SproutError::InvalidResponse(format!(
                "expected a shopping list object, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut list = ShoppingList::default();
    for (category, items) in object {
        let Value::Array(items) = items else {
            continue;
        };
        let items: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !items.is_empty() {
            list.categories.insert(category, items);
        }
    }

    if list.is_empty() {
        return Err(SproutError::EmptyResponse);
    }
    Ok(list)
}

/// Parse model output text into a shopping list.
pub fn parse_shopping_list_text(content: &str) -> Result<ShoppingList> {
    let cleaned = strip_code_fences(content);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| SproutError::InvalidResponse(format!("response is not JSON: {e}")))?;
    parse_shopping_list(value)
}

/// Pull an image URI out of a chat-completion message.
///
/// Looks at `images[0].image_url.url` (or `images[0]` as a plain string),
/// then for a `data:image/...;base64,...` URI embedded in `content`.
pub fn extract_image_uri(message: &Value) -> Option<String> {
    if let Some(first) = message
        .get("images")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
    {
        let url = first
            .pointer("/image_url/url")
            .and_then(Value::as_str)
            .or_else(|| first.as_str());
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
    }

    message
        .get("content")
        .and_then(Value::as_str)
        .and_then(find_data_uri)
}

/// Find the first `data:image/<type>;base64,<payload>` URI in `text`.
fn find_data_uri(text: &str) -> Option<String> {
    const MARKER: &str = "data:image/";
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(MARKER) {
        let start = search_from + offset;
        let rest = &text[start..];
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(rest.len());
        let candidate = &rest[..end];

        let media = &candidate[MARKER.len()..];
        if let Some((mime, payload)) = media.split_once(";base64,")
            && !mime.is_empty()
            && !mime.contains(';')
            && !payload.is_empty()
        {
            return Some(candidate.to_string());
        }
        search_from = start + MARKER.len();
    }
    None
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
