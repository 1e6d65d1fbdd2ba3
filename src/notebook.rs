//! Saved-recipe notebook.
//!
//! A single JSON file holding every recipe the user kept, each with star
//! reviews and free-text notes. The whole document is rewritten on every
//! mutation: it is written to a sibling temp file and renamed over the
//! original, so a crash mid-write leaves the previous version intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::types::Recipe;
use crate::{Result, SproutError};

/// Lowest accepted review rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted review rating.
pub const MAX_RATING: u8 = 5;

/// A recipe kept in the notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: String,
    pub recipe: Recipe,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl SavedRecipe {
    /// Mean rating, if the recipe has been reviewed.
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(f64::from(total) / self.reviews.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Partial update of a saved recipe. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub servings: Option<String>,
    pub nutritional_notes: Option<Vec<String>>,
    pub cooking_tips: Option<Vec<String>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl RecipePatch {
    /// Patch carrying every field of `recipe`. The required fields and both
    /// lists are always replaced; optional scalars that `recipe` leaves
    /// empty keep their saved value.
    pub fn from_recipe(recipe: Recipe) -> Self {
        Self {
            title: Some(recipe.title),
            description: recipe.description,
            ingredients: Some(recipe.ingredients),
            instructions: Some(recipe.instructions),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            nutritional_notes: Some(recipe.nutritional_notes),
            cooking_tips: Some(recipe.cooking_tips),
            category: recipe.category,
            image_url: recipe.image_url,
        }
    }

    fn apply(self, recipe: &mut Recipe) {
        if let Some(v) = self.title {
            recipe.title = v;
        }
        if let Some(v) = self.description {
            recipe.description = Some(v);
        }
        if let Some(v) = self.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = self.instructions {
            recipe.instructions = v;
        }
        if let Some(v) = self.prep_time {
            recipe.prep_time = Some(v);
        }
        if let Some(v) = self.cook_time {
            recipe.cook_time = Some(v);
        }
        if let Some(v) = self.servings {
            recipe.servings = Some(v);
        }
        if let Some(v) = self.nutritional_notes {
            recipe.nutritional_notes = v;
        }
        if let Some(v) = self.cooking_tips {
            recipe.cooking_tips = v;
        }
        if let Some(v) = self.category {
            recipe.category = Some(v);
        }
        if let Some(v) = self.image_url {
            recipe.image_url = Some(v);
        }
    }
}

#[derive(Default, Deserialize)]
struct Document {
    #[serde(default)]
    recipes: Vec<SavedRecipe>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    recipes: &'a [SavedRecipe],
}

/// File-backed collection of saved recipes.
pub struct Notebook {
    path: PathBuf,
    recipes: Vec<SavedRecipe>,
    clock: Arc<dyn Clock>,
}

impl Notebook {
    /// Open the notebook at `path`. A missing file is an empty notebook.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    /// Open with an explicit clock for timestamps.
    pub async fn open_with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.into();
        let recipes = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let document: Document = serde_json::from_str(&content).map_err(|e| {
                    SproutError::Storage(format!("notebook {path:?} is unreadable: {e}"))
                })?;
                document.recipes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = ?path, recipes = recipes.len(), "notebook opened");
        Ok(Self {
            path,
            recipes,
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Save a recipe and return its new id.
    pub async fn save(&mut self, recipe: Recipe) -> Result<String> {
        let missing = recipe.missing_fields();
        if !missing.is_empty() {
            return Err(SproutError::InvalidInput(format!(
                "cannot save recipe without {}",
                missing.join(", ")
            )));
        }

        let id = Uuid::new_v4().to_string();
        let mut recipe = recipe;
        recipe.id = Some(id.clone());
        let mut recipes = self.recipes.clone();
        recipes.push(SavedRecipe {
            id: id.clone(),
            recipe,
            created_at: self.clock.now_ms(),
            reviews: Vec::new(),
            notes: Vec::new(),
        });
        self.commit(recipes).await?;
        Ok(id)
    }

    /// All saved recipes, newest first.
    pub fn list(&self) -> Vec<&SavedRecipe> {
        let mut recipes: Vec<&SavedRecipe> = self.recipes.iter().rev().collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recipes
    }

    pub fn get(&self, id: &str) -> Option<&SavedRecipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Apply `patch` to a saved recipe. The result must still have a
    /// title, ingredients and instructions.
    pub async fn update(&mut self, id: &str, patch: RecipePatch) -> Result<&SavedRecipe> {
        let index = self.index_of(id)?;
        let mut recipe = self.recipes[index].recipe.clone();
        patch.apply(&mut recipe);
        recipe.id = Some(id.to_string());

        let missing = recipe.missing_fields();
        if !missing.is_empty() {
            return Err(SproutError::InvalidInput(format!(
                "update would remove {}",
                missing.join(", ")
            )));
        }

        let mut recipes = self.recipes.clone();
        recipes[index].recipe = recipe;
        self.commit(recipes).await?;
        Ok(&self.recipes[index])
    }

    /// Delete a saved recipe with its reviews and notes.
    pub async fn remove(&mut self, id: &str) -> Result<SavedRecipe> {
        let index = self.index_of(id)?;
        let mut recipes = self.recipes.clone();
        let removed = recipes.remove(index);
        self.commit(recipes).await?;
        Ok(removed)
    }

    /// Add a 1-5 star review. Returns the review id.
    pub async fn add_review(&mut self, id: &str, rating: u8, comment: &str) -> Result<String> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(SproutError::InvalidInput(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }
        let index = self.index_of(id)?;
        let review = Review {
            id: Uuid::new_v4().to_string(),
            rating,
            comment: comment.trim().to_string(),
            created_at: self.clock.now_ms(),
        };
        let review_id = review.id.clone();
        let mut recipes = self.recipes.clone();
        recipes[index].reviews.push(review);
        self.commit(recipes).await?;
        Ok(review_id)
    }

    /// Attach a note. Returns the note id.
    pub async fn add_note(&mut self, id: &str, title: &str, content: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SproutError::InvalidInput("note title is required".into()));
        }
        let index = self.index_of(id)?;
        let now = self.clock.now_ms();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        let note_id = note.id.clone();
        let mut recipes = self.recipes.clone();
        recipes[index].notes.push(note);
        self.commit(recipes).await?;
        Ok(note_id)
    }

    /// Change a note's title and/or content.
    pub async fn update_note(
        &mut self,
        id: &str,
        note_id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<&Note> {
        if title.is_some_and(|t| t.trim().is_empty()) {
            return Err(SproutError::InvalidInput("note title is required".into()));
        }
        let index = self.index_of(id)?;
        let position = self.recipes[index]
            .notes
            .iter()
            .position(|n| n.id == note_id)
            .ok_or_else(|| SproutError::NotFound(format!("note {note_id}")))?;

        let mut recipes = self.recipes.clone();
        let note = &mut recipes[index].notes[position];
        if let Some(title) = title {
            note.title = title.trim().to_string();
        }
        if let Some(content) = content {
            note.content = content.to_string();
        }
        note.updated_at = self.clock.now_ms();

        self.commit(recipes).await?;
        Ok(&self.recipes[index].notes[position])
    }

    pub async fn remove_note(&mut self, id: &str, note_id: &str) -> Result<()> {
        let index = self.index_of(id)?;
        let mut recipes = self.recipes.clone();
        let notes = &mut recipes[index].notes;
        let before = notes.len();
        notes.retain(|n| n.id != note_id);
        if notes.len() == before {
            return Err(SproutError::NotFound(format!("note {note_id}")));
        }
        self.commit(recipes).await
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| SproutError::NotFound(format!("recipe {id}")))
    }

    /// Write `recipes` to disk, then adopt them. On a failed write the
    /// notebook keeps its previous contents.
    async fn commit(&mut self, recipes: Vec<SavedRecipe>) -> Result<()> {
        self.persist(&recipes).await?;
        self.recipes = recipes;
        Ok(())
    }

    async fn persist(&self, recipes: &[SavedRecipe]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(&DocumentRef { recipes })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = ?self.path, recipes = recipes.len(), "notebook written");
        Ok(())
    }
}
