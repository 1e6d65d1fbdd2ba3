//! Observable generation state and per-call outcomes.

use serde::Serialize;

use super::Recipe;

/// Terminal result of a single [`generate`](crate::RecipeGenerator::generate) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A recipe was produced (from cache or a remote tier).
    Fulfilled(Recipe),
    /// Validation failed or every tier failed. Holds the user-facing message.
    Rejected(String),
    /// A newer call started before this one settled; its result was
    /// discarded and the observable state left to the newer call.
    Superseded,
}

impl GenerationOutcome {
    pub fn recipe(&self) -> Option<&Recipe> {
        match self {
            GenerationOutcome::Fulfilled(recipe) => Some(recipe),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Rejected(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, GenerationOutcome::Fulfilled(_))
    }
}

/// Lifecycle phase derived from a [`GenerationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// What a front end renders: the current recipe, a loading flag and an
/// error message. Published through a `tokio::sync::watch` channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationState {
    pub recipe: Option<Recipe>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl GenerationState {
    pub(crate) fn pending() -> Self {
        Self {
            recipe: None,
            is_loading: true,
            error: None,
        }
    }

    pub fn phase(&self) -> GenerationPhase {
        if self.is_loading {
            GenerationPhase::Pending
        } else if self.recipe.is_some() {
            GenerationPhase::Fulfilled
        } else if self.error.is_some() {
            GenerationPhase::Rejected
        } else {
            GenerationPhase::Idle
        }
    }
}
