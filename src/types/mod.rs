//! Public types for the Sprout API.

mod recipe;
mod request;
mod shopping;
mod state;

pub use recipe::Recipe;
pub use request::{GenerationRequest, MAX_SERVINGS, MIN_SERVINGS};
pub use shopping::ShoppingList;
pub use state::{GenerationOutcome, GenerationPhase, GenerationState};
