//! Sprout - vegan recipe generation with cached, multi-tier LLM fallback
//!
//! A [`RecipeGenerator`] turns a list of ingredients and constraints into a
//! [`Recipe`]. Requests are answered from a one-hour result cache when
//! possible; otherwise a hosted proxy function (primary tier) is called,
//! with a direct OpenRouter-compatible API (fallback tier) as backup.
//! Progress is published as an observable [`GenerationState`].
//!
//! # Example
//!
//! ```rust,no_run
//! use sprout::{GenerationOutcome, GenerationRequest, Sprout};
//!
//! #[tokio::main]
//! async fn main() -> sprout::Result<()> {
//!     let generator = Sprout::builder()
//!         .proxy("https://xyz.supabase.co", "anon-key")
//!         .openrouter("sk-or-your-key")
//!         .build()?;
//!
//!     let request = GenerationRequest::new(["tofu", "broccoli"])
//!         .restrictions(["nut-free"])
//!         .cuisine("thai")
//!         .servings(2);
//!
//!     match generator.generate(request).await {
//!         GenerationOutcome::Fulfilled(recipe) => println!("{}", recipe.title),
//!         GenerationOutcome::Rejected(message) => eprintln!("{message}"),
//!         GenerationOutcome::Superseded => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Watching state
//!
//! ```rust,ignore
//! let mut rx = generator.subscribe();
//! while rx.changed().await.is_ok() {
//!     let state = rx.borrow().clone();
//!     println!("{:?}", state.phase());
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod generator;
pub mod notebook;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use builder::{Sprout, SproutBuilder};
pub use cache::{CacheConfig, CacheKey, MemoryStore, ResultCache, SessionStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Secrets};
pub use error::{Result, SproutError};
pub use generator::{RecipeGenerator, Source};
pub use notebook::{Note, Notebook, RecipePatch, Review, SavedRecipe};
pub use providers::{OpenRouterClient, ProxyClient, RecipeService};

pub use types::{
    GenerationOutcome, GenerationPhase, GenerationRequest, GenerationState, MAX_SERVINGS,
    MIN_SERVINGS, Recipe, ShoppingList,
};
