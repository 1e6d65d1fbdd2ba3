//! Recipe generation orchestrator.
//!
//! [`RecipeGenerator`] owns the result cache and the two remote tiers and
//! drives a single observable [`GenerationState`].
//!
//! # Generate flow
//!
//! ```text
//! generate(request)
//!     │  publish {recipe: None, is_loading: true, error: None}
//!     ▼
//! no ingredients? ──────────────► Rejected (no cache, no network)
//!     │
//!     ▼
//! cache hit, fresh? ────────────► Fulfilled (no network)
//!     │ miss / expired / corrupt
//!     ▼
//! primary tier ── ok ──┐
//!     │ any error      │
//!     ▼                │
//! fallback tier ─ ok ──┤──► write-through ──► Fulfilled
//!     │ error          │
//!     ▼
//! Rejected("no recipe could be generated: ...")
//! ```
//!
//! Each tier is called at most once per request; there is no retry.
//!
//! # Overlapping calls
//!
//! Every call takes a token. Only the holder of the latest token may write
//! the observable state; an older call that settles late returns
//! [`GenerationOutcome::Superseded`] and leaves the state alone. Its
//! successful result is still written to the cache.

mod guard;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::providers::RecipeService;
use crate::providers::prompt::IMAGE_PROMPT_INGREDIENTS;
use crate::telemetry;
use crate::types::{GenerationOutcome, GenerationRequest, GenerationState, Recipe, ShoppingList};
use crate::{Result, SproutError};

use guard::StateCell;

/// Boxed future returned by one tier call.
type TierCall<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Primary,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Primary => "primary",
            Source::Fallback => "fallback",
        }
    }
}

/// Cache-first, primary-then-fallback recipe generator.
///
/// Construct through [`Sprout::builder()`](crate::Sprout::builder).
pub struct RecipeGenerator {
    primary: Arc<dyn RecipeService>,
    fallback: Option<Arc<dyn RecipeService>>,
    cache: ResultCache,
    tier_timeout: Option<Duration>,
    state: StateCell,
}

impl RecipeGenerator {
    pub(crate) fn new(
        primary: Arc<dyn RecipeService>,
        fallback: Option<Arc<dyn RecipeService>>,
        cache: ResultCache,
        tier_timeout: Option<Duration>,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache,
            tier_timeout,
            state: StateCell::new(),
        }
    }

    /// Current observable state.
    pub fn state(&self) -> GenerationState {
        self.state.snapshot()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// The result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Names of the configured tiers, primary first.
    pub fn tier_names(&self) -> Vec<&str> {
        let mut names = vec![self.primary.name()];
        if let Some(fallback) = &self.fallback {
            names.push(fallback.name());
        }
        names
    }

    /// Generate a recipe for `request`.
    ///
    /// Never returns an error: failures are reported as
    /// [`GenerationOutcome::Rejected`] and mirrored into the observable
    /// state.
    #[instrument(skip_all, fields(ingredients = request.ingredients().len()))]
    pub async fn generate(&self, request: GenerationRequest) -> GenerationOutcome {
        let guard = self.state.begin();

        let (outcome, source) = match self.resolve(&request).await {
            Ok((recipe, source)) => (GenerationOutcome::Fulfilled(recipe), source.as_str()),
            Err(e) => (GenerationOutcome::Rejected(e.to_string()), "none"),
        };
        let status = if outcome.is_fulfilled() { "ok" } else { "error" };
        metrics::counter!(telemetry::GENERATIONS_TOTAL, "source" => source, "status" => status)
            .increment(1);

        let published = guard.settle(
            outcome.recipe().cloned(),
            outcome.error().map(str::to_string),
        );
        if !published {
            debug!(source, status, "newer generation started, discarding result");
            metrics::counter!(telemetry::SUPERSEDED_TOTAL).increment(1);
            return GenerationOutcome::Superseded;
        }
        outcome
    }

    async fn resolve(&self, request: &GenerationRequest) -> Result<(Recipe, Source)> {
        if !request.is_dispatchable() {
            return Err(SproutError::InvalidInput(
                "at least one ingredient is required".into(),
            ));
        }

        let key = CacheKey::derive(request);
        if let Some(entry) = self.cache.get(&key) {
            debug!(key = %key, "serving recipe from cache");
            return Ok((entry.recipe, Source::Cache));
        }

        let (recipe, source) = self
            .with_fallback("generate", |tier| tier.generate(request))
            .await
            .map_err(|e| SproutError::GenerationFailed(e.to_string()))?;

        self.cache.set(&key, &recipe);
        info!(source = source.as_str(), title = %recipe.title, "recipe generated");
        Ok((recipe, source))
    }

    /// Rewrite `recipe` according to `instructions`.
    ///
    /// Identity fields (`id`, `category`, `image_url`) the model drops are
    /// copied over from the original. If `recipe` is the one currently
    /// displayed, the observable state is updated to the edited version.
    #[instrument(skip_all, fields(title = %recipe.title))]
    pub async fn edit(&self, recipe: &Recipe, instructions: &str) -> Result<Recipe> {
        let instructions = instructions.trim();
        if instructions.is_empty() {
            return Err(SproutError::InvalidInput(
                "edit instructions must not be empty".into(),
            ));
        }

        let (edited, _) = self
            .with_fallback("edit", |tier| tier.edit(recipe, instructions))
            .await
            .map_err(|e| SproutError::GenerationFailed(e.to_string()))?;
        let edited = edited.inherit_from(recipe);

        self.state.replace_recipe(recipe, &edited);
        Ok(edited)
    }

    /// Generate a photo of a dish from its title and leading ingredients.
    ///
    /// `Ok(None)` means both tiers answered but neither produced an image.
    #[instrument(skip_all, fields(title = %title))]
    pub async fn generate_image(&self, title: &str, ingredients: &[String]) -> Result<Option<String>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SproutError::InvalidInput("recipe title is required".into()));
        }
        let featured = &ingredients[..ingredients.len().min(IMAGE_PROMPT_INGREDIENTS)];

        let result = self
            .with_fallback("image", move |tier| {
                Box::pin(async move {
                    tier.generate_image(title, featured)
                        .await?
                        .ok_or(SproutError::EmptyResponse)
                })
            })
            .await;
        match result {
            Ok((uri, _)) => Ok(Some(uri)),
            Err(SproutError::EmptyResponse) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Categorised shopping list for `ingredients`, localised for `country`.
    #[instrument(skip_all, fields(items = ingredients.len()))]
    pub async fn shopping_list(
        &self,
        ingredients: &[String],
        country: Option<&str>,
    ) -> Result<ShoppingList> {
        if ingredients.iter().all(|i| i.trim().is_empty()) {
            return Err(SproutError::InvalidInput(
                "at least one ingredient is required".into(),
            ));
        }
        let (list, _) = self
            .with_fallback("shopping_list", |tier| tier.shopping_list(ingredients, country))
            .await?;
        Ok(list)
    }

    /// Run `call` against the primary tier, then once against the fallback
    /// tier if the primary failed.
    async fn with_fallback<'a, T>(
        &'a self,
        operation: &'static str,
        call: impl Fn(&'a dyn RecipeService) -> TierCall<'a, T>,
    ) -> Result<(T, Source)> {
        let primary: &'a dyn RecipeService = &*self.primary;
        let err = match self.timed(primary.name(), operation, call(primary)).await {
            Ok(value) => return Ok((value, Source::Primary)),
            Err(e) => e,
        };

        let Some(fallback) = self.fallback.as_deref() else {
            warn!(tier = primary.name(), operation, error = %err, "primary tier failed, no fallback configured");
            return Err(err);
        };
        warn!(
            tier = primary.name(),
            operation,
            error = %err,
            "primary tier failed, trying fallback"
        );
        metrics::counter!(telemetry::FALLBACKS_TOTAL, "operation" => operation).increment(1);

        let value = self.timed(fallback.name(), operation, call(fallback)).await?;
        Ok((value, Source::Fallback))
    }

    async fn timed<T>(&self, tier: &str, operation: &'static str, call: TierCall<'_, T>) -> Result<T> {
        let start = Instant::now();
        let result = match self.tier_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(SproutError::Timeout(limit))),
            None => call.await,
        };

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(
            telemetry::TIER_REQUESTS_TOTAL,
            "tier" => tier.to_owned(),
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            telemetry::TIER_REQUEST_DURATION_SECONDS,
            "tier" => tier.to_owned(),
            "operation" => operation
        )
        .record(start.elapsed().as_secs_f64());

        result
    }
}
